//! Workbook type - the main document structure

use log::debug;

use crate::cell::MemoryGrid;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::named_range::{NameScope, NamedRange, NamedRangeCollection};
use crate::patch::{check_area_limits, Axis, LineEdit};
use crate::snapshot::{NamedEntityRecord, WorkbookSnapshot};
use crate::structure::EditReport;
use crate::worksheet::{SheetOptions, Worksheet};
use crate::{MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN};

/// A workbook (spreadsheet document)
///
/// A workbook owns its worksheets and the named ranges that point into them.
/// Structural edits go through the workbook so names follow the lines they
/// refer to.
#[derive(Debug, Clone)]
pub struct Workbook<G: Grid = MemoryGrid> {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet<G>>,
    /// Workbook settings
    settings: WorkbookSettings,
    /// Active sheet index
    active_sheet: usize,
    /// Named ranges (defined names)
    named_ranges: NamedRangeCollection,
}

impl Workbook<MemoryGrid> {
    /// Create a new workbook with one worksheet
    pub fn new() -> Self {
        Self::with_settings(WorkbookSettings::default())
    }

    /// Create a workbook with one worksheet shaped by `settings`
    pub fn with_settings(settings: WorkbookSettings) -> Self {
        let first = Worksheet::with_options("Sheet1", settings.sheet_options.clone());
        Self {
            worksheets: vec![first],
            settings,
            active_sheet: 0,
            named_ranges: NamedRangeCollection::new(),
        }
    }

    /// Add a new worksheet with default name
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = self.generate_sheet_name();
        self.add_worksheet_with_name(&name)
    }

    /// Add a new worksheet with specified name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        let worksheet = Worksheet::with_options(name, self.settings.sheet_options.clone());
        self.add_existing_worksheet(worksheet)
    }

    /// Rebuild the formatting and names of a snapshot
    ///
    /// Sheets take the size recorded in the snapshot, falling back to the
    /// default size; cell values are not part of a snapshot.
    pub fn from_snapshot(snapshot: &WorkbookSnapshot) -> Result<Self> {
        let mut wb = Self::empty();
        for sheet in &snapshot.sheets {
            let defaults = SheetOptions::default();
            let rows = sheet.rows.unwrap_or(defaults.rows);
            let cols = sheet.cols.unwrap_or(defaults.cols);
            if rows > MAX_ROWS || cols > MAX_COLS {
                return Err(Error::InvalidRange(format!(
                    "sheet '{}' is larger than {}x{}",
                    sheet.name, MAX_ROWS, MAX_COLS
                )));
            }
            let worksheet = Worksheet::with_options(&sheet.name, SheetOptions::sized(rows, cols));
            let idx = wb.add_existing_worksheet(worksheet)?;
            wb.worksheets[idx].restore_styles(sheet)?;
        }
        let owned: Vec<String> = wb.sheet_names().into_iter().map(String::from).collect();
        let names: Vec<&str> = owned.iter().map(String::as_str).collect();
        for record in &snapshot.named {
            let range = record.to_named_range(&names);
            wb.named_ranges.define(range)?;
        }
        Ok(wb)
    }
}

impl<G: Grid> Workbook<G> {
    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            settings: WorkbookSettings::default(),
            active_sheet: 0,
            named_ranges: NamedRangeCollection::new(),
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet<G>> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet<G>> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet<G>> {
        self.worksheets
            .iter()
            .find(|ws| ws.name().eq_ignore_ascii_case(name))
    }

    /// Get the index of a worksheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets
            .iter()
            .position(|ws| ws.name().eq_ignore_ascii_case(name))
    }

    /// Sheet names in order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(|ws| ws.name()).collect()
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet<G>> {
        self.worksheets.iter()
    }

    /// Iterate over all worksheets mutably
    pub fn worksheets_mut(&mut self) -> impl Iterator<Item = &mut Worksheet<G>> {
        self.worksheets.iter_mut()
    }

    /// Add an existing worksheet to the workbook
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet<G>) -> Result<usize> {
        self.check_sheet_name(worksheet.name(), None)?;
        let index = self.worksheets.len();
        self.worksheets.push(worksheet);
        Ok(index)
    }

    /// Remove a worksheet by index
    ///
    /// Names scoped to the sheet go with it; later sheet indices in names
    /// shift down.
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet<G>> {
        self.check_sheet(index)?;

        let worksheet = self.worksheets.remove(index);
        self.named_ranges.remove_sheet(index);

        if !self.worksheets.is_empty() {
            if self.active_sheet >= self.worksheets.len() {
                self.active_sheet = self.worksheets.len() - 1;
            }
        } else {
            self.active_sheet = 0;
        }

        Ok(worksheet)
    }

    /// Rename a worksheet
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        self.check_sheet(index)?;
        self.check_sheet_name(new_name, Some(index))?;
        self.worksheets[index].set_name(new_name);
        Ok(())
    }

    /// Get the active sheet index
    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    /// Set the active sheet index
    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        self.check_sheet(index)?;
        self.active_sheet = index;
        Ok(())
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Get mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    // ==================== Structural Edits ====================

    /// Insert (`count > 0`) or delete (`count < 0`) whole lines on a sheet
    ///
    /// Deleting removes `|count|` lines starting at `before`. The edit is
    /// validated before anything changes: on error the sheet and the names
    /// are untouched.
    ///
    /// # Example
    /// ```
    /// use lattice_sheets_core::{Area, Axis, Workbook};
    ///
    /// let mut wb = Workbook::new();
    /// let sheet = wb.worksheet_mut(0).unwrap();
    /// sheet.merge_cells(&Area::parse("C3:D4").unwrap()).unwrap();
    ///
    /// wb.edit_lines(0, Axis::Row, 2, 1).unwrap();
    /// let merged = wb.worksheet(0).unwrap().merged_region_at(4, 3).copied();
    /// assert_eq!(merged, Some(Area::parse("C3:D5").unwrap()));
    /// ```
    pub fn edit_lines(
        &mut self,
        sheet: usize,
        axis: Axis,
        before: u32,
        count: i32,
    ) -> Result<EditReport> {
        self.check_sheet(sheet)?;
        if count == 0 {
            return Ok(EditReport::default());
        }
        let edit = LineEdit {
            axis,
            before,
            count,
        };

        let mut report = self.worksheets[sheet].apply_line_edit(&edit)?;
        report.removed_names = self.named_ranges.patch_for_edit(sheet, &edit);

        debug!(
            "edit on sheet {}: {} {} at {}, {} name(s) removed",
            sheet,
            count,
            axis,
            before,
            report.removed_names.len()
        );
        Ok(report)
    }

    /// Insert `count` lines before `before`
    pub fn insert_lines(
        &mut self,
        sheet: usize,
        axis: Axis,
        before: u32,
        count: u32,
    ) -> Result<EditReport> {
        let edit = LineEdit::insert(axis, before, count);
        self.edit_lines(sheet, axis, before, edit.count)
    }

    /// Delete `count` lines starting at `first`
    pub fn delete_lines(
        &mut self,
        sheet: usize,
        axis: Axis,
        first: u32,
        count: u32,
    ) -> Result<EditReport> {
        let edit = LineEdit::delete(axis, first, count);
        self.edit_lines(sheet, axis, first, edit.count)
    }

    // ==================== Named Ranges ====================

    /// Define a named range
    ///
    /// # Example
    /// ```
    /// use lattice_sheets_core::{Area, NameScope, NamedRange, Workbook};
    ///
    /// let mut wb = Workbook::new();
    /// let tax = NamedRange::range("TaxRate", Area::parse("B1").unwrap().on_sheet(0), NameScope::Workbook);
    /// wb.define_name(tax).unwrap();
    /// assert!(wb.get_named_range("taxrate", 0).is_some());
    /// ```
    pub fn define_name(&mut self, range: NamedRange) -> Result<()> {
        if let NameScope::Sheet(idx) = range.scope {
            self.check_sheet(idx)?;
        }
        if let Some(area) = range.area() {
            check_area_limits(area)?;
            if let Some(idx) = area.sheet() {
                self.check_sheet(idx)?;
            }
        }
        self.named_ranges.define(range)
    }

    /// Get a named range by name, as seen from `current_sheet`
    ///
    /// Looks for a sheet-scoped name first, then a workbook-scoped one.
    pub fn get_named_range(&self, name: &str, current_sheet: usize) -> Option<&NamedRange> {
        self.named_ranges.get(name, current_sheet)
    }

    /// Remove a named range
    pub fn remove_name(&mut self, name: &str, scope: NameScope) -> Option<NamedRange> {
        self.named_ranges.remove(name, &scope)
    }

    /// Get the named range collection (read-only)
    pub fn named_ranges(&self) -> &NamedRangeCollection {
        &self.named_ranges
    }

    // ==================== Persistence ====================

    /// Capture the formatting of every sheet and the defined names
    pub fn snapshot(&self) -> WorkbookSnapshot {
        let names = self.sheet_names();
        WorkbookSnapshot {
            sheets: self.worksheets.iter().map(Worksheet::snapshot).collect(),
            named: self
                .named_ranges
                .iter()
                .map(|range| NamedEntityRecord::from_named_range(range, &names))
                .collect(),
        }
    }

    fn check_sheet(&self, index: usize) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        Ok(())
    }

    /// Validate a sheet name and check no other sheet already uses it
    fn check_sheet_name(&self, name: &str, exclude: Option<usize>) -> Result<()> {
        validate_sheet_name(name)?;
        let taken = self
            .worksheets
            .iter()
            .enumerate()
            .any(|(i, ws)| Some(i) != exclude && ws.name().eq_ignore_ascii_case(name));
        if taken {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }

    /// Generate a unique sheet name
    fn generate_sheet_name(&self) -> String {
        let mut n = self.worksheets.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.sheet_index(&name).is_none() {
                return name;
            }
            n += 1;
        }
    }
}

impl Default for Workbook<MemoryGrid> {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a sheet name on its own
///
/// Names are 1 to 31 characters, may not contain any of `:\/?*[]!` and may
/// not start or end with an apostrophe.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = |reason: String| Err(Error::InvalidSheetName(format!("'{}': {}", name, reason)));

    if name.is_empty() {
        return invalid("empty".into());
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return invalid(format!("longer than {} characters", MAX_SHEET_NAME_LEN));
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, ':' | '\\' | '/' | '?' | '*' | '[' | ']' | '!'))
    {
        return invalid(format!("contains '{}'", c));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return invalid("starts or ends with an apostrophe".into());
    }
    Ok(())
}

/// Workbook-level settings
#[derive(Debug, Clone, Default)]
pub struct WorkbookSettings {
    /// Options for sheets created by the workbook
    pub sheet_options: SheetOptions,
}
