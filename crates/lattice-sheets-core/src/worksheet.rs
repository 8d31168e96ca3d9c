//! Worksheet type

use std::collections::BTreeMap;

use log::debug;

use crate::cascade::StyleCascade;
use crate::cell::{Area, CellAddress, CellValue, MemoryGrid};
use crate::conditional_format::{ConditionalFormats, ConditionalRule, RuleResult};
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::patch::{check_area_limits, Axis};
use crate::region::{RegionHeads, RegionId};
use crate::style::CellStyle;
use crate::{DEFAULT_COLS, DEFAULT_ROWS};

/// Default row height in points
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Default column width in characters
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// Options used when creating a worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetOptions {
    /// Initial number of rows
    pub rows: u32,
    /// Initial number of columns
    pub cols: u32,
    /// Height of rows without a custom height
    pub default_row_height: f64,
    /// Width of columns without a custom width
    pub default_column_width: f64,
    /// Bottom layer of the style cascade
    pub default_style: CellStyle,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            default_row_height: DEFAULT_ROW_HEIGHT,
            default_column_width: DEFAULT_COLUMN_WIDTH,
            default_style: CellStyle::new(),
        }
    }
}

impl SheetOptions {
    /// Options for a sheet of `rows` x `cols`
    pub fn sized(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }
}

/// Where a style write goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleScope {
    /// The sheet layer
    Sheet,
    /// One row entry
    Row(u32),
    /// One column entry
    Column(u32),
    /// One cell delta
    Cell(u32, u32),
    /// Every cell delta in an area
    Area(Area),
}

/// A worksheet (single sheet in a workbook)
///
/// The sheet owns its value grid, the style cascade with its cache, the
/// merged and array regions, the conditional formats, and custom line sizes.
#[derive(Debug, Clone)]
pub struct Worksheet<G: Grid = MemoryGrid> {
    /// Sheet name
    pub(crate) name: String,
    /// Cell values
    pub(crate) grid: G,
    /// Style layers and resolved-style cache
    pub(crate) styles: StyleCascade,
    /// Merged cell regions
    pub(crate) merges: RegionHeads,
    /// Array formula regions
    pub(crate) arrays: RegionHeads,
    /// Conditional formatting rules and their overlay
    pub(crate) conditional_formats: ConditionalFormats,
    /// Custom row heights
    pub(crate) row_heights: BTreeMap<u32, f64>,
    /// Custom column widths
    pub(crate) column_widths: BTreeMap<u32, f64>,
    pub(crate) options: SheetOptions,
}

impl Worksheet<MemoryGrid> {
    /// Create a new worksheet with the given name and default options
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self::with_options(name, SheetOptions::default())
    }

    /// Create a new in-memory worksheet
    pub fn with_options<S: Into<String>>(name: S, options: SheetOptions) -> Self {
        let grid = MemoryGrid::new(options.rows, options.cols);
        Self::with_grid(name, grid, options)
    }
}

impl<G: Grid> Worksheet<G> {
    /// Create a worksheet over an existing grid
    ///
    /// The grid's own dimensions win over `options.rows` / `options.cols`.
    pub fn with_grid<S: Into<String>>(name: S, grid: G, options: SheetOptions) -> Self {
        Self {
            name: name.into(),
            grid,
            styles: StyleCascade::new(options.default_style.clone()),
            merges: RegionHeads::new(),
            arrays: RegionHeads::new(),
            conditional_formats: ConditionalFormats::new(),
            row_heights: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            options,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Options the sheet was created with
    pub fn options(&self) -> &SheetOptions {
        &self.options
    }

    /// Current number of rows
    pub fn row_count(&self) -> u32 {
        self.grid.row_count()
    }

    /// Current number of columns
    pub fn col_count(&self) -> u32 {
        self.grid.col_count()
    }

    /// The value grid
    pub fn grid(&self) -> &G {
        &self.grid
    }

    // === Cell Access ===

    /// Get a cell value by address string (e.g., "A1")
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u32) -> CellValue {
        self.grid.cell(row, col).cloned().unwrap_or_default()
    }

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by indices
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u32,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.grid.set_cell(row, col, value.into());
        Ok(())
    }

    // === Styles ===

    /// The resolved style of a cell
    pub fn effective_style(&mut self, row: u32, col: u32) -> CellStyle {
        let overlay = self.conditional_formats.overlay_at(row, col);
        self.styles.effective_style(row, col, overlay)
    }

    /// Write style properties at a scope
    ///
    /// With `merge` the properties are merged into what the scope already
    /// holds; without it they replace it.
    pub fn set_style(&mut self, scope: StyleScope, props: &CellStyle, merge: bool) -> Result<()> {
        match scope {
            StyleScope::Sheet => self.styles.set_sheet_style(props, merge),
            StyleScope::Row(row) => {
                self.validate_cell_position(row, 0)?;
                self.styles.set_row_style(row, props, merge);
            }
            StyleScope::Column(col) => {
                self.validate_cell_position(0, col)?;
                self.styles.set_column_style(col, props, merge);
            }
            StyleScope::Cell(row, col) => {
                self.validate_cell_position(row, col)?;
                let overlay = self.conditional_formats.overlay_at(row, col);
                self.styles.set_cell_style(row, col, props, merge, overlay);
            }
            StyleScope::Area(area) => {
                let area = self.clamp_area(&area)?;
                for addr in area.cells() {
                    let overlay = self.conditional_formats.overlay_at(addr.row, addr.col);
                    self.styles
                        .set_cell_style(addr.row, addr.col, props, merge, overlay);
                }
            }
        }
        Ok(())
    }

    /// Install a banding pattern; an empty pattern disables banding
    pub fn set_row_pattern(&mut self, pattern: Vec<CellStyle>) {
        self.styles.set_row_pattern(pattern);
    }

    /// The style layers
    pub fn styles(&self) -> &StyleCascade {
        &self.styles
    }

    // === Row/Column Sizes ===

    /// Get row height in points
    pub fn row_height(&self, row: u32) -> f64 {
        self.row_heights
            .get(&row)
            .copied()
            .unwrap_or(self.options.default_row_height)
    }

    /// Set row height in points
    pub fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        self.validate_cell_position(row, 0)?;
        self.row_heights.insert(row, height);
        Ok(())
    }

    /// Get column width in characters
    pub fn column_width(&self, col: u32) -> f64 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(self.options.default_column_width)
    }

    /// Set column width in characters
    pub fn set_column_width(&mut self, col: u32, width: f64) -> Result<()> {
        self.validate_cell_position(0, col)?;
        self.column_widths.insert(col, width);
        Ok(())
    }

    /// Rows with a custom height
    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    /// Columns with a custom width
    pub fn custom_column_widths(&self) -> &BTreeMap<u32, f64> {
        &self.column_widths
    }

    // === Merged Cells ===

    /// Merge a range of cells
    ///
    /// Fails if the range is a single cell, leaves the sheet, or overlaps an
    /// existing merge.
    pub fn merge_cells(&mut self, area: &Area) -> Result<RegionId> {
        let area = self.closed_area(area)?;
        if area.cell_count() < 2 {
            return Err(Error::InvalidRange(format!(
                "cannot merge the single cell {}",
                area.to_a1_string()
            )));
        }
        if let Some(existing) = self.merges.overlapping(&area) {
            let label = self
                .merges
                .get(existing)
                .map(Area::to_a1_string)
                .unwrap_or_default();
            return Err(Error::MergedCellConflict(label));
        }
        let id = self.merges.insert(area)?;
        self.styles.invalidate(&area);
        Ok(id)
    }

    /// Remove the merge covering a cell, returning its area
    pub fn unmerge_cells(&mut self, row: u32, col: u32) -> Option<Area> {
        let id = self.merges.region_at(row, col)?;
        let area = self.merges.remove(id)?;
        self.styles.invalidate(&area);
        Some(area)
    }

    /// The merged region covering a cell
    pub fn merged_region_at(&self, row: u32, col: u32) -> Option<&Area> {
        self.merges.area_at(row, col)
    }

    /// All merged regions
    pub fn merged_regions(&self) -> impl Iterator<Item = &Area> {
        self.merges.iter().map(|(_, area)| area)
    }

    /// The merge arena
    pub fn merge_heads(&self) -> &RegionHeads {
        &self.merges
    }

    // === Array Regions ===

    /// Mark a range as one array formula result
    pub fn set_array_region(&mut self, area: &Area) -> Result<RegionId> {
        let area = self.closed_area(area)?;
        self.arrays.insert(area)
    }

    /// Remove the array region covering a cell
    pub fn remove_array_region(&mut self, row: u32, col: u32) -> Option<Area> {
        let id = self.arrays.region_at(row, col)?;
        self.arrays.remove(id)
    }

    /// The array region covering a cell
    pub fn array_region_at(&self, row: u32, col: u32) -> Option<&Area> {
        self.arrays.area_at(row, col)
    }

    /// All array regions
    pub fn array_regions(&self) -> impl Iterator<Item = &Area> {
        self.arrays.iter().map(|(_, area)| area)
    }

    /// The array arena
    pub fn array_heads(&self) -> &RegionHeads {
        &self.arrays
    }

    // === Conditional Formatting ===

    /// Add a conditional formatting rule, returning its index
    ///
    /// Targets reaching past the largest possible sheet are rejected with
    /// `Error::InvalidRange`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lattice_sheets_core::{Area, Worksheet};
    /// use lattice_sheets_core::conditional_format::{ConditionalRule, RuleResult};
    /// use lattice_sheets_core::style::{CellStyle, Color, StyleKey};
    ///
    /// let mut ws = Worksheet::new("Test");
    /// let rule = ConditionalRule::cell_match(">100")
    ///     .with_target(Area::parse("A1:A10").unwrap())
    ///     .with_style(CellStyle::new().fill(Color::rgb(255, 199, 206)));
    /// let idx = ws.add_conditional_format(rule).unwrap();
    ///
    /// ws.set_rule_result(idx, RuleResult::Scalar(true.into())).unwrap();
    /// ws.apply_conditional_formats();
    /// assert_eq!(ws.effective_style(4, 0).color(StyleKey::Fill), Some(Color::rgb(255, 199, 206)));
    /// ```
    pub fn add_conditional_format(&mut self, rule: ConditionalRule) -> Result<usize> {
        check_area_limits(&rule.target)?;
        Ok(self.conditional_formats.add(rule))
    }

    /// Remove a conditional formatting rule by index
    pub fn remove_conditional_format(&mut self, index: usize) -> Option<ConditionalRule> {
        self.conditional_formats.remove(index)
    }

    /// The conditional formats of this sheet
    pub fn conditional_formats(&self) -> &ConditionalFormats {
        &self.conditional_formats
    }

    /// Conditional formatting rules covering a cell
    pub fn conditional_formats_at(&self, row: u32, col: u32) -> Vec<&ConditionalRule> {
        self.conditional_formats
            .rules()
            .iter()
            .filter(|r| r.applies_to(row, col))
            .collect()
    }

    /// Hand an evaluator result to a rule
    pub fn set_rule_result(&mut self, index: usize, result: RuleResult) -> Result<()> {
        self.conditional_formats.set_rule_result(index, result)
    }

    /// Rebuild the conditional overlay if anything changed
    ///
    /// Returns whether a pass ran. Resolved styles are dropped for every
    /// area written by this pass or the previous one.
    pub fn apply_conditional_formats(&mut self) -> bool {
        let (rows, cols) = (self.row_count(), self.col_count());
        match self.conditional_formats.apply_all(rows, cols) {
            Some(areas) => {
                debug!(
                    "sheet '{}': repainted {} conditional format area(s)",
                    self.name,
                    areas.len()
                );
                for area in areas {
                    self.styles.invalidate(area);
                }
                true
            }
            None => false,
        }
    }

    // === Internal ===

    /// Validate cell position against the current sheet size
    fn validate_cell_position(&self, row: u32, col: u32) -> Result<()> {
        if row >= self.row_count() {
            return Err(Error::LineOutOfBounds {
                axis: Axis::Row,
                index: row,
                count: self.row_count(),
            });
        }
        if col >= self.col_count() {
            return Err(Error::LineOutOfBounds {
                axis: Axis::Column,
                index: col,
                count: self.col_count(),
            });
        }
        Ok(())
    }

    /// Resolve open bounds and clamp to the sheet
    fn clamp_area(&self, area: &Area) -> Result<Area> {
        area.normalize(self.row_count(), self.col_count())
            .ok_or_else(|| Error::InvalidRange(format!("{} lies outside the sheet", area)))
    }

    /// An area with concrete bounds lying entirely inside the sheet
    fn closed_area(&self, area: &Area) -> Result<Area> {
        let clamped = self.clamp_area(area)?;
        if !area.is_open_on(Axis::Row)
            && !area.is_open_on(Axis::Column)
            && clamped != *area
        {
            return Err(Error::InvalidRange(format!(
                "{} extends past the sheet",
                area
            )));
        }
        Ok(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, StyleKey};
    use pretty_assertions::assert_eq;

    fn sheet() -> Worksheet {
        Worksheet::with_options("Test", SheetOptions::sized(10, 10))
    }

    #[test]
    fn test_cell_values() {
        let mut ws = sheet();
        ws.set_cell_value("B2", 42).unwrap();
        assert_eq!(ws.get_value_at(1, 1), CellValue::Number(42.0));
        assert_eq!(ws.get_value("A1").unwrap(), CellValue::Empty);
        assert!(matches!(
            ws.set_cell_value_at(10, 0, "x"),
            Err(Error::LineOutOfBounds { index: 10, .. })
        ));
    }

    #[test]
    fn test_set_style_scopes() {
        let mut ws = sheet();
        ws.set_style(StyleScope::Sheet, &CellStyle::new().font_name("Arial"), true)
            .unwrap();
        ws.set_style(StyleScope::Row(1), &CellStyle::new().bold(true), true)
            .unwrap();
        ws.set_style(
            StyleScope::Area(Area::from_indices(1, 1, 2, 2)),
            &CellStyle::new().fill(Color::RED),
            true,
        )
        .unwrap();

        assert_eq!(
            ws.effective_style(1, 1),
            CellStyle::new().font_name("Arial").bold(true).fill(Color::RED)
        );
        assert_eq!(ws.styles().cell_deltas().count(), 4);
        assert!(ws
            .set_style(StyleScope::Column(10), &CellStyle::new(), true)
            .is_err());
    }

    #[test]
    fn test_merge_cells() {
        let mut ws = sheet();
        ws.merge_cells(&Area::from_indices(0, 0, 1, 1)).unwrap();

        assert_eq!(ws.merged_region_at(1, 1), Some(&Area::from_indices(0, 0, 1, 1)));
        assert!(matches!(
            ws.merge_cells(&Area::from_indices(1, 1, 2, 2)),
            Err(Error::MergedCellConflict(_))
        ));
        assert!(ws.merge_cells(&Area::from_indices(5, 5, 5, 5)).is_err());
        assert!(ws.merge_cells(&Area::from_indices(8, 8, 12, 12)).is_err());

        assert_eq!(ws.unmerge_cells(0, 1), Some(Area::from_indices(0, 0, 1, 1)));
        assert_eq!(ws.merged_regions().count(), 0);
    }

    #[test]
    fn test_array_regions_must_not_overlap() {
        let mut ws = sheet();
        ws.set_array_region(&Area::from_indices(0, 0, 2, 0)).unwrap();
        assert!(matches!(
            ws.set_array_region(&Area::from_indices(2, 0, 3, 0)),
            Err(Error::RegionConflict(_))
        ));
        assert_eq!(ws.remove_array_region(1, 0), Some(Area::from_indices(0, 0, 2, 0)));
    }

    #[test]
    fn test_conditional_target_past_sheet_limits() {
        let mut ws = sheet();
        let rule = ConditionalRule::expression("TRUE")
            .with_target(Area::from_indices(0, 0, u32::MAX, 0))
            .with_style(CellStyle::new().bold(true));
        assert!(matches!(ws.add_conditional_format(rule), Err(Error::InvalidRange(_))));
        assert!(ws.conditional_formats().is_empty());
        ws.insert_rows(0, 1).unwrap();
    }

    #[test]
    fn test_conditional_overlay_reaches_effective_style() {
        let mut ws = sheet();
        ws.set_style(StyleScope::Cell(0, 0), &CellStyle::new().fill(Color::BLUE), true)
            .unwrap();
        assert_eq!(ws.effective_style(0, 0).color(StyleKey::Fill), Some(Color::BLUE));

        let idx = ws
            .add_conditional_format(
                ConditionalRule::expression("A1>0")
                    .with_target(Area::from_indices(0, 0, 0, 0))
                    .with_style(CellStyle::new().fill(Color::YELLOW)),
            )
            .unwrap();
        ws.set_rule_result(idx, RuleResult::Scalar(true.into())).unwrap();

        assert!(ws.apply_conditional_formats());
        assert_eq!(ws.effective_style(0, 0).color(StyleKey::Fill), Some(Color::YELLOW));
        assert!(!ws.apply_conditional_formats());

        // Losing the format repaints the cell
        ws.set_rule_result(idx, RuleResult::Scalar(false.into())).unwrap();
        assert!(ws.apply_conditional_formats());
        assert_eq!(ws.effective_style(0, 0).color(StyleKey::Fill), Some(Color::BLUE));
    }

    #[test]
    fn test_line_sizes() {
        let mut ws = sheet();
        ws.set_row_height(2, 30.0).unwrap();
        ws.set_column_width(3, 20.0).unwrap();
        assert_eq!(ws.row_height(2), 30.0);
        assert_eq!(ws.row_height(3), DEFAULT_ROW_HEIGHT);
        assert_eq!(ws.column_width(3), 20.0);
        assert!(ws.set_row_height(11, 1.0).is_err());
    }
}
