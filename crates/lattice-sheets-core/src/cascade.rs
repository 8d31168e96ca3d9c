//! Style cascade
//!
//! A cell's effective style is composed from layers, lowest first:
//!
//! 1. the default style
//! 2. the sheet style
//! 3. the row pattern (`pattern[row % len]`), when one is installed
//! 4. the row entry
//! 5. the column entry
//! 6. the cell delta
//! 7. the conditional overlay list, later entries winning
//!
//! Cell deltas only hold properties that differ from what lies underneath.
//! Writes to a broad scope remove the same properties from narrower scopes
//! so the broad write becomes visible, and a row write compensates for the
//! column layer sitting above it by injecting cell deltas where a column
//! disagrees.
//!
//! Resolved styles are cached per cell in a [`StyleCache`]; every write
//! invalidates the cells it can affect plus a one-cell bleed ring, since
//! neighbours draw shared borders.

use std::collections::BTreeMap;

use ahash::AHashMap;
use log::debug;

use crate::cell::Area;
use crate::patch::{shift_line_map, Axis, LineEdit};
use crate::style::{CellStyle, StyleKey, StyleValue};
use crate::{MAX_COLS, MAX_ROWS};

/// Width of the ring around a written area whose cached styles are dropped
pub const BLEED: u32 = 1;

/// Grow `area` by the bleed ring
pub fn bleed(area: &Area) -> Area {
    area.expanded(BLEED, MAX_ROWS, MAX_COLS)
}

/// Per-cell cache of resolved styles
#[derive(Debug, Clone, Default)]
pub struct StyleCache {
    entries: AHashMap<(u32, u32), CellStyle>,
}

impl StyleCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached style for a cell
    pub fn get(&self, row: u32, col: u32) -> Option<&CellStyle> {
        self.entries.get(&(row, col))
    }

    /// Store a resolved style
    pub fn insert(&mut self, row: u32, col: u32, style: CellStyle) {
        self.entries.insert((row, col), style);
    }

    /// Drop every cached cell inside `area`
    pub fn invalidate(&mut self, area: &Area) {
        if self.entries.is_empty() {
            return;
        }
        // Walk small closed areas directly, scan the cache for anything else.
        if !area.is_open_on(Axis::Row)
            && !area.is_open_on(Axis::Column)
            && area.cell_count() <= self.entries.len() as u64
        {
            for addr in area.cells() {
                self.entries.remove(&(addr.row, addr.col));
            }
        } else {
            self.entries.retain(|&(row, col), _| !area.contains(row, col));
        }
    }

    /// Drop every cached cell at or after line `from` along `axis`
    pub fn invalidate_lines(&mut self, axis: Axis, from: u32) {
        self.entries.retain(|&(row, col), _| {
            let line = match axis {
                Axis::Row => row,
                Axis::Column => col,
            };
            line < from
        });
    }

    /// Drop everything
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!("style cache flushed ({} cells)", self.entries.len());
        }
        self.entries.clear();
    }

    /// Number of cached cells
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Layered style storage for one sheet
#[derive(Debug, Clone, Default)]
pub struct StyleCascade {
    /// Layer 1
    default_style: CellStyle,
    /// Layer 2
    sheet: CellStyle,
    /// Layer 3
    row_pattern: Vec<CellStyle>,
    /// Layer 4
    rows: BTreeMap<u32, CellStyle>,
    /// Layer 5
    columns: BTreeMap<u32, CellStyle>,
    /// Layer 6: row → column → delta
    cells: BTreeMap<u32, BTreeMap<u32, CellStyle>>,
    cache: StyleCache,
}

impl StyleCascade {
    /// Create a cascade over the given default style
    pub fn new(default_style: CellStyle) -> Self {
        Self {
            default_style,
            ..Self::default()
        }
    }

    // === Reading ===

    /// Resolve a cell's style, consulting and filling the cache
    ///
    /// `overlay` is the conditional-format overlay list for the cell.
    pub fn effective_style(&mut self, row: u32, col: u32, overlay: &[CellStyle]) -> CellStyle {
        if let Some(style) = self.cache.get(row, col) {
            return style.clone();
        }
        let style = self.compose(row, col, overlay);
        self.cache.insert(row, col, style.clone());
        style
    }

    /// Resolve a cell's style without touching the cache
    pub fn compose(&self, row: u32, col: u32, overlay: &[CellStyle]) -> CellStyle {
        let mut style = self.underlying_layers(row, col);
        if let Some(delta) = self.cell_delta(row, col) {
            style.overlay(delta);
        }
        for entry in overlay {
            style.overlay(entry);
        }
        style
    }

    /// Everything below the cell delta, plus the overlay on top
    pub fn underlying(&self, row: u32, col: u32, overlay: &[CellStyle]) -> CellStyle {
        let mut style = self.underlying_layers(row, col);
        for entry in overlay {
            style.overlay(entry);
        }
        style
    }

    fn underlying_layers(&self, row: u32, col: u32) -> CellStyle {
        let mut style = self.default_style.clone();
        style.overlay(&self.sheet);
        if !self.row_pattern.is_empty() {
            let band = row as usize % self.row_pattern.len();
            style.overlay(&self.row_pattern[band]);
        }
        if let Some(entry) = self.rows.get(&row) {
            style.overlay(entry);
        }
        if let Some(entry) = self.columns.get(&col) {
            style.overlay(entry);
        }
        style
    }

    /// The default style layer
    pub fn default_style(&self) -> &CellStyle {
        &self.default_style
    }

    /// The sheet layer
    pub fn sheet_style(&self) -> &CellStyle {
        &self.sheet
    }

    /// The banding pattern
    pub fn row_pattern(&self) -> &[CellStyle] {
        &self.row_pattern
    }

    /// The entry for a row
    pub fn row_style(&self, row: u32) -> Option<&CellStyle> {
        self.rows.get(&row)
    }

    /// The entry for a column
    pub fn column_style(&self, col: u32) -> Option<&CellStyle> {
        self.columns.get(&col)
    }

    /// The stored delta for a cell
    pub fn cell_delta(&self, row: u32, col: u32) -> Option<&CellStyle> {
        self.cells.get(&row).and_then(|cols| cols.get(&col))
    }

    /// All row entries
    pub fn row_entries(&self) -> &BTreeMap<u32, CellStyle> {
        &self.rows
    }

    /// All column entries
    pub fn column_entries(&self) -> &BTreeMap<u32, CellStyle> {
        &self.columns
    }

    /// All cell deltas in row order
    pub fn cell_deltas(&self) -> impl Iterator<Item = (u32, u32, &CellStyle)> {
        self.cells
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, style)| (row, col, style)))
    }

    /// The resolved-style cache
    pub fn cache(&self) -> &StyleCache {
        &self.cache
    }

    // === Writing ===

    /// Write properties on one cell, storing only what differs from below
    pub fn set_cell_style(
        &mut self,
        row: u32,
        col: u32,
        props: &CellStyle,
        merge: bool,
        overlay: &[CellStyle],
    ) {
        let underlying = self.underlying(row, col, overlay);
        let wanted = match (merge, self.cell_delta(row, col)) {
            (true, Some(existing)) => existing.merged_with(props),
            _ => props.clone(),
        };
        let delta = underlying.merged_with(&wanted).diff_from(&underlying);
        self.store_delta(row, col, delta);
        self.cache.invalidate(&bleed(&Area::from_indices(row, col, row, col)));
    }

    /// Write properties on the sheet layer
    ///
    /// The written keys are removed from every row, column and cell entry.
    pub fn set_sheet_style(&mut self, props: &CellStyle, merge: bool) {
        merge_into(&mut self.sheet, props, merge);

        let keys: Vec<StyleKey> = props.keys().collect();
        for entry in self.rows.values_mut().chain(self.columns.values_mut()) {
            entry.remove_keys(keys.iter().copied());
        }
        self.rows.retain(|_, entry| !entry.is_empty());
        self.columns.retain(|_, entry| !entry.is_empty());
        for cols in self.cells.values_mut() {
            for delta in cols.values_mut() {
                delta.remove_keys(keys.iter().copied());
            }
            cols.retain(|_, delta| !delta.is_empty());
        }
        self.cells.retain(|_, cols| !cols.is_empty());

        self.cache.clear();
    }

    /// Write properties on a row entry
    ///
    /// The written keys are removed from the cell deltas on the row. Where a
    /// column entry holds a different value for a written key, a cell delta
    /// carrying the row's value is injected at the crossing cell. Keys the
    /// row entry loses take their injected deltas with them.
    pub fn set_row_style(&mut self, row: u32, props: &CellStyle, merge: bool) {
        if !merge {
            self.drop_compensation(row, props);
        }
        merge_into(self.rows.entry(row).or_default(), props, merge);
        if self.rows.get(&row).is_some_and(CellStyle::is_empty) {
            self.rows.remove(&row);
        }
        self.strip_line_deltas(Axis::Row, row, props);

        for (&col, entry) in &self.columns {
            let compensation: CellStyle = props
                .iter()
                .filter(|(key, value)| entry.get(*key).is_some_and(|v| v != *value))
                .map(|(key, value)| (key, value.clone()))
                .collect();
            if !compensation.is_empty() {
                self.cells
                    .entry(row)
                    .or_default()
                    .entry(col)
                    .or_default()
                    .overlay(&compensation);
            }
        }

        self.cache.invalidate(&bleed(&Area::rows(row, row)));
    }

    /// Write properties on a column entry
    ///
    /// The written keys are removed from the cell deltas in the column.
    pub fn set_column_style(&mut self, col: u32, props: &CellStyle, merge: bool) {
        merge_into(self.columns.entry(col).or_default(), props, merge);
        if self.columns.get(&col).is_some_and(CellStyle::is_empty) {
            self.columns.remove(&col);
        }
        self.strip_line_deltas(Axis::Column, col, props);
        self.cache.invalidate(&bleed(&Area::columns(col, col)));
    }

    /// Install a banding pattern; an empty pattern disables the layer
    pub fn set_row_pattern(&mut self, pattern: Vec<CellStyle>) {
        self.row_pattern = pattern;
        self.cache.clear();
    }

    /// Replace the default style layer
    pub fn set_default_style(&mut self, style: CellStyle) {
        self.default_style = style;
        self.cache.clear();
    }

    /// Replace every stored line entry and cell delta
    pub fn restore(
        &mut self,
        sheet: CellStyle,
        rows: BTreeMap<u32, CellStyle>,
        columns: BTreeMap<u32, CellStyle>,
        cells: BTreeMap<u32, BTreeMap<u32, CellStyle>>,
    ) {
        self.sheet = sheet;
        self.rows = rows;
        self.columns = columns;
        self.cells = cells;
        self.cache.clear();
    }

    fn store_delta(&mut self, row: u32, col: u32, delta: CellStyle) {
        if delta.is_empty() {
            if let Some(cols) = self.cells.get_mut(&row) {
                cols.remove(&col);
                if cols.is_empty() {
                    self.cells.remove(&row);
                }
            }
        } else {
            self.cells.entry(row).or_default().insert(col, delta);
        }
    }

    /// Remove deltas at the row's column crossings that only repeat a row
    /// value about to be dropped by a replacing write
    fn drop_compensation(&mut self, row: u32, props: &CellStyle) {
        let Some(old) = self.rows.get(&row) else {
            return;
        };
        let lost: Vec<(StyleKey, StyleValue)> = old
            .iter()
            .filter(|(key, _)| !props.contains(*key))
            .map(|(key, value)| (key, value.clone()))
            .collect();
        let Some(cols) = self.cells.get_mut(&row) else {
            return;
        };
        for (col, delta) in cols.iter_mut() {
            let Some(entry) = self.columns.get(col) else {
                continue;
            };
            for (key, value) in &lost {
                let compensated = entry.get(*key).is_some_and(|v| v != value)
                    && delta.get(*key) == Some(value);
                if compensated {
                    delta.remove(*key);
                }
            }
        }
        cols.retain(|_, delta| !delta.is_empty());
        if cols.is_empty() {
            self.cells.remove(&row);
        }
    }

    fn strip_line_deltas(&mut self, axis: Axis, line: u32, props: &CellStyle) {
        let keys: Vec<StyleKey> = props.keys().collect();
        match axis {
            Axis::Row => {
                if let Some(cols) = self.cells.get_mut(&line) {
                    for delta in cols.values_mut() {
                        delta.remove_keys(keys.iter().copied());
                    }
                    cols.retain(|_, delta| !delta.is_empty());
                    if cols.is_empty() {
                        self.cells.remove(&line);
                    }
                }
            }
            Axis::Column => {
                for cols in self.cells.values_mut() {
                    if let Some(delta) = cols.get_mut(&line) {
                        delta.remove_keys(keys.iter().copied());
                        if delta.is_empty() {
                            cols.remove(&line);
                        }
                    }
                }
                self.cells.retain(|_, cols| !cols.is_empty());
            }
        }
    }

    // === Structural edits ===

    /// Move line entries and cell deltas for an insert or delete
    ///
    /// Cached styles from the line before the edit to the end of the axis
    /// are dropped.
    pub fn apply_edit(&mut self, edit: &LineEdit) {
        match edit.axis {
            Axis::Row => {
                shift_line_map(&mut self.rows, edit);
                shift_line_map(&mut self.cells, edit);
            }
            Axis::Column => {
                shift_line_map(&mut self.columns, edit);
                for cols in self.cells.values_mut() {
                    shift_line_map(cols, edit);
                }
                self.cells.retain(|_, cols| !cols.is_empty());
            }
        }
        let from = edit.before.saturating_sub(BLEED);
        self.cache.invalidate_lines(edit.axis, from);
        debug!("style cache dropped {:?} {}.. after edit", edit.axis, from);
    }

    /// Drop cached styles for an area and its bleed ring
    pub fn invalidate(&mut self, area: &Area) {
        self.cache.invalidate(&bleed(area));
    }

    /// Drop all cached styles
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }
}

fn merge_into(target: &mut CellStyle, props: &CellStyle, merge: bool) {
    if merge {
        target.overlay(props);
    } else {
        *target = props.clone();
    }
}
