//! In-memory grid storage
//!
//! Sparse row-based storage for cell values. Only non-empty cells are
//! stored, as `BTreeMap<row, BTreeMap<col, CellValue>>`, which keeps
//! iteration ordered and makes line shifts a key rewrite.

use std::collections::BTreeMap;

use super::{Area, CellAddress, CellValue};
use crate::grid::Grid;
use crate::patch::{shift_line_map, Axis, LineEdit};

/// Sparse in-memory [`Grid`]
#[derive(Debug, Clone)]
pub struct MemoryGrid {
    /// Row index → column map
    rows: BTreeMap<u32, BTreeMap<u32, CellValue>>,
    /// Current number of rows
    row_count: u32,
    /// Current number of columns
    col_count: u32,
}

impl MemoryGrid {
    /// Create an empty grid of `rows` x `cols`
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows: BTreeMap::new(),
            row_count: rows,
            col_count: cols,
        }
    }

    /// Get the number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if no cell holds a value
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over all cells in row order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, value)| (row, col, value)))
    }

    fn apply_edit(&mut self, edit: &LineEdit) {
        match edit.axis {
            Axis::Row => shift_line_map(&mut self.rows, edit),
            Axis::Column => {
                for cols in self.rows.values_mut() {
                    shift_line_map(cols, edit);
                }
                self.rows.retain(|_, cols| !cols.is_empty());
            }
        }
    }
}

impl Default for MemoryGrid {
    fn default() -> Self {
        Self::new(crate::DEFAULT_ROWS, crate::DEFAULT_COLS)
    }
}

impl Grid for MemoryGrid {
    fn row_count(&self) -> u32 {
        self.row_count
    }

    fn col_count(&self) -> u32 {
        self.col_count
    }

    fn cell(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    fn set_cell(&mut self, row: u32, col: u32, value: CellValue) {
        if value.is_empty() {
            if let Some(row_map) = self.rows.get_mut(&row) {
                row_map.remove(&col);
                if row_map.is_empty() {
                    self.rows.remove(&row);
                }
            }
        } else {
            self.rows.entry(row).or_default().insert(col, value);
        }
    }

    fn insert_lines(&mut self, axis: Axis, before: u32, count: u32) {
        self.apply_edit(&LineEdit::insert(axis, before, count));
        match axis {
            Axis::Row => self.row_count += count,
            Axis::Column => self.col_count += count,
        }
    }

    fn delete_lines(&mut self, axis: Axis, first: u32, count: u32) {
        self.apply_edit(&LineEdit::delete(axis, first, count));
        match axis {
            Axis::Row => self.row_count = self.row_count.saturating_sub(count),
            Axis::Column => self.col_count = self.col_count.saturating_sub(count),
        }
    }

    fn iter_area<'a>(
        &'a self,
        area: &Area,
    ) -> Box<dyn Iterator<Item = (CellAddress, &'a CellValue)> + 'a> {
        let (r0, r1) = area.span(Axis::Row);
        let (c0, c1) = area.span(Axis::Column);
        Box::new(self.rows.range(r0..=r1).flat_map(move |(&row, cols)| {
            cols.range(c0..=c1)
                .map(move |(&col, value)| (CellAddress::new(row, col), value))
        }))
    }
}
