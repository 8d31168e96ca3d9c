//! The cell-value grid collaborator
//!
//! The structural store never interprets cell contents. It only needs a grid
//! that can be read, iterated over an area, and shifted by whole lines.
//! [`MemoryGrid`](crate::cell::MemoryGrid) is the sparse in-memory
//! implementation used by default.

use crate::cell::{Area, CellAddress, CellValue};
use crate::patch::Axis;

/// A sparse grid of cell values
pub trait Grid {
    /// Number of rows currently in the grid
    fn row_count(&self) -> u32;

    /// Number of columns currently in the grid
    fn col_count(&self) -> u32;

    /// Get the value stored at a cell, if any
    fn cell(&self, row: u32, col: u32) -> Option<&CellValue>;

    /// Store a value; storing [`CellValue::Empty`] clears the cell
    fn set_cell(&mut self, row: u32, col: u32, value: CellValue);

    /// Insert `count` empty lines before `before`, shifting later content
    fn insert_lines(&mut self, axis: Axis, before: u32, count: u32);

    /// Delete `count` lines starting at `first`, shifting later content back
    fn delete_lines(&mut self, axis: Axis, first: u32, count: u32);

    /// Iterate over the stored cells inside `area`
    fn iter_area<'a>(
        &'a self,
        area: &Area,
    ) -> Box<dyn Iterator<Item = (CellAddress, &'a CellValue)> + 'a>;

    /// Number of lines along `axis`
    fn line_count(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Row => self.row_count(),
            Axis::Column => self.col_count(),
        }
    }
}
