//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`Area`] - A rectangle of cells (e.g., "A1:B10", "C:D")
//! - [`MemoryGrid`] - Sparse in-memory value grid

mod address;
mod storage;
mod value;

pub use address::{Area, AreaIterator, CellAddress};
pub use storage::MemoryGrid;
pub use value::{CellError, CellValue};
