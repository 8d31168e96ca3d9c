//! # lattice-sheets-core
//!
//! Structural store for spreadsheet formatting.
//!
//! This crate keeps everything that hangs off rows and columns consistent
//! while they are styled, inserted and deleted:
//! - [`StyleCascade`] - Layered style resolution with delta storage and a per-cell cache
//! - [`RegionHeads`] - Merged and array-formula regions
//! - [`NamedRangeCollection`] - Defined names, patched by structural edits
//! - [`ConditionalFormats`] - Rule results turned into a style overlay
//! - [`StyleInterner`] and style runs - The persisted style table
//! - [`Workbook`], [`Worksheet`] - The document structures tying it together
//!
//! Cell values are held by a [`Grid`]; they are never computed here.
//!
//! ## Example
//!
//! ```rust
//! use lattice_sheets_core::{Area, Axis, CellStyle, Color, StyleKey, StyleScope, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_style(StyleScope::Column(1), &CellStyle::new().bold(true), true).unwrap();
//! sheet.set_style(StyleScope::Cell(3, 1), &CellStyle::new().fill(Color::YELLOW), true).unwrap();
//!
//! // Insert two rows above the styled cell
//! workbook.insert_lines(0, Axis::Row, 0, 2).unwrap();
//!
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! let style = sheet.effective_style(5, 1);
//! assert_eq!(style.color(StyleKey::Fill), Some(Color::YELLOW));
//! assert_eq!(style.flag(StyleKey::Bold), Some(true));
//! ```

pub mod cascade;
pub mod cell;
pub mod conditional_format;
pub mod error;
pub mod grid;
pub mod named_range;
pub mod patch;
pub mod region;
pub mod snapshot;
pub mod structure;
pub mod style;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cascade::{StyleCache, StyleCascade};
pub use cell::{Area, CellAddress, CellError, CellValue, MemoryGrid};
pub use conditional_format::{
    ConditionalFormats, ConditionalRule, GradientSpec, GradientStops, GradientTarget, RuleKind,
    RuleResult, RuleState,
};
pub use error::{Error, Result};
pub use grid::Grid;
pub use named_range::{NameScope, NameTarget, NamedRange, NamedRangeCollection};
pub use patch::{AreaPatch, Axis, LineEdit, SpanEdit};
pub use region::{RegionHeads, RegionId};
pub use snapshot::{NamedEntityRecord, SheetSnapshot, WorkbookSnapshot};
pub use structure::EditReport;
pub use workbook::{validate_sheet_name, Workbook, WorkbookSettings};
pub use worksheet::{SheetOptions, StyleScope, Worksheet};

// Re-export all style types for convenience
pub use style::{
    BorderEdge, BorderLineStyle, CellStyle, Color, HorizontalAlignment, StyleInterner, StyleKey,
    StyleRunRecord, StyleValue, VerticalAlignment,
};

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u32 = 16_384;

/// Rows in a new worksheet
pub const DEFAULT_ROWS: u32 = 1_000;

/// Columns in a new worksheet
pub const DEFAULT_COLS: u32 = 100;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
