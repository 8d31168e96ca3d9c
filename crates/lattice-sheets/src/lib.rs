//! # lattice-sheets
//!
//! The structural store underneath a spreadsheet document: per-cell
//! formatting, merged and array regions, named ranges and conditional
//! format overlays, kept consistent while rows and columns are styled,
//! inserted and deleted.
//!
//! ## Features
//!
//! - Layered style resolution (sheet, banding, row, column, cell, conditional)
//! - Minimal per-cell deltas with reverse-override pruning
//! - All-or-nothing row/column insert and delete
//! - Named ranges that follow the lines they point at
//! - Style table interning and run compression for persistence
//!
//! ## Example
//!
//! ```rust
//! use lattice_sheets::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_style(StyleScope::Row(2), &CellStyle::new().bold(true), true).unwrap();
//! workbook
//!     .define_name(NamedRange::range("Header", Area::parse("A3:C3").unwrap(), NameScope::Sheet(0)))
//!     .unwrap();
//!
//! // Push everything down one row
//! workbook.insert_lines(0, Axis::Row, 0, 1).unwrap();
//!
//! let header = workbook.get_named_range("header", 0).unwrap();
//! assert_eq!(header.area(), Some(&Area::parse("A4:C4").unwrap()));
//!
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! assert_eq!(sheet.effective_style(3, 0).flag(StyleKey::Bold), Some(true));
//! ```

pub mod prelude;

// Re-export core types
pub use lattice_sheets_core::{
    // Structure
    Area,
    AreaPatch,
    Axis,
    // Style types
    BorderEdge,
    BorderLineStyle,
    CellAddress,
    CellError,
    CellStyle,
    // Cell types
    CellValue,
    Color,
    // Conditional formatting types
    ConditionalFormats,
    ConditionalRule,
    EditReport,
    // Errors
    Error,
    GradientSpec,
    GradientStops,
    GradientTarget,
    Grid,
    HorizontalAlignment,
    LineEdit,
    MemoryGrid,
    NameScope,
    NameTarget,
    // Named ranges
    NamedEntityRecord,
    NamedRange,
    NamedRangeCollection,
    RegionHeads,
    RegionId,
    Result,
    RuleKind,
    RuleResult,
    RuleState,
    SheetOptions,
    // Persistence
    SheetSnapshot,
    SpanEdit,
    StyleCascade,
    StyleInterner,
    StyleKey,
    StyleRunRecord,
    StyleScope,
    StyleValue,
    VerticalAlignment,
    // Workbook types
    Workbook,
    WorkbookSettings,
    WorkbookSnapshot,
    Worksheet,
};

// Re-export modules for advanced usage
pub use lattice_sheets_core::{cascade, conditional_format, named_range, patch, snapshot, style};

pub use lattice_sheets_core::named_range::validate_name;
pub use lattice_sheets_core::validate_sheet_name;

/// Maximum number of rows in a worksheet
pub use lattice_sheets_core::MAX_ROWS;

/// Maximum number of columns in a worksheet
pub use lattice_sheets_core::MAX_COLS;
