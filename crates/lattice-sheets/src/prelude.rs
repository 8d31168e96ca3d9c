//! Prelude module - common imports for lattice-sheets users
//!
//! ```rust
//! use lattice_sheets::prelude::*;
//! ```

pub use crate::{
    // Structure
    Area,
    Axis,
    // Style types
    BorderEdge,
    BorderLineStyle,
    CellAddress,
    CellStyle,
    // Cell types
    CellValue,
    Color,
    // Conditional formatting types
    ConditionalRule,
    EditReport,
    // Errors
    Error,
    GradientSpec,
    GradientTarget,
    Grid,
    HorizontalAlignment,
    // Named ranges
    NameScope,
    NamedRange,
    Result,
    RuleResult,
    SheetOptions,
    StyleKey,
    StyleScope,
    VerticalAlignment,
    // Workbook types
    Workbook,
    WorkbookSettings,
    WorkbookSnapshot,
    Worksheet,
};
