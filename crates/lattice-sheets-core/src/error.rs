//! Error types for lattice-sheets-core

use thiserror::Error;

use crate::patch::Axis;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lattice-sheets-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Line index outside the sheet
    #[error("{axis} index {index} out of bounds (count: {count})")]
    LineOutOfBounds { axis: Axis, index: u32, count: u32 },

    /// Sheet index out of bounds
    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// A structural edit would split an array region
    #[error("Cannot insert {axis} before {before}: it would split the array region {region}")]
    RejectedEdit {
        axis: Axis,
        before: u32,
        region: String,
    },

    /// Invalid named range
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Name already defined in the same scope
    #[error("Name '{0}' already exists in this scope")]
    DuplicateName(String),

    /// A reference could not be tied to a sheet while patching
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// A conditional format result does not fit its target
    #[error("Rule {rule} result is {actual}, expected {expected}")]
    MalformedResult {
        rule: usize,
        expected: String,
        actual: String,
    },

    /// Merged cell conflict
    #[error("Cell {0} is part of a merged region")]
    MergedCellConflict(String),

    /// Region overlaps another region
    #[error("Range {0} overlaps an existing region")]
    RegionConflict(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
