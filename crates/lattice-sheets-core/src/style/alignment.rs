//! Alignment property values
//!
//! Stored under `StyleKey::HorizontalAlignment` and
//! `StyleKey::VerticalAlignment`; wrapping is a separate flag.

/// Horizontal placement of cell content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HorizontalAlignment {
    /// Text left, numbers right
    #[default]
    General,
    Left,
    Center,
    Right,
    /// Repeat content across the cell
    Fill,
    Justify,
}

/// Vertical placement of cell content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VerticalAlignment {
    Top,
    Center,
    #[default]
    Bottom,
}
