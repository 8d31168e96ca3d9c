//! Cell styling types
//!
//! A [`CellStyle`] is an open property bag: every property is optional and an
//! absent property inherits from the next lower layer of the cascade. The
//! bag is ordered by [`StyleKey`] so two equal styles always print the same
//! canonical key, which is what [`StyleInterner`] deduplicates on.

mod alignment;
mod border;
mod color;
pub mod interner;
pub mod runs;

pub use alignment::{HorizontalAlignment, VerticalAlignment};
pub use border::{BorderEdge, BorderLineStyle};
pub use color::Color;
pub use interner::StyleInterner;
pub use runs::{compress_cell_styles, expand_cell_styles, StyleRunRecord};

use std::collections::BTreeMap;
use std::fmt;

/// A formatting property
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StyleKey {
    Fill,
    TextColor,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    FontName,
    FontSize,
    NumberFormat,
    HorizontalAlignment,
    VerticalAlignment,
    WrapText,
    BorderTop,
    BorderRight,
    BorderBottom,
    BorderLeft,
}

impl StyleKey {
    /// Every key, in canonical order
    pub const ALL: [StyleKey; 16] = [
        StyleKey::Fill,
        StyleKey::TextColor,
        StyleKey::Bold,
        StyleKey::Italic,
        StyleKey::Underline,
        StyleKey::Strikethrough,
        StyleKey::FontName,
        StyleKey::FontSize,
        StyleKey::NumberFormat,
        StyleKey::HorizontalAlignment,
        StyleKey::VerticalAlignment,
        StyleKey::WrapText,
        StyleKey::BorderTop,
        StyleKey::BorderRight,
        StyleKey::BorderBottom,
        StyleKey::BorderLeft,
    ];

    /// Stable property name
    pub fn name(&self) -> &'static str {
        match self {
            StyleKey::Fill => "fill",
            StyleKey::TextColor => "text_color",
            StyleKey::Bold => "bold",
            StyleKey::Italic => "italic",
            StyleKey::Underline => "underline",
            StyleKey::Strikethrough => "strikethrough",
            StyleKey::FontName => "font_name",
            StyleKey::FontSize => "font_size",
            StyleKey::NumberFormat => "number_format",
            StyleKey::HorizontalAlignment => "horizontal_alignment",
            StyleKey::VerticalAlignment => "vertical_alignment",
            StyleKey::WrapText => "wrap_text",
            StyleKey::BorderTop => "border_top",
            StyleKey::BorderRight => "border_right",
            StyleKey::BorderBottom => "border_bottom",
            StyleKey::BorderLeft => "border_left",
        }
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The value of one formatting property
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StyleValue {
    /// On/off properties (bold, italic, wrap, ...)
    Flag(bool),
    /// Fill and text colors
    Color(Color),
    /// Font name and number format
    Text(String),
    /// Font size in hundredths of a point
    Size(u32),
    /// Horizontal alignment
    Horizontal(HorizontalAlignment),
    /// Vertical alignment
    Vertical(VerticalAlignment),
    /// One border edge
    Border(BorderEdge),
}

impl StyleValue {
    /// The color carried by this value, if any
    pub fn as_color(&self) -> Option<Color> {
        match self {
            StyleValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// The flag carried by this value, if any
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            StyleValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Flag(b) => write!(f, "{}", b),
            StyleValue::Color(c) => write!(f, "{}", c),
            StyleValue::Text(s) => write!(f, "{:?}", s),
            StyleValue::Size(s) => write!(f, "{}", s),
            StyleValue::Horizontal(h) => write!(f, "{:?}", h),
            StyleValue::Vertical(v) => write!(f, "{:?}", v),
            StyleValue::Border(b) => write!(f, "{}", b),
        }
    }
}

/// A partial cell style
///
/// # Example
///
/// ```rust
/// use lattice_sheets_core::style::{CellStyle, Color, StyleKey};
///
/// let header = CellStyle::new().bold(true).fill(Color::YELLOW);
/// let row = CellStyle::new().fill(Color::GRAY);
///
/// // Later wins per key
/// let resolved = row.merged_with(&header);
/// assert_eq!(resolved.color(StyleKey::Fill), Some(Color::YELLOW));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CellStyle {
    props: BTreeMap<StyleKey, StyleValue>,
}

impl CellStyle {
    /// Create an empty style
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no property is set
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Number of properties set
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Get a property value
    pub fn get(&self, key: StyleKey) -> Option<&StyleValue> {
        self.props.get(&key)
    }

    /// Check whether a property is set
    pub fn contains(&self, key: StyleKey) -> bool {
        self.props.contains_key(&key)
    }

    /// Color-valued property
    pub fn color(&self, key: StyleKey) -> Option<Color> {
        self.get(key).and_then(StyleValue::as_color)
    }

    /// Flag-valued property
    pub fn flag(&self, key: StyleKey) -> Option<bool> {
        self.get(key).and_then(StyleValue::as_flag)
    }

    /// Set a property, returning the previous value
    pub fn set(&mut self, key: StyleKey, value: StyleValue) -> Option<StyleValue> {
        self.props.insert(key, value)
    }

    /// Remove a property
    pub fn remove(&mut self, key: StyleKey) -> Option<StyleValue> {
        self.props.remove(&key)
    }

    /// Iterate over the set properties in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (StyleKey, &StyleValue)> {
        self.props.iter().map(|(k, v)| (*k, v))
    }

    /// The set property keys in canonical order
    pub fn keys(&self) -> impl Iterator<Item = StyleKey> + '_ {
        self.props.keys().copied()
    }

    /// Builder: set a property
    pub fn with(mut self, key: StyleKey, value: StyleValue) -> Self {
        self.props.insert(key, value);
        self
    }

    /// Set fill color
    pub fn fill(self, color: Color) -> Self {
        self.with(StyleKey::Fill, StyleValue::Color(color))
    }

    /// Set text color
    pub fn text_color(self, color: Color) -> Self {
        self.with(StyleKey::TextColor, StyleValue::Color(color))
    }

    /// Set font to bold
    pub fn bold(self, bold: bool) -> Self {
        self.with(StyleKey::Bold, StyleValue::Flag(bold))
    }

    /// Set font to italic
    pub fn italic(self, italic: bool) -> Self {
        self.with(StyleKey::Italic, StyleValue::Flag(italic))
    }

    /// Underline text
    pub fn underline(self, underline: bool) -> Self {
        self.with(StyleKey::Underline, StyleValue::Flag(underline))
    }

    /// Strike through text
    pub fn strikethrough(self, strike: bool) -> Self {
        self.with(StyleKey::Strikethrough, StyleValue::Flag(strike))
    }

    /// Set font name
    pub fn font_name<S: Into<String>>(self, name: S) -> Self {
        self.with(StyleKey::FontName, StyleValue::Text(name.into()))
    }

    /// Set font size in points
    pub fn font_size(self, points: f64) -> Self {
        let size = (points.max(0.0) * 100.0).round() as u32;
        self.with(StyleKey::FontSize, StyleValue::Size(size))
    }

    /// Set number format string
    pub fn number_format<S: Into<String>>(self, format: S) -> Self {
        self.with(StyleKey::NumberFormat, StyleValue::Text(format.into()))
    }

    /// Set horizontal alignment
    pub fn horizontal_alignment(self, align: HorizontalAlignment) -> Self {
        self.with(StyleKey::HorizontalAlignment, StyleValue::Horizontal(align))
    }

    /// Set vertical alignment
    pub fn vertical_alignment(self, align: VerticalAlignment) -> Self {
        self.with(StyleKey::VerticalAlignment, StyleValue::Vertical(align))
    }

    /// Enable text wrapping
    pub fn wrap_text(self, wrap: bool) -> Self {
        self.with(StyleKey::WrapText, StyleValue::Flag(wrap))
    }

    /// Set one border edge; `key` must be one of the `Border*` keys
    pub fn border(self, key: StyleKey, edge: BorderEdge) -> Self {
        debug_assert!(matches!(
            key,
            StyleKey::BorderTop | StyleKey::BorderRight | StyleKey::BorderBottom | StyleKey::BorderLeft
        ));
        self.with(key, StyleValue::Border(edge))
    }

    /// Set all four border edges
    pub fn outline(self, edge: BorderEdge) -> Self {
        self.border(StyleKey::BorderTop, edge)
            .border(StyleKey::BorderRight, edge)
            .border(StyleKey::BorderBottom, edge)
            .border(StyleKey::BorderLeft, edge)
    }

    /// Layer `other` over `self`; properties set in `other` win
    pub fn overlay(&mut self, other: &CellStyle) {
        for (key, value) in &other.props {
            self.props.insert(*key, value.clone());
        }
    }

    /// Copy of `self` with `other` layered on top
    pub fn merged_with(&self, other: &CellStyle) -> CellStyle {
        let mut merged = self.clone();
        merged.overlay(other);
        merged
    }

    /// The properties of `self` whose value differs from `base`
    ///
    /// A property absent from `base` always differs.
    pub fn diff_from(&self, base: &CellStyle) -> CellStyle {
        let props = self
            .props
            .iter()
            .filter(|(key, value)| base.props.get(key) != Some(value))
            .map(|(key, value)| (*key, value.clone()))
            .collect();
        CellStyle { props }
    }

    /// Drop every listed property
    pub fn remove_keys<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = StyleKey>,
    {
        for key in keys {
            self.props.remove(&key);
        }
    }

    /// A string identifying this style; equal styles produce equal keys
    pub fn canonical_key(&self) -> String {
        let mut key = String::new();
        for (k, v) in &self.props {
            key.push_str(k.name());
            key.push('=');
            key.push_str(&v.to_string());
            key.push(';');
        }
        key
    }
}

impl fmt::Display for CellStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.canonical_key())
    }
}

impl FromIterator<(StyleKey, StyleValue)> for CellStyle {
    fn from_iter<T: IntoIterator<Item = (StyleKey, StyleValue)>>(iter: T) -> Self {
        CellStyle {
            props: iter.into_iter().collect(),
        }
    }
}
