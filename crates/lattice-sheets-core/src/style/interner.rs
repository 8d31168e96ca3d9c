//! Style table for deduplication
//!
//! Persisted sheets refer to styles by index. The interner hands out one
//! index per distinct canonical style; index 0 is always the empty style.

use super::CellStyle;
use ahash::AHashMap;

/// Style interner
///
/// Many cells share a style; the interner ensures each unique style is
/// stored once, as a deep copy, and referenced by a small integer.
#[derive(Debug, Clone)]
pub struct StyleInterner {
    /// All unique styles (index 0 is the empty style)
    styles: Vec<CellStyle>,
    /// Canonical key to index
    index_map: AHashMap<String, u32>,
}

impl StyleInterner {
    /// Create a new interner with the empty style at index 0
    pub fn new() -> Self {
        let mut interner = Self {
            styles: Vec::with_capacity(64),
            index_map: AHashMap::with_capacity(64),
        };
        let empty = CellStyle::new();
        interner.index_map.insert(empty.canonical_key(), 0);
        interner.styles.push(empty);
        interner
    }

    /// Get the index of a style, appending it if it was never seen
    ///
    /// The stored style is an independent copy; later changes to the
    /// caller's value do not reach the table.
    pub fn get_style_index(&mut self, style: &CellStyle) -> u32 {
        let key = style.canonical_key();
        if let Some(&idx) = self.index_map.get(&key) {
            return idx;
        }

        let idx = self.styles.len() as u32;
        self.index_map.insert(key, idx);
        self.styles.push(style.clone());
        idx
    }

    /// Look up an index without interning
    pub fn find(&self, style: &CellStyle) -> Option<u32> {
        self.index_map.get(&style.canonical_key()).copied()
    }

    /// Get a style by index
    pub fn get(&self, index: u32) -> Option<&CellStyle> {
        self.styles.get(index as usize)
    }

    /// Get the number of styles, the empty one included
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if only the empty style is present
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }

    /// Iterate over all styles with their indices
    pub fn iter(&self) -> impl Iterator<Item = (u32, &CellStyle)> {
        self.styles.iter().enumerate().map(|(i, s)| (i as u32, s))
    }

    /// The styles from index 1 on, in index order
    pub fn table(&self) -> &[CellStyle] {
        &self.styles[1..]
    }

    /// Build an interner from a persisted table (entries 1..)
    pub fn from_table(table: &[CellStyle]) -> Self {
        let mut interner = Self::new();
        for style in table {
            let idx = interner.styles.len() as u32;
            interner.index_map.entry(style.canonical_key()).or_insert(idx);
            interner.styles.push(style.clone());
        }
        interner
    }
}

impl Default for StyleInterner {
    fn default() -> Self {
        Self::new()
    }
}
