//! Cell address and area types

use crate::error::{Error, Result};
use crate::patch::Axis;
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A cell address, zero-based, optionally tied to a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u32,
    /// Owning sheet, if the address is qualified
    pub sheet: Option<usize>,
}

impl CellAddress {
    /// Create an unqualified cell address
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            sheet: None,
        }
    }

    /// Create a sheet-qualified cell address
    pub fn on_sheet(row: u32, col: u32, sheet: usize) -> Self {
        Self {
            row,
            col,
            sheet: Some(sheet),
        }
    }

    /// Index of this address along `axis`
    pub fn line(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Row => self.row,
            Axis::Column => self.col,
        }
    }

    /// Parse a cell address from A1-style notation (`$` markers are accepted and ignored)
    ///
    /// # Examples
    /// ```
    /// use lattice_sheets_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B2").unwrap();
    /// assert_eq!((addr.row, addr.col), (1, 1));
    ///
    /// let addr = CellAddress::parse("$C$10").unwrap();
    /// assert_eq!((addr.row, addr.col), (9, 2));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }

        if pos == col_start {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = Self::letters_to_column(&s[col_start..pos])?;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let row = Self::parse_row_number(&s[pos..])
            .ok_or_else(|| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;

        Ok(Self::new(row, col))
    }

    /// Parse a 1-based row number into a 0-based index
    fn parse_row_number(s: &str) -> Option<u32> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let row: u32 = s.parse().ok()?;
        if row == 0 || row > MAX_ROWS {
            return None;
        }
        Some(row - 1)
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = u64::from(col) + 1;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() || letters.len() > 3 {
            return Err(Error::InvalidAddress(format!(
                "invalid column letters '{}'",
                letters
            )));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        }

        let col = col - 1;
        if col >= MAX_COLS {
            return Err(Error::InvalidAddress(format!(
                "column '{}' past the last column",
                letters
            )));
        }

        Ok(col)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), u64::from(self.row) + 1)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// An inclusive rectangular range of cells
///
/// The corners are always normalized so that `start` is the top-left cell.
/// The `entire_*` flags mark axes that are open-ended: an entire-row area
/// spans every column regardless of the stored column bounds, and so on.
/// Two areas are equal when their corners match; the flags do not take part.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Area {
    /// Top-left corner
    pub start: CellAddress,
    /// Bottom-right corner
    pub end: CellAddress,
    /// Area covers whole rows
    pub entire_row: bool,
    /// Area covers whole columns
    pub entire_column: bool,
    /// Area covers the whole sheet
    pub entire_sheet: bool,
}

impl PartialEq for Area {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl Eq for Area {}

impl Hash for Area {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.end.hash(state);
    }
}

impl Area {
    /// Create a new area, normalizing the corners
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        let sheet = start.sheet.or(end.sheet);
        Self {
            start: CellAddress {
                row: start.row.min(end.row),
                col: start.col.min(end.col),
                sheet,
            },
            end: CellAddress {
                row: start.row.max(end.row),
                col: start.col.max(end.col),
                sheet,
            },
            entire_row: false,
            entire_column: false,
            entire_sheet: false,
        }
    }

    /// Create an area from row/column indices
    pub fn from_indices(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Create a single-cell area
    pub fn single(addr: CellAddress) -> Self {
        Self::new(addr, addr)
    }

    /// Whole rows `first..=last`
    pub fn rows(first: u32, last: u32) -> Self {
        let mut area = Self::from_indices(first, 0, last, MAX_COLS - 1);
        area.entire_row = true;
        area
    }

    /// Whole columns `first..=last`
    pub fn columns(first: u32, last: u32) -> Self {
        let mut area = Self::from_indices(0, first, MAX_ROWS - 1, last);
        area.entire_column = true;
        area
    }

    /// The whole sheet
    pub fn whole_sheet() -> Self {
        let mut area = Self::from_indices(0, 0, MAX_ROWS - 1, MAX_COLS - 1);
        area.entire_sheet = true;
        area
    }

    /// Qualify both corners with a sheet id
    pub fn on_sheet(mut self, sheet: usize) -> Self {
        self.start.sheet = Some(sheet);
        self.end.sheet = Some(sheet);
        self
    }

    /// The sheet this area lives on, if qualified
    pub fn sheet(&self) -> Option<usize> {
        self.start.sheet
    }

    /// Whether the area has no concrete bound along `axis`
    pub fn is_open_on(&self, axis: Axis) -> bool {
        self.entire_sheet
            || match axis {
                Axis::Row => self.entire_column,
                Axis::Column => self.entire_row,
            }
    }

    /// Inclusive `(first, last)` line span along `axis`
    pub fn span(&self, axis: Axis) -> (u32, u32) {
        match axis {
            Axis::Row => (self.start.row, self.end.row),
            Axis::Column => (self.start.col, self.end.col),
        }
    }

    /// Copy of this area with a new span along `axis`
    pub fn with_span(&self, axis: Axis, first: u32, last: u32) -> Self {
        let mut area = *self;
        match axis {
            Axis::Row => {
                area.start.row = first.min(last);
                area.end.row = first.max(last);
            }
            Axis::Column => {
                area.start.col = first.min(last);
                area.end.col = first.max(last);
            }
        }
        area
    }

    /// Resolve open bounds against a sheet of `rows` x `cols` and clamp to it
    ///
    /// Returns `None` when nothing of the area lies inside the sheet.
    pub fn normalize(&self, rows: u32, cols: u32) -> Option<Area> {
        if rows == 0 || cols == 0 {
            return None;
        }
        let (mut r0, mut r1) = self.span(Axis::Row);
        let (mut c0, mut c1) = self.span(Axis::Column);
        if self.is_open_on(Axis::Row) {
            r0 = 0;
            r1 = rows - 1;
        }
        if self.is_open_on(Axis::Column) {
            c0 = 0;
            c1 = cols - 1;
        }
        if r0 >= rows || c0 >= cols {
            return None;
        }
        let mut area = Area::from_indices(r0, c0, r1.min(rows - 1), c1.min(cols - 1));
        if let Some(sheet) = self.sheet() {
            area = area.on_sheet(sheet);
        }
        Some(area)
    }

    /// Grow the area by `by` lines in every direction, stopping at the sheet edges
    pub fn expanded(&self, by: u32, rows: u32, cols: u32) -> Area {
        let mut area = *self;
        area.start.row = area.start.row.saturating_sub(by);
        area.start.col = area.start.col.saturating_sub(by);
        area.end.row = area.end.row.saturating_add(by).min(rows.saturating_sub(1));
        area.end.col = area.end.col.saturating_add(by).min(cols.saturating_sub(1));
        area
    }

    /// Parse `A1`, `A1:B10`, whole columns `A:C` or whole rows `3:5`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let Some((left, right)) = s.split_once(':') else {
            return Ok(Self::single(CellAddress::parse(s)?));
        };
        let (left, right) = (left.trim_start_matches('$'), right.trim_start_matches('$'));

        if let (Some(first), Some(last)) = (
            CellAddress::parse_row_number(left),
            CellAddress::parse_row_number(right),
        ) {
            return Ok(Self::rows(first.min(last), first.max(last)));
        }
        if left.bytes().all(|b| b.is_ascii_alphabetic())
            && right.bytes().all(|b| b.is_ascii_alphabetic())
        {
            let first = CellAddress::letters_to_column(left)
                .map_err(|_| Error::InvalidRange(s.to_string()))?;
            let last = CellAddress::letters_to_column(right)
                .map_err(|_| Error::InvalidRange(s.to_string()))?;
            return Ok(Self::columns(first.min(last), first.max(last)));
        }

        let start = CellAddress::parse(left).map_err(|_| Error::InvalidRange(s.to_string()))?;
        let end = CellAddress::parse(right).map_err(|_| Error::InvalidRange(s.to_string()))?;
        Ok(Self::new(start, end))
    }

    /// Check if a cell is within this area
    pub fn contains(&self, row: u32, col: u32) -> bool {
        let (r0, r1) = self.span(Axis::Row);
        let (c0, c1) = self.span(Axis::Column);
        (self.is_open_on(Axis::Row) || (row >= r0 && row <= r1))
            && (self.is_open_on(Axis::Column) || (col >= c0 && col <= c1))
    }

    /// Get the number of rows in the area
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the area
    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the area
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Check if this area overlaps with another
    pub fn overlaps(&self, other: &Area) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Get the intersection of two areas, if any
    pub fn intersect(&self, other: &Area) -> Option<Area> {
        if !self.overlaps(other) {
            return None;
        }

        Some(Area::from_indices(
            self.start.row.max(other.start.row),
            self.start.col.max(other.start.col),
            self.end.row.min(other.end.row),
            self.end.col.min(other.end.col),
        ))
    }

    /// Iterate over all cell addresses in the stored bounds (row by row)
    pub fn cells(&self) -> AreaIterator {
        AreaIterator {
            area: *self,
            current_row: self.start.row,
            current_col: self.start.col,
        }
    }

    /// Format as an A1 label (`B2`, `A1:C3`, `2:4`, `B:D`)
    pub fn to_a1_string(&self) -> String {
        if self.entire_sheet {
            return format!("1:{}", MAX_ROWS);
        }
        if self.entire_row {
            return format!("{}:{}", u64::from(self.start.row) + 1, u64::from(self.end.row) + 1);
        }
        if self.entire_column {
            return format!(
                "{}:{}",
                CellAddress::column_to_letters(self.start.col),
                CellAddress::column_to_letters(self.end.col)
            );
        }
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for Area {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over cells in an area
pub struct AreaIterator {
    area: Area,
    current_row: u32,
    current_col: u32,
}

impl Iterator for AreaIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row > self.area.end.row {
            return None;
        }

        let addr = CellAddress {
            row: self.current_row,
            col: self.current_col,
            sheet: self.area.sheet(),
        };

        if self.current_col >= self.area.end.col {
            self.current_col = self.area.start.col;
            self.current_row += 1;
        } else {
            self.current_col += 1;
        }

        Some(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(701), "ZZ");
        assert_eq!(CellAddress::column_to_letters(16383), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(CellAddress::letters_to_column("A").unwrap(), 0);
        assert_eq!(CellAddress::letters_to_column("AB").unwrap(), 27);
        assert_eq!(CellAddress::letters_to_column("xfd").unwrap(), 16383);
        assert!(CellAddress::letters_to_column("XFE").is_err());
        assert!(CellAddress::letters_to_column("ABCD").is_err());
    }

    #[test]
    fn test_cell_address_parse() {
        let addr = CellAddress::parse("A1").unwrap();
        assert_eq!((addr.row, addr.col), (0, 0));
        assert_eq!(addr.sheet, None);

        let addr = CellAddress::parse("$B$2").unwrap();
        assert_eq!((addr.row, addr.col), (1, 1));

        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("A").is_err());
        assert!(CellAddress::parse("1").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("A1048577").is_err());
    }

    #[test]
    fn test_area_normalizes_corners() {
        let area = Area::from_indices(5, 4, 1, 2);
        assert_eq!(area.start, CellAddress::new(1, 2));
        assert_eq!(area.end, CellAddress::new(5, 4));
    }

    #[test]
    fn test_area_equality_ignores_flags() {
        let mut a = Area::from_indices(0, 0, 3, 3);
        let b = Area::from_indices(0, 0, 3, 3);
        a.entire_row = true;
        assert_eq!(a, b);
        assert_ne!(a, Area::from_indices(0, 0, 3, 4));
    }

    #[test]
    fn test_area_parse_forms() {
        assert_eq!(Area::parse("B2:D4").unwrap(), Area::from_indices(1, 1, 3, 3));
        assert_eq!(Area::parse("C3").unwrap(), Area::from_indices(2, 2, 2, 2));

        let rows = Area::parse("3:5").unwrap();
        assert!(rows.entire_row);
        assert_eq!(rows.span(Axis::Row), (2, 4));

        let cols = Area::parse("B:D").unwrap();
        assert!(cols.entire_column);
        assert_eq!(cols.span(Axis::Column), (1, 3));
        assert_eq!(cols.to_a1_string(), "B:D");
    }

    #[test]
    fn test_normalize_clamps_open_bounds() {
        let cols = Area::columns(1, 2);
        let concrete = cols.normalize(10, 10).unwrap();
        assert_eq!(concrete, Area::from_indices(0, 1, 9, 2));
        assert!(!concrete.entire_column);

        let far = Area::from_indices(20, 0, 30, 0);
        assert!(far.normalize(10, 10).is_none());

        let partial = Area::from_indices(8, 8, 30, 30);
        assert_eq!(partial.normalize(10, 10).unwrap(), Area::from_indices(8, 8, 9, 9));
    }

    #[test]
    fn test_expanded_stops_at_edges() {
        let area = Area::from_indices(0, 0, 2, 2);
        assert_eq!(area.expanded(1, 10, 3), Area::from_indices(0, 0, 3, 2));
    }

    #[test]
    fn test_area_iterator() {
        let cells: Vec<_> = Area::parse("A1:B2").unwrap().cells().collect();
        assert_eq!(
            cells,
            vec![
                CellAddress::new(0, 0),
                CellAddress::new(0, 1),
                CellAddress::new(1, 0),
                CellAddress::new(1, 1),
            ]
        );
    }

    #[test]
    fn test_contains_open_axis() {
        let rows = Area::rows(2, 3);
        assert!(rows.contains(2, 9000));
        assert!(!rows.contains(4, 0));
    }
}
