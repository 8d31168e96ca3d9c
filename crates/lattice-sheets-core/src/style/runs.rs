//! Run-length records for persisting per-cell style references

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// One persisted run of identical style references down a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleRunRecord {
    /// First row of the run
    pub row: u32,
    /// Column of the run
    pub column: u32,
    /// Style table index
    #[cfg_attr(feature = "serde", serde(rename = "ref"))]
    pub style: u32,
    /// Number of cells in the run; absent for a single cell
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub run_length: Option<u32>,
}

impl StyleRunRecord {
    /// Number of cells this record stands for
    pub fn len(&self) -> u32 {
        self.run_length.unwrap_or(1)
    }

    /// Check whether the record covers no cell (never true for emitted records)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last row covered
    ///
    /// Fails for an empty run or one reaching past `u32::MAX`.
    pub fn last_row(&self) -> Result<u32> {
        self.len()
            .checked_sub(1)
            .and_then(|extra| self.row.checked_add(extra))
            .ok_or_else(|| {
                Error::InvalidRange(format!(
                    "run of {} cell(s) from row {} in column {}",
                    self.len(),
                    self.row,
                    self.column
                ))
            })
    }
}

/// Encode per-column style references as vertical runs
///
/// `columns` maps column → row → style index. Each column is scanned top to
/// bottom; consecutive rows holding the same index collapse into one record.
/// Index 0 (the empty style) is not persisted.
pub fn compress_cell_styles(columns: &BTreeMap<u32, BTreeMap<u32, u32>>) -> Vec<StyleRunRecord> {
    let mut records = Vec::new();

    for (&column, rows) in columns {
        let mut current: Option<(u32, u32, u32)> = None; // (start row, style, length)

        for (&row, &style) in rows {
            if style == 0 {
                continue;
            }
            current = match current {
                Some((start, s, len)) if s == style && start + len == row => {
                    Some((start, s, len + 1))
                }
                previous => {
                    if let Some(run) = previous {
                        records.push(run_record(column, run));
                    }
                    Some((row, style, 1))
                }
            };
        }

        if let Some(run) = current {
            records.push(run_record(column, run));
        }
    }

    records
}

fn run_record(column: u32, (row, style, len): (u32, u32, u32)) -> StyleRunRecord {
    StyleRunRecord {
        row,
        column,
        style,
        run_length: (len > 1).then_some(len),
    }
}

/// Decode run records back into column → row → style index
///
/// Empty runs and runs running off the last row are rejected.
pub fn expand_cell_styles(
    records: &[StyleRunRecord],
) -> Result<BTreeMap<u32, BTreeMap<u32, u32>>> {
    let mut columns: BTreeMap<u32, BTreeMap<u32, u32>> = BTreeMap::new();
    for record in records {
        let last = record.last_row()?;
        let rows = columns.entry(record.column).or_default();
        for row in record.row..=last {
            rows.insert(row, record.style);
        }
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column(entries: &[(u32, u32)]) -> BTreeMap<u32, u32> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_runs_collapse_vertically() {
        let columns = BTreeMap::from([
            (0, column(&[(0, 1), (1, 1), (2, 1), (3, 2)])),
            (4, column(&[(7, 3)])),
        ]);

        assert_eq!(
            compress_cell_styles(&columns),
            vec![
                StyleRunRecord { row: 0, column: 0, style: 1, run_length: Some(3) },
                StyleRunRecord { row: 3, column: 0, style: 2, run_length: None },
                StyleRunRecord { row: 7, column: 4, style: 3, run_length: None },
            ]
        );
    }

    #[test]
    fn test_gap_breaks_run() {
        let columns = BTreeMap::from([(1, column(&[(0, 5), (2, 5)]))]);
        let records = compress_cell_styles(&columns);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.run_length.is_none()));
    }

    #[test]
    fn test_never_larger_than_cells() {
        let columns = BTreeMap::from([
            (0, column(&[(0, 1), (1, 2), (2, 1), (3, 1)])),
            (1, column(&[(0, 0), (5, 4)])),
        ]);
        let records = compress_cell_styles(&columns);
        let cells: usize = columns.values().map(|c| c.len()).sum();
        assert!(records.len() <= cells);

        // Expanding gives back everything but the empty-style entries
        let mut expected = columns.clone();
        expected.get_mut(&1).unwrap().remove(&0);
        assert_eq!(expand_cell_styles(&records).unwrap(), expected);
    }

    #[test]
    fn test_expand_rejects_overflowing_runs() {
        let overflow = StyleRunRecord { row: u32::MAX, column: 0, style: 1, run_length: Some(2) };
        assert!(overflow.last_row().is_err());
        assert!(matches!(expand_cell_styles(&[overflow]), Err(Error::InvalidRange(_))));

        let empty = StyleRunRecord { row: 3, column: 0, style: 1, run_length: Some(0) };
        assert!(expand_cell_styles(&[empty]).is_err());

        let edge = StyleRunRecord { row: u32::MAX, column: 2, style: 1, run_length: None };
        assert_eq!(
            expand_cell_styles(&[edge]).unwrap(),
            BTreeMap::from([(2, column(&[(u32::MAX, 1)]))])
        );
    }
}
