//! Persisted shape of sheet formatting and names
//!
//! A sheet snapshot carries its own style table (indexed from 1, index 0
//! being the empty style), the cell deltas as vertical runs, and the row and
//! column entries by style index. Names are flattened to their label.

use std::collections::BTreeMap;

use crate::cell::Area;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::named_range::{NameScope, NamedRange};
use crate::patch::Axis;
use crate::style::{compress_cell_styles, expand_cell_styles, CellStyle, StyleInterner, StyleRunRecord};
use crate::worksheet::Worksheet;

/// Formatting of one sheet, ready to persist
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetSnapshot {
    /// Sheet name
    pub name: String,
    /// Style table; the first entry has index 1
    pub styles: Vec<CellStyle>,
    /// Index of the sheet layer, if it holds anything
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub sheet_style: Option<u32>,
    /// Cell deltas as vertical runs
    pub cell_styles: Vec<StyleRunRecord>,
    /// Row entries by style index
    pub row_style: BTreeMap<u32, u32>,
    /// Column entries by style index
    pub column_style: BTreeMap<u32, u32>,
    /// Row count of the sheet when captured
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub rows: Option<u32>,
    /// Column count of the sheet when captured
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub cols: Option<u32>,
}

impl SheetSnapshot {
    /// Look up a style by its persisted index
    pub fn style(&self, index: u32) -> Option<&CellStyle> {
        match index {
            0 => None,
            i => self.styles.get(i as usize - 1),
        }
    }
}

/// A named range flattened for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedEntityRecord {
    pub name: String,
    /// `Sheet!A1:B2`, `A1:B2`, or the expression text
    pub expression_or_area_label: String,
    /// Sheet index for sheet-scoped names
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub scope: Option<usize>,
}

impl NamedEntityRecord {
    /// Flatten a name; ranges qualified by a sheet get that sheet's name
    pub fn from_named_range(range: &NamedRange, sheet_names: &[&str]) -> Self {
        let label = match range.area() {
            Some(area) => match area.sheet().and_then(|s| sheet_names.get(s)) {
                Some(sheet) => format!("{}!{}", quote_sheet_name(sheet), area.to_a1_string()),
                None => area.to_a1_string(),
            },
            None => range.label(),
        };
        Self {
            name: range.name.clone(),
            expression_or_area_label: label,
            scope: range.scope.sheet(),
        }
    }

    /// Rebuild the name; labels that do not parse as a range stay expressions
    pub fn to_named_range(&self, sheet_names: &[&str]) -> NamedRange {
        let scope = match self.scope {
            Some(idx) => NameScope::Sheet(idx),
            None => NameScope::Workbook,
        };
        match parse_area_label(&self.expression_or_area_label, sheet_names) {
            Some(area) => NamedRange::range(&self.name, area, scope),
            None => NamedRange::expression(&self.name, &self.expression_or_area_label, scope),
        }
    }
}

/// Formatting and names of a whole workbook
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkbookSnapshot {
    pub sheets: Vec<SheetSnapshot>,
    pub named: Vec<NamedEntityRecord>,
}

fn quote_sheet_name(name: &str) -> String {
    if name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn parse_area_label(label: &str, sheet_names: &[&str]) -> Option<Area> {
    match label.rsplit_once('!') {
        Some((sheet, range)) => {
            let sheet = sheet
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .map(|s| s.replace("''", "'"))
                .unwrap_or_else(|| sheet.to_string());
            let index = sheet_names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(&sheet))?;
            Area::parse(range).ok().map(|area| area.on_sheet(index))
        }
        None => Area::parse(label).ok(),
    }
}

impl<G: Grid> Worksheet<G> {
    /// Capture the formatting layers as a persisted snapshot
    pub fn snapshot(&self) -> SheetSnapshot {
        let mut interner = StyleInterner::new();

        let sheet_style = Some(self.styles.sheet_style())
            .filter(|style| !style.is_empty())
            .map(|style| interner.get_style_index(style));
        let row_style = self
            .styles
            .row_entries()
            .iter()
            .map(|(&row, style)| (row, interner.get_style_index(style)))
            .collect();
        let column_style = self
            .styles
            .column_entries()
            .iter()
            .map(|(&col, style)| (col, interner.get_style_index(style)))
            .collect();

        let mut by_column: BTreeMap<u32, BTreeMap<u32, u32>> = BTreeMap::new();
        for (row, col, delta) in self.styles.cell_deltas() {
            let idx = interner.get_style_index(delta);
            by_column.entry(col).or_default().insert(row, idx);
        }

        SheetSnapshot {
            name: self.name.clone(),
            styles: interner.table().to_vec(),
            sheet_style,
            cell_styles: compress_cell_styles(&by_column),
            row_style,
            column_style,
            rows: Some(self.row_count()),
            cols: Some(self.col_count()),
        }
    }

    /// Replace the sheet, row, column and cell layers from a snapshot
    ///
    /// Nothing changes if the snapshot refers to a style missing from its
    /// table or to a line outside the sheet.
    pub fn restore_styles(&mut self, snapshot: &SheetSnapshot) -> Result<()> {
        self.check_snapshot_lines(snapshot)?;

        let lookup = |index: u32| -> Result<CellStyle> {
            snapshot.style(index).cloned().ok_or_else(|| {
                Error::other(format!(
                    "style index {} is not in the table of sheet '{}'",
                    index, snapshot.name
                ))
            })
        };

        let sheet = match snapshot.sheet_style {
            Some(idx) => lookup(idx)?,
            None => CellStyle::new(),
        };
        let rows = snapshot
            .row_style
            .iter()
            .map(|(&row, &idx)| Ok((row, lookup(idx)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let columns = snapshot
            .column_style
            .iter()
            .map(|(&col, &idx)| Ok((col, lookup(idx)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        let mut cells: BTreeMap<u32, BTreeMap<u32, CellStyle>> = BTreeMap::new();
        for (col, column) in expand_cell_styles(&snapshot.cell_styles)? {
            for (row, idx) in column {
                cells.entry(row).or_default().insert(col, lookup(idx)?);
            }
        }

        self.styles.restore(sheet, rows, columns, cells);
        Ok(())
    }

    fn check_snapshot_lines(&self, snapshot: &SheetSnapshot) -> Result<()> {
        let check = |axis: Axis, index: u32| {
            let count = self.grid.line_count(axis);
            if index < count {
                Ok(())
            } else {
                Err(Error::LineOutOfBounds { axis, index, count })
            }
        };
        for &row in snapshot.row_style.keys() {
            check(Axis::Row, row)?;
        }
        for &col in snapshot.column_style.keys() {
            check(Axis::Column, col)?;
        }
        for record in &snapshot.cell_styles {
            check(Axis::Row, record.last_row()?)?;
            check(Axis::Column, record.column)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;
    use crate::worksheet::{SheetOptions, StyleScope};
    use pretty_assertions::assert_eq;

    fn styled_sheet() -> Worksheet {
        let mut ws = Worksheet::with_options("Data", SheetOptions::sized(20, 5));
        let red = CellStyle::new().fill(Color::RED);
        for row in 2..5 {
            ws.set_style(StyleScope::Cell(row, 1), &red, true).unwrap();
        }
        ws.set_style(StyleScope::Cell(9, 1), &CellStyle::new().bold(true), true)
            .unwrap();
        ws.set_style(StyleScope::Column(3), &red, true).unwrap();
        ws
    }

    #[test]
    fn test_snapshot_shares_style_indices() {
        let snap = styled_sheet().snapshot();

        assert_eq!(snap.styles.len(), 2);
        assert_eq!(snap.style(1), Some(&CellStyle::new().fill(Color::RED)));
        assert_eq!(snap.column_style, BTreeMap::from([(3, 1)]));
        assert_eq!(
            snap.cell_styles,
            vec![
                StyleRunRecord { row: 2, column: 1, style: 1, run_length: Some(3) },
                StyleRunRecord { row: 9, column: 1, style: 2, run_length: None },
            ]
        );
        assert_eq!(snap.sheet_style, None);
    }

    #[test]
    fn test_restore_rebuilds_layers() {
        let mut source = styled_sheet();
        let snap = source.snapshot();

        let mut target = Worksheet::with_options("Data", SheetOptions::sized(20, 5));
        target.restore_styles(&snap).unwrap();

        for (row, col) in [(2, 1), (4, 1), (9, 1), (0, 3), (7, 0)] {
            assert_eq!(target.effective_style(row, col), source.effective_style(row, col));
        }
        assert_eq!(target.snapshot(), snap);
    }

    #[test]
    fn test_restore_rejects_unknown_index() {
        let mut ws = styled_sheet();
        let before = ws.snapshot();
        let broken = SheetSnapshot {
            row_style: BTreeMap::from([(0, 7)]),
            ..before.clone()
        };
        assert!(ws.restore_styles(&broken).is_err());
        assert_eq!(ws.snapshot(), before);
    }

    #[test]
    fn test_restore_rejects_lines_outside_sheet() {
        let mut ws = Worksheet::with_options("Small", SheetOptions::sized(10, 10));
        ws.set_style(StyleScope::Cell(1, 1), &CellStyle::new().bold(true), true)
            .unwrap();
        let before = ws.snapshot();

        let far_row = SheetSnapshot {
            row_style: BTreeMap::from([(5000, 1)]),
            ..before.clone()
        };
        assert!(matches!(
            ws.restore_styles(&far_row),
            Err(Error::LineOutOfBounds { axis: Axis::Row, index: 5000, count: 10 })
        ));

        let far_cell = SheetSnapshot {
            cell_styles: vec![StyleRunRecord { row: 500, column: 900, style: 1, run_length: None }],
            ..before.clone()
        };
        assert!(matches!(
            ws.restore_styles(&far_cell),
            Err(Error::LineOutOfBounds { .. })
        ));

        let long_run = SheetSnapshot {
            cell_styles: vec![StyleRunRecord { row: 8, column: 0, style: 1, run_length: Some(3) }],
            ..before.clone()
        };
        assert!(matches!(
            ws.restore_styles(&long_run),
            Err(Error::LineOutOfBounds { axis: Axis::Row, index: 10, count: 10 })
        ));

        let overflow = SheetSnapshot {
            cell_styles: vec![StyleRunRecord { row: u32::MAX, column: 0, style: 1, run_length: Some(2) }],
            ..before.clone()
        };
        assert!(matches!(ws.restore_styles(&overflow), Err(Error::InvalidRange(_))));

        assert_eq!(ws.snapshot(), before);
    }

    #[test]
    fn test_named_record_labels() {
        let sheets = ["Data", "My Sheet"];
        let qualified = NamedRange::range(
            "Totals",
            Area::from_indices(0, 0, 4, 1).on_sheet(1),
            NameScope::Workbook,
        );
        let record = NamedEntityRecord::from_named_range(&qualified, &sheets);
        assert_eq!(record.expression_or_area_label, "'My Sheet'!A1:B5");
        assert_eq!(record.scope, None);
        assert_eq!(record.to_named_range(&sheets), qualified);

        let local = NamedRange::expression("Rate", "0.07", NameScope::Sheet(0));
        let record = NamedEntityRecord::from_named_range(&local, &sheets);
        assert_eq!(record.expression_or_area_label, "0.07");
        assert_eq!(record.scope, Some(0));
        assert_eq!(record.to_named_range(&sheets), local);
    }
}
