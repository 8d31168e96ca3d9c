//! End-to-end tests for row/column insert and delete

use lattice_sheets::prelude::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn workbook(rows: u32, cols: u32) -> Workbook {
    Workbook::with_settings(WorkbookSettings {
        sheet_options: SheetOptions::sized(rows, cols),
    })
}

fn area(r0: u32, c0: u32, r1: u32, c1: u32) -> Area {
    Area::from_indices(r0, c0, r1, c1)
}

fn merge_after(edit: (Axis, u32, i32)) -> Option<Area> {
    let mut wb = workbook(20, 20);
    wb.worksheet_mut(0)
        .unwrap()
        .merge_cells(&area(2, 2, 3, 3))
        .unwrap();
    let (axis, before, count) = edit;
    wb.edit_lines(0, axis, before, count).unwrap();
    let region = wb.worksheet(0).unwrap().merged_regions().next().copied();
    region
}

/// Merge (2,2)-(3,3) against the four edits that pin its edges
#[test]
fn test_merge_round_trip_edges() {
    assert_eq!(merge_after((Axis::Row, 2, 1)), Some(area(2, 2, 4, 3)));
    assert_eq!(merge_after((Axis::Row, 5, 1)), Some(area(2, 2, 3, 3)));
    assert_eq!(merge_after((Axis::Row, 2, -2)), None);
    assert_eq!(merge_after((Axis::Row, 2, -1)), Some(area(2, 2, 2, 3)));
}

#[test]
fn test_merge_column_edits() {
    assert_eq!(merge_after((Axis::Column, 0, 2)), Some(area(2, 4, 3, 5)));
    assert_eq!(merge_after((Axis::Column, 3, 1)), Some(area(2, 2, 3, 4)));
    assert_eq!(merge_after((Axis::Column, 1, -2)), Some(area(2, 1, 3, 1)));
    assert_eq!(merge_after((Axis::Column, 0, -1)), Some(area(2, 1, 3, 2)));
}

/// A rejected insert must leave values, styles, regions and names exactly as they were
#[test]
fn test_array_split_rejection_changes_nothing() {
    let mut wb = workbook(20, 10);
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_array_region(&area(4, 1, 7, 2)).unwrap();
    sheet.merge_cells(&area(10, 0, 11, 1)).unwrap();
    sheet.set_cell_value("B6", 12.5).unwrap();
    sheet
        .set_style(StyleScope::Row(9), &CellStyle::new().fill(Color::GRAY), true)
        .unwrap();
    sheet
        .set_style(StyleScope::Cell(12, 4), &CellStyle::new().bold(true), true)
        .unwrap();
    sheet.set_row_height(15, 30.0).unwrap();
    wb.define_name(NamedRange::range("Tail", area(12, 0, 14, 3), NameScope::Sheet(0)))
        .unwrap();

    let before = wb.snapshot();
    let err = wb.insert_lines(0, Axis::Row, 6, 3).unwrap_err();
    assert!(matches!(err, Error::RejectedEdit { axis: Axis::Row, before: 6, .. }));

    assert_eq!(wb.snapshot(), before);
    let sheet = wb.worksheet(0).unwrap();
    assert_eq!(sheet.row_count(), 20);
    assert_eq!(sheet.get_value_at(5, 1), CellValue::Number(12.5));
    assert_eq!(sheet.array_region_at(4, 1), Some(&area(4, 1, 7, 2)));
    assert_eq!(sheet.merged_region_at(11, 1), Some(&area(10, 0, 11, 1)));
    assert_eq!(sheet.row_height(15), 30.0);
    assert_eq!(
        wb.get_named_range("Tail", 0).and_then(NamedRange::area),
        Some(&area(12, 0, 14, 3))
    );
}

#[test]
fn test_deletes_never_split_arrays() {
    let mut wb = workbook(20, 10);
    wb.worksheet_mut(0)
        .unwrap()
        .set_array_region(&area(4, 1, 7, 2))
        .unwrap();

    let report = wb.delete_lines(0, Axis::Row, 5, 2).unwrap();
    assert!(report.removed_arrays.is_empty());
    assert_eq!(
        wb.worksheet(0).unwrap().array_region_at(4, 1),
        Some(&area(4, 1, 5, 2))
    );
}

#[test]
fn test_values_and_styles_move_together() {
    let mut wb = workbook(20, 10);
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("C5", "moved").unwrap();
    sheet
        .set_style(StyleScope::Cell(4, 2), &CellStyle::new().italic(true), true)
        .unwrap();
    sheet
        .set_style(StyleScope::Column(2), &CellStyle::new().text_color(Color::BLUE), true)
        .unwrap();

    wb.insert_lines(0, Axis::Column, 1, 2).unwrap();

    let sheet = wb.worksheet_mut(0).unwrap();
    assert_eq!(sheet.col_count(), 12);
    assert_eq!(sheet.get_value("E5").unwrap(), CellValue::text("moved"));
    let style = sheet.effective_style(4, 4);
    assert_eq!(style.flag(StyleKey::Italic), Some(true));
    assert_eq!(style.color(StyleKey::TextColor), Some(Color::BLUE));
    assert_eq!(sheet.effective_style(4, 2), CellStyle::new());
}

#[test]
fn test_whole_column_names_ignore_column_edits() {
    let mut wb = workbook(20, 10);
    let whole = NamedRange::range("ColsBD", Area::parse("B:D").unwrap(), NameScope::Sheet(0));
    wb.define_name(whole).unwrap();

    wb.insert_lines(0, Axis::Row, 0, 5).unwrap();
    assert_eq!(
        wb.get_named_range("ColsBD", 0).and_then(NamedRange::area),
        Some(&Area::parse("B:D").unwrap())
    );

    wb.delete_lines(0, Axis::Column, 0, 1).unwrap();
    assert_eq!(
        wb.get_named_range("ColsBD", 0).and_then(NamedRange::area),
        Some(&Area::parse("A:C").unwrap())
    );
}

#[derive(Debug, Clone)]
enum Op {
    Insert(Axis, u32, u32),
    Delete(Axis, u32, u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let axis = prop_oneof![Just(Axis::Row), Just(Axis::Column)];
    (axis, 0u32..14, 1u32..4, any::<bool>()).prop_map(|(axis, at, n, insert)| {
        if insert {
            Op::Insert(axis, at, n)
        } else {
            Op::Delete(axis, at, n)
        }
    })
}

proptest! {
    /// After any sequence of edits, every head lies inside the sheet and the
    /// coverage counts each covered cell exactly once
    #[test]
    fn prop_heads_stay_consistent(ops in proptest::collection::vec(op_strategy(), 1..20)) {
        let mut wb = workbook(12, 12);
        {
            let sheet = wb.worksheet_mut(0).unwrap();
            sheet.merge_cells(&area(1, 1, 2, 3)).unwrap();
            sheet.merge_cells(&area(6, 6, 9, 7)).unwrap();
            sheet.set_array_region(&area(4, 0, 5, 1)).unwrap();
            sheet.set_style(StyleScope::Row(8), &CellStyle::new().bold(true), true).unwrap();
            sheet.set_style(StyleScope::Cell(10, 10), &CellStyle::new().italic(true), true).unwrap();
        }

        for op in ops {
            // Out-of-range and array-splitting edits are rejected without effect
            let _ = match op {
                Op::Insert(axis, at, n) => wb.insert_lines(0, axis, at, n),
                Op::Delete(axis, at, n) => wb.delete_lines(0, axis, at, n),
            };
        }

        let sheet = wb.worksheet(0).unwrap();
        let (rows, cols) = (sheet.row_count(), sheet.col_count());
        for heads in [sheet.merge_heads(), sheet.array_heads()] {
            let cells: u64 = heads.iter().map(|(_, a)| a.cell_count()).sum();
            prop_assert_eq!(heads.covered_cells() as u64, cells);
            for (_, a) in heads.iter() {
                prop_assert!(a.end.row < rows && a.end.col < cols);
            }
        }
        prop_assert!(sheet.styles().row_entries().keys().all(|&r| r < rows));
        prop_assert!(sheet.styles().cell_deltas().all(|(r, c, _)| r < rows && c < cols));
    }
}
