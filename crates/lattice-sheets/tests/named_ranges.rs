//! End-to-end tests for defined names across structural edits

use lattice_sheets::prelude::*;
use lattice_sheets::NameTarget;
use pretty_assertions::assert_eq;

fn workbook() -> Workbook {
    let mut wb = Workbook::with_settings(WorkbookSettings {
        sheet_options: SheetOptions::sized(50, 30),
    });
    wb.add_worksheet_with_name("Summary").unwrap();
    wb
}

fn area_of<'a>(wb: &'a Workbook, name: &str, sheet: usize) -> Option<&'a Area> {
    wb.get_named_range(name, sheet).and_then(NamedRange::area)
}

#[test]
fn test_block_grows_then_disappears() {
    let mut wb = workbook();
    wb.define_name(NamedRange::range(
        "Block",
        Area::from_indices(0, 0, 5, 5),
        NameScope::Sheet(0),
    ))
    .unwrap();

    wb.insert_lines(0, Axis::Column, 3, 2).unwrap();
    assert_eq!(area_of(&wb, "Block", 0), Some(&Area::from_indices(0, 0, 5, 7)));

    let report = wb.delete_lines(0, Axis::Column, 0, 7).unwrap();
    assert!(report.removed_names.is_empty());
    assert_eq!(area_of(&wb, "Block", 0), Some(&Area::from_indices(0, 0, 5, 0)));

    let report = wb.delete_lines(0, Axis::Column, 0, 1).unwrap();
    assert_eq!(report.removed_names.len(), 1);
    assert_eq!(report.removed_names[0].name, "Block");
    assert!(wb.named_ranges().is_empty());
}

#[test]
fn test_covering_delete_removes_name() {
    let mut wb = workbook();
    wb.define_name(NamedRange::range(
        "Block",
        Area::from_indices(0, 0, 5, 5),
        NameScope::Sheet(0),
    ))
    .unwrap();

    let report = wb.delete_lines(0, Axis::Column, 0, 7).unwrap();
    assert_eq!(report.removed_names.len(), 1);
    assert!(wb.get_named_range("Block", 0).is_none());
}

#[test]
fn test_sheet_scope_shadows_workbook_scope() {
    let mut wb = workbook();
    wb.define_name(NamedRange::range(
        "Input",
        Area::parse("A1:A10").unwrap().on_sheet(0),
        NameScope::Workbook,
    ))
    .unwrap();
    wb.define_name(NamedRange::range(
        "INPUT",
        Area::parse("B2:B4").unwrap(),
        NameScope::Sheet(1),
    ))
    .unwrap();

    assert_eq!(area_of(&wb, "input", 0), Some(&Area::parse("A1:A10").unwrap().on_sheet(0)));
    assert_eq!(area_of(&wb, "input", 1), Some(&Area::parse("B2:B4").unwrap()));

    // Only the name living on sheet 1 moves
    wb.insert_lines(1, Axis::Row, 0, 1).unwrap();
    assert_eq!(area_of(&wb, "input", 0), Some(&Area::parse("A1:A10").unwrap().on_sheet(0)));
    assert_eq!(area_of(&wb, "input", 1), Some(&Area::parse("B3:B5").unwrap()));
}

#[test]
fn test_expressions_are_not_patched() {
    let mut wb = workbook();
    wb.define_name(NamedRange::expression("Total", "=SUM(A1:A10)", NameScope::Workbook))
        .unwrap();

    wb.delete_lines(0, Axis::Row, 0, 20).unwrap();

    let total = wb.get_named_range("Total", 0).unwrap();
    assert_eq!(total.target, NameTarget::Expression("SUM(A1:A10)".into()));
}

#[test]
fn test_unresolved_range_is_skipped() {
    let mut wb = workbook();
    // A workbook name without a sheet cannot be tied to any edit
    wb.define_name(NamedRange::range(
        "Floating",
        Area::parse("C3:D4").unwrap(),
        NameScope::Workbook,
    ))
    .unwrap();

    let report = wb.delete_lines(0, Axis::Row, 0, 10).unwrap();
    assert!(report.removed_names.is_empty());
    assert_eq!(area_of(&wb, "Floating", 0), Some(&Area::parse("C3:D4").unwrap()));
}

#[test]
fn test_name_validation() {
    let mut wb = workbook();
    for bad in ["", "1st", "B12", "A1:B2", "my name", "trailing.", "a..b", "TRUE", "false"] {
        let range = NamedRange::expression(bad, "1", NameScope::Workbook);
        assert!(
            matches!(wb.define_name(range), Err(Error::InvalidName(_))),
            "{bad:?} should be rejected"
        );
    }
    for good in ["_hidden", "Tax.Rate", "Q1_2024", "résumé"] {
        wb.define_name(NamedRange::expression(good, "1", NameScope::Workbook))
            .unwrap();
    }

    let dup = NamedRange::expression("tax.rate", "2", NameScope::Workbook);
    assert!(matches!(wb.define_name(dup), Err(Error::DuplicateName(_))));
    let local = NamedRange::expression("tax.rate", "2", NameScope::Sheet(0));
    wb.define_name(local).unwrap();
}
