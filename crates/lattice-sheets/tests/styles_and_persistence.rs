//! End-to-end tests for the style cascade and the persisted snapshot

use lattice_sheets::prelude::*;
use lattice_sheets::{StyleInterner, StyleRunRecord};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn sheet() -> Worksheet {
    Worksheet::with_options("Styles", SheetOptions::sized(30, 12))
}

#[test]
fn test_priority_compensation() {
    let mut ws = sheet();
    ws.set_style(StyleScope::Column(3), &CellStyle::new().fill(Color::RED), true)
        .unwrap();
    ws.set_style(StyleScope::Row(6), &CellStyle::new().fill(Color::BLUE), true)
        .unwrap();

    assert_eq!(ws.effective_style(6, 3).color(StyleKey::Fill), Some(Color::BLUE));
    assert_eq!(ws.effective_style(7, 3).color(StyleKey::Fill), Some(Color::RED));
    assert_eq!(ws.effective_style(6, 4).color(StyleKey::Fill), Some(Color::BLUE));
}

#[test]
fn test_reverse_override_prunes_deltas() {
    let mut ws = sheet();
    let bold = CellStyle::new().bold(true);
    for col in 0..4 {
        ws.set_style(StyleScope::Cell(2, col), &bold.clone().italic(true), true)
            .unwrap();
    }
    ws.set_style(StyleScope::Sheet, &bold, true).unwrap();

    for col in 0..4 {
        assert_eq!(
            ws.styles().cell_delta(2, col),
            Some(&CellStyle::new().italic(true))
        );
        assert_eq!(ws.effective_style(2, col), bold.clone().italic(true));
    }
}

#[test]
fn test_deltas_are_minimal() {
    let mut ws = sheet();
    ws.set_style(StyleScope::Row(1), &CellStyle::new().bold(true).font_size(11.0), true)
        .unwrap();
    ws.set_style(
        StyleScope::Cell(1, 1),
        &CellStyle::new().bold(true).fill(Color::GREEN),
        true,
    )
    .unwrap();
    assert_eq!(
        ws.styles().cell_delta(1, 1),
        Some(&CellStyle::new().fill(Color::GREEN))
    );

    // Writing what the cell already inherits stores nothing
    ws.set_style(StyleScope::Cell(1, 5), &CellStyle::new().font_size(11.0), true)
        .unwrap();
    assert_eq!(ws.styles().cell_delta(1, 5), None);
}

#[test]
fn test_banding_under_row_entries() {
    let mut ws = sheet();
    ws.set_row_pattern(vec![
        CellStyle::new(),
        CellStyle::new().fill(Color::GRAY),
    ]);
    ws.set_style(StyleScope::Row(3), &CellStyle::new().fill(Color::YELLOW), true)
        .unwrap();

    assert_eq!(ws.effective_style(0, 0).color(StyleKey::Fill), None);
    assert_eq!(ws.effective_style(1, 0).color(StyleKey::Fill), Some(Color::GRAY));
    assert_eq!(ws.effective_style(3, 0).color(StyleKey::Fill), Some(Color::YELLOW));
    assert_eq!(ws.effective_style(5, 0).color(StyleKey::Fill), Some(Color::GRAY));

    ws.set_row_pattern(Vec::new());
    assert_eq!(ws.effective_style(5, 0).color(StyleKey::Fill), None);
}

#[test]
fn test_snapshot_runs_and_table() {
    let mut wb = Workbook::with_settings(WorkbookSettings {
        sheet_options: SheetOptions::sized(30, 12),
    });
    let sheet = wb.worksheet_mut(0).unwrap();
    let header = CellStyle::new().bold(true).fill(Color::rgb(221, 235, 247));
    for col in 0..3 {
        sheet.set_style(StyleScope::Cell(0, col), &header, true).unwrap();
    }
    sheet
        .set_style(StyleScope::Area(Area::parse("B2:B5").unwrap()), &CellStyle::new().number_format("0.00"), true)
        .unwrap();

    let snapshot = wb.snapshot();
    let sheet = &snapshot.sheets[0];
    assert_eq!(sheet.styles, vec![header.clone(), CellStyle::new().number_format("0.00")]);
    assert_eq!(
        sheet.cell_styles,
        vec![
            StyleRunRecord { row: 0, column: 0, style: 1, run_length: None },
            StyleRunRecord { row: 0, column: 1, style: 1, run_length: None },
            StyleRunRecord { row: 1, column: 1, style: 2, run_length: Some(4) },
            StyleRunRecord { row: 0, column: 2, style: 1, run_length: None },
        ]
    );

    let restored = Workbook::from_snapshot(&snapshot).unwrap();
    assert_eq!(restored.snapshot(), snapshot);
}

fn style_strategy() -> impl Strategy<Value = CellStyle> {
    (
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
        proptest::option::of(0u8..4),
        proptest::option::of(prop_oneof![Just("Arial"), Just("Calibri")]),
    )
        .prop_map(|(bold, italic, fill, font)| {
            let mut style = CellStyle::new();
            if let Some(b) = bold {
                style = style.bold(b);
            }
            if let Some(i) = italic {
                style = style.italic(i);
            }
            if let Some(f) = fill {
                style = style.fill(Color::rgb(f * 60, 0, 0));
            }
            if let Some(name) = font {
                style = style.font_name(name);
            }
            style
        })
}

proptest! {
    /// Equal styles share an index and distinct styles never do
    #[test]
    fn prop_interning_is_unique(styles in proptest::collection::vec(style_strategy(), 1..30)) {
        let mut interner = StyleInterner::new();
        let indices: Vec<u32> = styles.iter().map(|s| interner.get_style_index(s)).collect();

        for (i, a) in styles.iter().enumerate() {
            for (j, b) in styles.iter().enumerate() {
                prop_assert_eq!(a == b, indices[i] == indices[j]);
            }
            prop_assert_eq!(interner.get(indices[i]), Some(a));
        }
        prop_assert_eq!(interner.get_style_index(&CellStyle::new()), 0);
    }

    /// Resolving the same cell twice, cached or not, gives the same style
    #[test]
    fn prop_resolution_is_deterministic(
        writes in proptest::collection::vec((0u32..6, 0u32..6, style_strategy()), 1..12),
        probe in (0u32..6, 0u32..6),
    ) {
        let mut ws = sheet();
        for (row, col, style) in &writes {
            ws.set_style(StyleScope::Cell(*row, *col), style, true).unwrap();
        }
        let cached_first = ws.effective_style(probe.0, probe.1);
        let cached_second = ws.effective_style(probe.0, probe.1);
        let uncached = ws.styles().compose(probe.0, probe.1, &[]);
        prop_assert_eq!(&cached_first, &cached_second);
        prop_assert_eq!(cached_first, uncached);
    }
}
