//! JSON edit scripts
//!
//! A script lists the sheets to create and the operations to run against
//! them, in order:
//!
//! ```json
//! {
//!   "sheets": [{ "name": "Data", "rows": 100, "cols": 10 }],
//!   "ops": [
//!     { "op": "style", "sheet": 0, "target": { "row": 0 }, "props": { "bold": true } },
//!     { "op": "merge", "sheet": 0, "range": "A1:C1" },
//!     { "op": "name", "name": "Header", "refers_to": "Data!A1:C1" },
//!     { "op": "insert", "sheet": 0, "axis": "row", "before": 0, "count": 2 }
//!   ]
//! }
//! ```

use anyhow::{anyhow, bail, Context, Result};
use lattice_sheets::prelude::*;
use lattice_sheets::{CellError, NamedEntityRecord, MAX_COLS, MAX_ROWS};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Sheets to create; a single default sheet when empty
    #[serde(default)]
    pub sheets: Vec<SheetSpec>,
    #[serde(default)]
    pub ops: Vec<Op>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetSpec {
    pub name: String,
    pub rows: Option<u32>,
    pub cols: Option<u32>,
}

/// Where a style operation writes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSpec {
    Sheet,
    Row(u32),
    Column(u32),
    Cell(String),
    Range(String),
}

/// Formatting properties with hex colors and point sizes
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleSpec {
    pub fill: Option<String>,
    pub text_color: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub number_format: Option<String>,
    pub horizontal: Option<HorizontalAlignment>,
    pub vertical: Option<VerticalAlignment>,
    pub wrap_text: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum RuleSpec {
    Expression {
        formula: String,
        range: String,
        style: StyleSpec,
    },
    CellMatch {
        criterion: String,
        range: String,
        style: StyleSpec,
    },
    DuplicateValues {
        range: String,
        style: StyleSpec,
    },
    Gradient {
        range: String,
        min_color: String,
        mid_color: Option<String>,
        max_color: String,
        min: Option<f64>,
        max: Option<f64>,
        #[serde(default)]
        text: bool,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Op {
    SetValue {
        sheet: usize,
        cell: String,
        value: Value,
    },
    Style {
        sheet: usize,
        target: TargetSpec,
        props: StyleSpec,
        #[serde(default = "default_merge")]
        merge: bool,
    },
    RowPattern {
        sheet: usize,
        styles: Vec<StyleSpec>,
    },
    Merge {
        sheet: usize,
        range: String,
    },
    Unmerge {
        sheet: usize,
        cell: String,
    },
    Array {
        sheet: usize,
        range: String,
    },
    Name {
        name: String,
        refers_to: String,
        scope: Option<usize>,
    },
    Insert {
        sheet: usize,
        axis: Axis,
        before: u32,
        count: u32,
    },
    Delete {
        sheet: usize,
        axis: Axis,
        first: u32,
        count: u32,
    },
    Rule {
        sheet: usize,
        rule: RuleSpec,
    },
    Result {
        sheet: usize,
        rule: usize,
        value: Value,
    },
    Apply {
        sheet: usize,
    },
}

fn default_merge() -> bool {
    true
}

impl Script {
    /// Parse a script from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid edit script")
    }

    /// Build the workbook and run every operation
    ///
    /// With `keep_going`, failing operations are logged and skipped instead
    /// of aborting the replay.
    pub fn replay(&self, keep_going: bool) -> Result<Workbook> {
        let mut wb = self.build_workbook()?;
        for (i, op) in self.ops.iter().enumerate() {
            match apply_op(&mut wb, op) {
                Ok(()) => debug!("op #{} applied", i),
                Err(err) if keep_going => warn!("op #{} skipped: {:#}", i, err),
                Err(err) => return Err(err.context(format!("op #{} failed", i))),
            }
        }
        info!("replayed {} operation(s)", self.ops.len());
        Ok(wb)
    }

    fn build_workbook(&self) -> Result<Workbook> {
        if self.sheets.is_empty() {
            return Ok(Workbook::new());
        }
        let mut wb = Workbook::empty();
        for spec in &self.sheets {
            let defaults = SheetOptions::default();
            let rows = spec.rows.unwrap_or(defaults.rows);
            let cols = spec.cols.unwrap_or(defaults.cols);
            if rows > MAX_ROWS || cols > MAX_COLS {
                bail!("sheet '{}' is larger than {}x{}", spec.name, MAX_ROWS, MAX_COLS);
            }
            let sheet = Worksheet::with_options(&spec.name, SheetOptions::sized(rows, cols));
            wb.add_existing_worksheet(sheet)
                .with_context(|| format!("Cannot add sheet '{}'", spec.name))?;
        }
        Ok(wb)
    }
}

fn sheet_mut(wb: &mut Workbook, index: usize) -> Result<&mut Worksheet> {
    let count = wb.sheet_count();
    wb.worksheet_mut(index)
        .ok_or_else(|| anyhow!("sheet {} does not exist ({} sheet(s))", index, count))
}

fn apply_op(wb: &mut Workbook, op: &Op) -> Result<()> {
    match op {
        Op::SetValue { sheet, cell, value } => {
            let value = json_to_value(value)?;
            sheet_mut(wb, *sheet)?.set_cell_value(cell, value)?;
        }
        Op::Style {
            sheet,
            target,
            props,
            merge,
        } => {
            let scope = match target {
                TargetSpec::Sheet => StyleScope::Sheet,
                TargetSpec::Row(row) => StyleScope::Row(*row),
                TargetSpec::Column(col) => StyleScope::Column(*col),
                TargetSpec::Cell(cell) => {
                    let addr = CellAddress::parse(cell)?;
                    StyleScope::Cell(addr.row, addr.col)
                }
                TargetSpec::Range(range) => StyleScope::Area(Area::parse(range)?),
            };
            let props = props.to_style()?;
            sheet_mut(wb, *sheet)?.set_style(scope, &props, *merge)?;
        }
        Op::RowPattern { sheet, styles } => {
            let styles = styles
                .iter()
                .map(StyleSpec::to_style)
                .collect::<Result<Vec<_>>>()?;
            sheet_mut(wb, *sheet)?.set_row_pattern(styles);
        }
        Op::Merge { sheet, range } => {
            sheet_mut(wb, *sheet)?.merge_cells(&Area::parse(range)?)?;
        }
        Op::Unmerge { sheet, cell } => {
            let addr = CellAddress::parse(cell)?;
            if sheet_mut(wb, *sheet)?.unmerge_cells(addr.row, addr.col).is_none() {
                warn!("{} is not part of a merged region", cell);
            }
        }
        Op::Array { sheet, range } => {
            sheet_mut(wb, *sheet)?.set_array_region(&Area::parse(range)?)?;
        }
        Op::Name {
            name,
            refers_to,
            scope,
        } => {
            let record = NamedEntityRecord {
                name: name.clone(),
                expression_or_area_label: refers_to.clone(),
                scope: *scope,
            };
            let names = wb.sheet_names();
            let range = record.to_named_range(&names);
            wb.define_name(range)?;
        }
        Op::Insert {
            sheet,
            axis,
            before,
            count,
        } => {
            let report = wb.insert_lines(*sheet, *axis, *before, *count)?;
            log_report(&report);
        }
        Op::Delete {
            sheet,
            axis,
            first,
            count,
        } => {
            let report = wb.delete_lines(*sheet, *axis, *first, *count)?;
            log_report(&report);
        }
        Op::Rule { sheet, rule } => {
            let rule = rule.to_rule()?;
            sheet_mut(wb, *sheet)?.add_conditional_format(rule)?;
        }
        Op::Result { sheet, rule, value } => {
            let result = json_to_result(value)?;
            sheet_mut(wb, *sheet)?.set_rule_result(*rule, result)?;
        }
        Op::Apply { sheet } => {
            if !sheet_mut(wb, *sheet)?.apply_conditional_formats() {
                debug!("conditional formats on sheet {} already current", sheet);
            }
        }
    }
    Ok(())
}

fn log_report(report: &EditReport) {
    for area in &report.removed_merges {
        info!("merge {} removed", area);
    }
    for area in &report.removed_arrays {
        info!("array {} removed", area);
    }
    for rule in &report.removed_rules {
        info!("conditional format on {} removed", rule.target);
    }
    for name in &report.removed_names {
        info!("name {} removed", name.name);
    }
}

fn parse_color(hex: &str) -> Result<Color> {
    Color::from_hex(hex).ok_or_else(|| anyhow!("invalid color '{}'", hex))
}

impl StyleSpec {
    fn to_style(&self) -> Result<CellStyle> {
        let mut style = CellStyle::new();
        if let Some(fill) = &self.fill {
            style = style.fill(parse_color(fill)?);
        }
        if let Some(color) = &self.text_color {
            style = style.text_color(parse_color(color)?);
        }
        if let Some(bold) = self.bold {
            style = style.bold(bold);
        }
        if let Some(italic) = self.italic {
            style = style.italic(italic);
        }
        if let Some(underline) = self.underline {
            style = style.underline(underline);
        }
        if let Some(strike) = self.strikethrough {
            style = style.strikethrough(strike);
        }
        if let Some(name) = &self.font_name {
            style = style.font_name(name.as_str());
        }
        if let Some(size) = self.font_size {
            if !(size > 0.0 && size.is_finite()) {
                bail!("invalid font size {}", size);
            }
            style = style.font_size(size);
        }
        if let Some(format) = &self.number_format {
            style = style.number_format(format.as_str());
        }
        if let Some(h) = self.horizontal {
            style = style.horizontal_alignment(h);
        }
        if let Some(v) = self.vertical {
            style = style.vertical_alignment(v);
        }
        if let Some(wrap) = self.wrap_text {
            style = style.wrap_text(wrap);
        }
        Ok(style)
    }
}

impl RuleSpec {
    fn to_rule(&self) -> Result<ConditionalRule> {
        let rule = match self {
            RuleSpec::Expression {
                formula,
                range,
                style,
            } => ConditionalRule::expression(formula.as_str())
                .with_target(Area::parse(range)?)
                .with_style(style.to_style()?),
            RuleSpec::CellMatch {
                criterion,
                range,
                style,
            } => ConditionalRule::cell_match(criterion.as_str())
                .with_target(Area::parse(range)?)
                .with_style(style.to_style()?),
            RuleSpec::DuplicateValues { range, style } => ConditionalRule::duplicate_values()
                .with_target(Area::parse(range)?)
                .with_style(style.to_style()?),
            RuleSpec::Gradient {
                range,
                min_color,
                mid_color,
                max_color,
                min,
                max,
                text,
            } => {
                let lo = parse_color(min_color)?;
                let hi = parse_color(max_color)?;
                let mut spec = match mid_color {
                    Some(mid) => GradientSpec::three_color(lo, parse_color(mid)?, hi),
                    None => GradientSpec::two_color(lo, hi),
                };
                spec.min = *min;
                spec.max = *max;
                if *text {
                    spec = spec.with_target(GradientTarget::Text);
                }
                ConditionalRule::gradient(spec).with_target(Area::parse(range)?)
            }
        };
        Ok(rule)
    }
}

fn json_to_value(value: &Value) -> Result<CellValue> {
    Ok(match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Boolean(*b),
        Value::Number(n) => CellValue::Number(
            n.as_f64()
                .ok_or_else(|| anyhow!("number {} is out of range", n))?,
        ),
        Value::String(s) => match CellError::from_code(s) {
            Some(err) => CellValue::Error(err),
            None => CellValue::text(s.as_str()),
        },
        Value::Array(_) | Value::Object(_) => bail!("expected a scalar value, got {}", value),
    })
}

/// A nested array becomes a per-cell result, anything else one shared value
fn json_to_result(value: &Value) -> Result<RuleResult> {
    match value {
        Value::Array(rows) => {
            let rows = rows
                .iter()
                .map(|row| match row {
                    Value::Array(cells) => cells.iter().map(json_to_value).collect(),
                    other => bail!("expected a row array, got {}", other),
                })
                .collect::<Result<Vec<Vec<CellValue>>>>()?;
            Ok(RuleResult::Array(rows))
        }
        other => Ok(RuleResult::Scalar(json_to_value(other)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCRIPT: &str = r##"{
        "sheets": [
            { "name": "Data", "rows": 40, "cols": 8 },
            { "name": "Notes" }
        ],
        "ops": [
            { "op": "style", "sheet": 0, "target": { "column": 1 }, "props": { "fill": "#FF0000" } },
            { "op": "style", "sheet": 0, "target": { "cell": "B3" }, "props": { "bold": true } },
            { "op": "merge", "sheet": 0, "range": "C3:D4" },
            { "op": "array", "sheet": 0, "range": "F2:F6" },
            { "op": "name", "name": "Block", "refers_to": "Data!C3:D4" },
            { "op": "rule", "sheet": 0, "rule": { "kind": "expression", "formula": "B1>0", "range": "B1:B2", "style": { "italic": true } } },
            { "op": "result", "sheet": 0, "rule": 0, "value": [[true], [false]] },
            { "op": "apply", "sheet": 0 },
            { "op": "insert", "sheet": 0, "axis": "row", "before": 0, "count": 2 }
        ]
    }"##;

    #[test]
    fn test_replay_script() {
        let script = Script::from_json(SCRIPT).unwrap();
        let mut wb = script.replay(false).unwrap();

        assert_eq!(wb.sheet_count(), 2);
        assert_eq!(wb.worksheet(1).unwrap().row_count(), 1_000);
        assert_eq!(
            wb.get_named_range("block", 0).and_then(NamedRange::area),
            Some(&Area::parse("C5:D6").unwrap().on_sheet(0))
        );

        let sheet = wb.worksheet_mut(0).unwrap();
        assert_eq!(sheet.row_count(), 42);
        assert_eq!(sheet.array_region_at(4, 5), Some(&Area::parse("F4:F8").unwrap()));
        let style = sheet.effective_style(4, 1);
        assert_eq!(style.flag(StyleKey::Bold), Some(true));
        assert_eq!(style.color(StyleKey::Fill), Some(Color::RED));
    }

    #[test]
    fn test_failing_op_stops_replay() {
        let script = Script::from_json(
            r#"{ "ops": [
                { "op": "array", "sheet": 0, "range": "A2:A5" },
                { "op": "insert", "sheet": 0, "axis": "row", "before": 3, "count": 1 }
            ] }"#,
        )
        .unwrap();

        let err = script.replay(false).unwrap_err();
        assert!(format!("{:#}", err).contains("op #1 failed"));

        let wb = script.replay(true).unwrap();
        assert_eq!(wb.worksheet(0).unwrap().row_count(), 1_000);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let script = Script::from_json(
            r#"{ "ops": [
                { "op": "style", "sheet": 0, "target": { "cell": "A1" }, "props": { "bold": true } },
                { "op": "name", "name": "Rate", "refers_to": "Sheet1!$B$1", "scope": 0 }
            ] }"#,
        )
        .unwrap();
        let wb = script.replay(false).unwrap();
        let json = serde_json::to_value(wb.snapshot()).unwrap();

        assert_eq!(
            json["sheets"][0]["cell_styles"][0],
            serde_json::json!({ "row": 0, "column": 0, "ref": 1 })
        );
        assert_eq!(json["named"][0]["name"], "Rate");
        assert_eq!(json["named"][0]["scope"], 0);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(Script::from_json(r#"{ "ops": [{ "op": "apply", "sheet": 0, "extra": 1 }] }"#).is_err());
        assert!(Script::from_json(r#"{ "ops": [{ "op": "explode" }] }"#).is_err());
    }

    #[test]
    fn test_json_results() {
        assert_eq!(
            json_to_result(&serde_json::json!([[1, "x"], [null, false]])).unwrap(),
            RuleResult::Array(vec![
                vec![CellValue::Number(1.0), CellValue::text("x")],
                vec![CellValue::Empty, CellValue::Boolean(false)],
            ])
        );
        assert_eq!(
            json_to_result(&serde_json::json!(true)).unwrap(),
            RuleResult::Scalar(CellValue::Boolean(true))
        );
        assert_eq!(
            json_to_value(&serde_json::json!("#REF!")).unwrap(),
            CellValue::Error(CellError::Ref)
        );
        assert!(json_to_result(&serde_json::json!([1, 2])).is_err());
    }
}
