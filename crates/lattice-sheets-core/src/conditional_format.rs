//! Conditional formatting
//!
//! Rules are evaluated elsewhere; this module only turns their results into
//! a per-cell overlay of styles. Each rule carries its last result and an
//! `updated` flag. [`ConditionalFormats::apply_all`] rebuilds the overlay
//! when some rule was updated or a flush was requested, and otherwise does
//! nothing.
//!
//! ## Example
//!
//! ```rust
//! use lattice_sheets_core::cell::{Area, CellValue};
//! use lattice_sheets_core::conditional_format::{ConditionalFormats, ConditionalRule, RuleResult};
//! use lattice_sheets_core::style::{CellStyle, Color};
//!
//! let mut formats = ConditionalFormats::new();
//! let rule = ConditionalRule::expression("A1>100")
//!     .with_target(Area::parse("A1:A10").unwrap())
//!     .with_style(CellStyle::new().fill(Color::rgb(255, 199, 206)));
//! let index = formats.add(rule);
//!
//! formats.set_rule_result(index, RuleResult::Scalar(CellValue::Boolean(true))).unwrap();
//! assert!(formats.apply_all(100, 10).is_some());
//! assert_eq!(formats.overlay_at(3, 0).len(), 1);
//!
//! // Nothing changed since
//! assert!(formats.apply_all(100, 10).is_none());
//! ```

use ahash::AHashMap;
use log::{debug, warn};

use crate::cell::{Area, CellValue};
use crate::error::{Error, Result};
use crate::patch::{patch_area, AreaPatch, Axis, LineEdit};
use crate::style::{CellStyle, Color, StyleKey, StyleValue};

/// What a rule tests
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RuleKind {
    /// Formula evaluated per cell
    Expression(String),
    /// Cell value compared against a criterion
    CellMatch(String),
    /// Cells whose value appears more than once in the target
    DuplicateValues,
    /// Color scale over numeric values
    Gradient(GradientSpec),
}

/// Which property a color scale writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GradientTarget {
    /// Cell background
    #[default]
    Fill,
    /// Text color
    Text,
}

impl GradientTarget {
    fn key(self) -> StyleKey {
        match self {
            GradientTarget::Fill => StyleKey::Fill,
            GradientTarget::Text => StyleKey::TextColor,
        }
    }
}

/// Color stops of a scale
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GradientStops {
    /// Minimum and maximum colors
    Two(Color, Color),
    /// Minimum, midpoint and maximum colors
    Three(Color, Color, Color),
}

/// Color scale configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradientSpec {
    /// Colors to interpolate between
    pub stops: GradientStops,
    /// Explicit lower bound; the smallest observed value otherwise
    #[cfg_attr(feature = "serde", serde(default))]
    pub min: Option<f64>,
    /// Explicit upper bound; the largest observed value otherwise
    #[cfg_attr(feature = "serde", serde(default))]
    pub max: Option<f64>,
    /// Property receiving the color
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: GradientTarget,
}

impl GradientSpec {
    /// Two-color scale with observed bounds
    pub fn two_color(min: Color, max: Color) -> Self {
        Self {
            stops: GradientStops::Two(min, max),
            min: None,
            max: None,
            target: GradientTarget::Fill,
        }
    }

    /// Three-color scale with observed bounds
    pub fn three_color(min: Color, mid: Color, max: Color) -> Self {
        Self {
            stops: GradientStops::Three(min, mid, max),
            ..Self::two_color(min, max)
        }
    }

    /// Use explicit bounds
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Write the color into `target`
    pub fn with_target(mut self, target: GradientTarget) -> Self {
        self.target = target;
        self
    }

    /// Color for `value` given the resolved bounds
    pub fn color_for(&self, value: f64, min: f64, max: f64) -> Color {
        let t = if max > min { (value - min) / (max - min) } else { 0.0 };
        let t = t.clamp(0.0, 1.0);
        match self.stops {
            GradientStops::Two(lo, hi) => Color::lerp(lo, hi, t),
            GradientStops::Three(lo, mid, _) if t <= 0.5 => Color::lerp(lo, mid, t * 2.0),
            GradientStops::Three(_, mid, hi) => Color::lerp(mid, hi, (t - 0.5) * 2.0),
        }
    }
}

/// A result handed over by the evaluator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RuleResult {
    /// One value for every target cell
    Scalar(CellValue),
    /// One value per target cell, row-major, shaped like the target
    Array(Vec<Vec<CellValue>>),
}

impl RuleResult {
    fn value_at(&self, row_offset: u32, col_offset: u32) -> Option<&CellValue> {
        match self {
            RuleResult::Scalar(value) => Some(value),
            RuleResult::Array(rows) => rows
                .get(row_offset as usize)
                .and_then(|r| r.get(col_offset as usize)),
        }
    }

    fn shape(&self) -> Option<(usize, usize)> {
        match self {
            RuleResult::Scalar(_) => None,
            RuleResult::Array(rows) => Some((rows.len(), rows.first().map_or(0, Vec::len))),
        }
    }

    fn is_rectangular(&self) -> bool {
        match self {
            RuleResult::Scalar(_) => true,
            RuleResult::Array(rows) => rows.windows(2).all(|w| w[0].len() == w[1].len()),
        }
    }

    fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        let values: Box<dyn Iterator<Item = &CellValue> + '_> = match self {
            RuleResult::Scalar(value) => Box::new(std::iter::once(value)),
            RuleResult::Array(rows) => Box::new(rows.iter().flatten()),
        };
        values.filter_map(CellValue::as_number).filter(|n| n.is_finite())
    }
}

/// Where a rule is in its evaluation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuleState {
    /// No result yet
    #[default]
    Clean,
    /// A fresh result is waiting to be applied
    Evaluated,
    /// The current result is reflected in the overlay
    Applied,
}

/// A conditional formatting rule
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalRule {
    /// What the rule tests
    pub kind: RuleKind,
    /// Cells the rule covers
    pub target: Area,
    /// Style pushed onto matching cells (unused by gradients)
    pub style: CellStyle,
    /// Last result from the evaluator
    pub result: Option<RuleResult>,
    /// Result changed since the last apply
    pub updated: bool,
    /// Evaluation cycle state
    pub state: RuleState,
}

impl ConditionalRule {
    /// Create a rule of the given kind covering A1
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            target: Area::from_indices(0, 0, 0, 0),
            style: CellStyle::new(),
            result: None,
            updated: false,
            state: RuleState::Clean,
        }
    }

    /// Formula rule
    pub fn expression(formula: impl Into<String>) -> Self {
        Self::new(RuleKind::Expression(formula.into()))
    }

    /// Criterion rule
    pub fn cell_match(criterion: impl Into<String>) -> Self {
        Self::new(RuleKind::CellMatch(criterion.into()))
    }

    /// Duplicate values rule
    pub fn duplicate_values() -> Self {
        Self::new(RuleKind::DuplicateValues)
    }

    /// Color scale rule
    pub fn gradient(spec: GradientSpec) -> Self {
        Self::new(RuleKind::Gradient(spec))
    }

    /// Set the covered cells
    pub fn with_target(mut self, target: Area) -> Self {
        self.target = target;
        self
    }

    /// Set the style applied to matching cells
    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = style;
        self
    }

    /// Check whether a cell is covered by the rule
    pub fn applies_to(&self, row: u32, col: u32) -> bool {
        self.target.contains(row, col)
    }

    /// Per-cell styles this rule contributes over the clamped `area`
    fn contributions(&self, index: usize, area: &Area) -> Result<Vec<(u32, u32, CellStyle)>> {
        let Some(result) = &self.result else {
            return Ok(Vec::new());
        };

        let expected = (area.row_count() as usize, area.col_count() as usize);
        if let Some(actual) = result.shape() {
            if actual != expected || !result.is_rectangular() {
                return Err(Error::MalformedResult {
                    rule: index,
                    expected: format!("{}x{}", expected.0, expected.1),
                    actual: format!("{}x{}", actual.0, actual.1),
                });
            }
        }

        let mut cells = Vec::new();
        match &self.kind {
            RuleKind::Expression(_) | RuleKind::CellMatch(_) | RuleKind::DuplicateValues => {
                for addr in area.cells() {
                    let value = result.value_at(addr.row - area.start.row, addr.col - area.start.col);
                    if value.is_some_and(CellValue::is_truthy) {
                        cells.push((addr.row, addr.col, self.style.clone()));
                    }
                }
            }
            RuleKind::Gradient(spec) => {
                let (observed_min, observed_max) = result
                    .numbers()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), n| {
                        (lo.min(n), hi.max(n))
                    });
                let min = spec.min.unwrap_or(observed_min);
                let max = spec.max.unwrap_or(observed_max);
                for addr in area.cells() {
                    let value = result
                        .value_at(addr.row - area.start.row, addr.col - area.start.col)
                        .and_then(CellValue::as_number)
                        .filter(|n| n.is_finite());
                    if let Some(n) = value {
                        let color = spec.color_for(n, min, max);
                        let style = CellStyle::new().with(spec.target.key(), StyleValue::Color(color));
                        cells.push((addr.row, addr.col, style));
                    }
                }
            }
        }
        Ok(cells)
    }
}

/// The conditional formats of one sheet and their overlay cache
#[derive(Debug, Clone, Default)]
pub struct ConditionalFormats {
    rules: Vec<ConditionalRule>,
    flush: bool,
    overlay: AHashMap<(u32, u32), Vec<CellStyle>>,
    /// Areas written by the last pass
    touched: Vec<Area>,
    /// Areas whose resolved styles must be dropped after the last pass
    invalidation: Vec<Area>,
}

impl ConditionalFormats {
    /// Create an empty rule list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule, returning its index; later rules win
    pub fn add(&mut self, rule: ConditionalRule) -> usize {
        self.rules.push(rule);
        self.flush = true;
        self.rules.len() - 1
    }

    /// Remove a rule
    pub fn remove(&mut self, index: usize) -> Option<ConditionalRule> {
        if index >= self.rules.len() {
            return None;
        }
        self.flush = true;
        Some(self.rules.remove(index))
    }

    /// All rules in priority order
    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    /// A rule by index
    pub fn get(&self, index: usize) -> Option<&ConditionalRule> {
        self.rules.get(index)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Store an evaluator result for a rule
    pub fn set_rule_result(&mut self, index: usize, result: RuleResult) -> Result<()> {
        let count = self.rules.len();
        let rule = self.rules.get_mut(index).ok_or_else(|| {
            Error::other(format!(
                "no conditional format rule at index {} ({} rules)",
                index, count
            ))
        })?;
        rule.result = Some(result);
        rule.updated = true;
        rule.state = RuleState::Evaluated;
        Ok(())
    }

    /// Force the next [`apply_all`](Self::apply_all) to rebuild the overlay
    pub fn request_flush(&mut self) {
        self.flush = true;
    }

    /// Whether the next apply would do any work
    pub fn needs_apply(&self) -> bool {
        self.flush || self.rules.iter().any(|r| r.updated)
    }

    /// Overlay styles for a cell, in priority order
    pub fn overlay_at(&self, row: u32, col: u32) -> &[CellStyle] {
        self.overlay.get(&(row, col)).map_or(&[], Vec::as_slice)
    }

    /// Areas to invalidate after the last pass
    pub fn invalidation(&self) -> &[Area] {
        &self.invalidation
    }

    /// Rebuild the overlay for a sheet of `rows` x `cols`
    ///
    /// Returns `None` when nothing changed since the last pass; otherwise the
    /// areas whose resolved styles are stale, covering both this pass and
    /// the previous one.
    pub fn apply_all(&mut self, rows: u32, cols: u32) -> Option<&[Area]> {
        if !self.needs_apply() {
            return None;
        }
        self.flush = false;

        let mut overlay: AHashMap<(u32, u32), Vec<CellStyle>> = AHashMap::new();
        let mut touched = Vec::new();

        for (index, rule) in self.rules.iter_mut().enumerate() {
            rule.updated = false;
            let Some(area) = rule.target.normalize(rows, cols) else {
                continue;
            };
            if rule.result.is_none() {
                continue;
            }
            match rule.contributions(index, &area) {
                Ok(cells) => {
                    for (row, col, style) in cells {
                        overlay.entry((row, col)).or_default().push(style);
                    }
                    touched.push(area);
                    rule.state = RuleState::Applied;
                }
                Err(err) => warn!("skipping conditional format: {}", err),
            }
        }

        let mut invalidation = std::mem::replace(&mut self.touched, touched.clone());
        for area in touched {
            if !invalidation.contains(&area) {
                invalidation.push(area);
            }
        }
        debug!(
            "conditional formats applied: {} cells styled, {} areas invalidated",
            overlay.len(),
            invalidation.len()
        );

        self.overlay = overlay;
        self.invalidation = invalidation;
        Some(&self.invalidation)
    }

    /// Patch rule targets and cached overlay for a structural edit
    ///
    /// Rules whose target is consumed are removed and returned. A rule whose
    /// target changes shape loses its stale result. A flush is requested.
    pub fn apply_edit(&mut self, edit: &LineEdit) -> Vec<ConditionalRule> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.rules.len());
        for mut rule in self.rules.drain(..) {
            match patch_area(&rule.target, edit) {
                AreaPatch::Unchanged => kept.push(rule),
                AreaPatch::Moved(target) => {
                    let resized = target.row_count() != rule.target.row_count()
                        || target.col_count() != rule.target.col_count();
                    rule.target = target;
                    if resized && matches!(rule.result, Some(RuleResult::Array(_))) {
                        rule.result = None;
                        rule.state = RuleState::Clean;
                    }
                    kept.push(rule);
                }
                AreaPatch::Removed => removed.push(rule),
            }
        }
        self.rules = kept;

        let overlay = std::mem::take(&mut self.overlay);
        self.overlay = overlay
            .into_iter()
            .filter_map(|((row, col), styles)| {
                let (row, col) = match edit.axis {
                    Axis::Row => (edit.map_line(row)?, col),
                    Axis::Column => (row, edit.map_line(col)?),
                };
                Some(((row, col), styles))
            })
            .collect();
        self.touched = self
            .touched
            .iter()
            .filter_map(|area| match patch_area(area, edit) {
                AreaPatch::Unchanged => Some(*area),
                AreaPatch::Moved(moved) => Some(moved),
                AreaPatch::Removed => None,
            })
            .collect();

        self.flush = true;
        removed
    }
}
