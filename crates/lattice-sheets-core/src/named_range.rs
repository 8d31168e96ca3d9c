//! Named range definitions
//!
//! Named ranges give a meaningful name to a range of cells or to an
//! expression. Names are case-insensitive and either workbook-wide or
//! scoped to one sheet; lookups try the sheet scope first.
//!
//! Ranges follow structural edits on their sheet through the same span
//! patching as merged cells. A name is only dropped when an edit deletes
//! every line of its range.
//!
//! # Example
//!
//! ```rust
//! use lattice_sheets_core::cell::Area;
//! use lattice_sheets_core::named_range::{NameScope, NamedRange, NamedRangeCollection};
//! use lattice_sheets_core::patch::{Axis, LineEdit};
//!
//! let mut names = NamedRangeCollection::new();
//! names
//!     .define(NamedRange::range("Sales", Area::parse("B2:B10").unwrap(), NameScope::Sheet(0)))
//!     .unwrap();
//!
//! names.patch_for_edit(0, &LineEdit::insert(Axis::Row, 0, 1));
//! assert_eq!(names.get("sales", 0).unwrap().label(), "B3:B11");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};

use crate::cell::{Area, CellAddress};
use crate::error::{Error, Result};
use crate::patch::{patch_area, AreaPatch, LineEdit};

/// Scope of a named range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NameScope {
    /// Available throughout the workbook (global)
    Workbook,
    /// Scoped to a specific sheet (local)
    Sheet(usize),
}

impl NameScope {
    /// The sheet index of a local scope
    pub fn sheet(&self) -> Option<usize> {
        match self {
            NameScope::Workbook => None,
            NameScope::Sheet(idx) => Some(*idx),
        }
    }
}

/// What a name refers to
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NameTarget {
    /// A rectangular range
    Range(Area),
    /// An expression kept as text; structural edits leave it alone
    Expression(String),
}

/// A named range definition
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    /// The name as written by the user
    pub name: String,
    /// Scope of this name (workbook-wide or sheet-specific)
    pub scope: NameScope,
    /// What the name refers to
    pub target: NameTarget,
    /// Optional comment/description
    pub comment: Option<String>,
    /// Whether this name is hidden from the UI
    pub hidden: bool,
}

impl NamedRange {
    /// Create a new named range
    pub fn new(name: impl Into<String>, target: NameTarget, scope: NameScope) -> Self {
        Self {
            name: name.into(),
            scope,
            target,
            comment: None,
            hidden: false,
        }
    }

    /// Name a range of cells
    pub fn range(name: impl Into<String>, area: Area, scope: NameScope) -> Self {
        Self::new(name, NameTarget::Range(area), scope)
    }

    /// Name an expression
    pub fn expression(name: impl Into<String>, expr: impl Into<String>, scope: NameScope) -> Self {
        let expr: String = expr.into();
        let expr = expr.strip_prefix('=').map(str::to_string).unwrap_or(expr);
        Self::new(name, NameTarget::Expression(expr), scope)
    }

    /// Set a comment for this named range
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Mark this named range as hidden
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// The range this name refers to, if any
    pub fn area(&self) -> Option<&Area> {
        match &self.target {
            NameTarget::Range(area) => Some(area),
            NameTarget::Expression(_) => None,
        }
    }

    /// The sheet a range lives on: its own qualifier, else the scope's sheet
    pub fn resolved_sheet(&self) -> Option<usize> {
        self.area()
            .and_then(|area| area.sheet())
            .or_else(|| self.scope.sheet())
    }

    /// The A1 label of the range, or the expression text
    pub fn label(&self) -> String {
        match &self.target {
            NameTarget::Range(area) => area.to_a1_string(),
            NameTarget::Expression(expr) => expr.clone(),
        }
    }
}

impl fmt::Display for NamedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.label())
    }
}

/// Validate a name
///
/// Names start with a letter or underscore and contain only letters,
/// digits, underscores and dots. They must not end with a dot, contain
/// `..`, read as a cell address, or be a boolean literal.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Err(Error::InvalidName(format!("'{}': {}", name, reason)));

    let Some(first) = name.chars().next() else {
        return invalid("name cannot be empty");
    };
    if !first.is_alphabetic() && first != '_' {
        return invalid("must start with a letter or underscore");
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        return invalid("may only contain letters, digits, underscores and dots");
    }
    if name.ends_with('.') {
        return invalid("cannot end with a dot");
    }
    if name.contains("..") {
        return invalid("cannot contain consecutive dots");
    }
    if CellAddress::parse(name).is_ok() {
        return invalid("looks like a cell reference");
    }
    if name.eq_ignore_ascii_case("TRUE") || name.eq_ignore_ascii_case("FALSE") {
        return invalid("is a boolean literal");
    }
    Ok(())
}

/// Collection of named ranges with case-insensitive, scoped lookup
#[derive(Debug, Default, Clone)]
pub struct NamedRangeCollection {
    /// Keyed by lowercase name, plus `:sheet:{index}` for local names
    ranges: BTreeMap<String, NamedRange>,
}

impl NamedRangeCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    fn make_key(name: &str, scope: &NameScope) -> String {
        let name_lower = name.to_lowercase();
        match scope {
            NameScope::Workbook => name_lower,
            NameScope::Sheet(idx) => format!("{}:sheet:{}", name_lower, idx),
        }
    }

    /// Define a new named range
    ///
    /// Fails with [`Error::InvalidName`] for a malformed name and with
    /// [`Error::DuplicateName`] if the scope already holds the name.
    pub fn define(&mut self, range: NamedRange) -> Result<()> {
        validate_name(&range.name)?;
        let key = Self::make_key(&range.name, &range.scope);
        if self.ranges.contains_key(&key) {
            return Err(Error::DuplicateName(range.name));
        }
        self.ranges.insert(key, range);
        Ok(())
    }

    /// Define or replace a named range
    pub fn define_or_update(&mut self, range: NamedRange) -> Result<()> {
        validate_name(&range.name)?;
        let key = Self::make_key(&range.name, &range.scope);
        self.ranges.insert(key, range);
        Ok(())
    }

    /// Get a named range as seen from `current_sheet`
    ///
    /// A name scoped to the sheet wins over a workbook-wide one.
    pub fn get(&self, name: &str, current_sheet: usize) -> Option<&NamedRange> {
        let sheet_key = Self::make_key(name, &NameScope::Sheet(current_sheet));
        if let Some(range) = self.ranges.get(&sheet_key) {
            return Some(range);
        }
        self.ranges.get(&Self::make_key(name, &NameScope::Workbook))
    }

    /// Get a named range by exact scope
    pub fn get_exact(&self, name: &str, scope: &NameScope) -> Option<&NamedRange> {
        self.ranges.get(&Self::make_key(name, scope))
    }

    /// Remove a named range
    pub fn remove(&mut self, name: &str, scope: &NameScope) -> Option<NamedRange> {
        self.ranges.remove(&Self::make_key(name, scope))
    }

    /// Check if a name exists in the given scope
    pub fn contains(&self, name: &str, scope: &NameScope) -> bool {
        self.ranges.contains_key(&Self::make_key(name, scope))
    }

    /// Iterate over all named ranges, ordered by key
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges.values()
    }

    /// Get the number of named ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Get all names scoped to a specific sheet
    pub fn sheet_names(&self, sheet_index: usize) -> impl Iterator<Item = &NamedRange> {
        self.ranges
            .values()
            .filter(move |r| r.scope == NameScope::Sheet(sheet_index))
    }

    /// Patch every range on `sheet` for a structural edit
    ///
    /// A range lives on its own sheet qualifier, or on its scope's sheet when
    /// unqualified. Ranges whose sheet cannot be determined are logged and
    /// skipped. Names whose range is consumed are removed and returned.
    pub fn patch_for_edit(&mut self, sheet: usize, edit: &LineEdit) -> Vec<NamedRange> {
        let mut moved = Vec::new();
        let mut consumed = Vec::new();

        for (key, range) in &self.ranges {
            let Some(area) = range.area() else { continue };
            let Some(owner) = range.resolved_sheet() else {
                let err = Error::UnresolvedReference(format!(
                    "{} refers to {} without a sheet",
                    range.name,
                    area.to_a1_string()
                ));
                warn!("{}", err);
                continue;
            };
            if owner != sheet {
                continue;
            }
            match patch_area(area, edit) {
                AreaPatch::Unchanged => {}
                AreaPatch::Moved(patched) => moved.push((key.clone(), patched)),
                AreaPatch::Removed => consumed.push(key.clone()),
            }
        }

        for (key, patched) in moved {
            if let Some(range) = self.ranges.get_mut(&key) {
                range.target = NameTarget::Range(patched);
            }
        }
        let removed: Vec<NamedRange> = consumed
            .iter()
            .filter_map(|key| self.ranges.remove(key))
            .collect();
        if !removed.is_empty() {
            debug!("structural edit removed {} named range(s)", removed.len());
        }
        removed
    }

    /// Drop names scoped to or pointing at a sheet and renumber later sheets
    pub fn remove_sheet(&mut self, sheet: usize) {
        let ranges = std::mem::take(&mut self.ranges);
        for (_, mut range) in ranges {
            match range.scope {
                NameScope::Sheet(idx) if idx == sheet => continue,
                NameScope::Sheet(idx) if idx > sheet => range.scope = NameScope::Sheet(idx - 1),
                _ => {}
            }
            if let NameTarget::Range(area) = &mut range.target {
                match area.sheet() {
                    Some(idx) if idx == sheet => continue,
                    Some(idx) if idx > sheet => *area = area.on_sheet(idx - 1),
                    _ => {}
                }
            }
            let key = Self::make_key(&range.name, &range.scope);
            self.ranges.insert(key, range);
        }
    }
}
