//! Row and column insert/delete on a worksheet
//!
//! An edit is validated in full before anything is touched. Once it passes,
//! the grid is shifted and every line-indexed structure follows: merge and
//! array heads, style entries and deltas, line sizes, and conditional format
//! targets. Cached styles from the line before the edit onward are dropped
//! and the conditional formats are flagged for a fresh pass.

use log::debug;

use crate::cell::Area;
use crate::conditional_format::ConditionalRule;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::named_range::NamedRange;
use crate::patch::{shift_line_map, Axis, LineEdit};
use crate::worksheet::Worksheet;

/// What a structural edit removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditReport {
    /// Merged regions that were deleted entirely
    pub removed_merges: Vec<Area>,
    /// Array regions that were deleted entirely
    pub removed_arrays: Vec<Area>,
    /// Conditional format rules whose target was deleted
    pub removed_rules: Vec<ConditionalRule>,
    /// Named ranges whose area was deleted
    pub removed_names: Vec<NamedRange>,
}

impl EditReport {
    /// Whether the edit removed nothing
    pub fn is_empty(&self) -> bool {
        self.removed_merges.is_empty()
            && self.removed_arrays.is_empty()
            && self.removed_rules.is_empty()
            && self.removed_names.is_empty()
    }
}

impl<G: Grid> Worksheet<G> {
    /// Check that an edit can be applied without touching anything
    ///
    /// Inserting is rejected when it would land strictly inside an array
    /// region, i.e. when the line before the insert point and the line at it
    /// belong to the same array.
    pub fn check_edit(&self, edit: &LineEdit) -> Result<()> {
        let lines = self.grid.line_count(edit.axis);
        let n = edit.magnitude();

        if edit.is_insert() {
            if edit.before > lines {
                return Err(Error::LineOutOfBounds {
                    axis: edit.axis,
                    index: edit.before,
                    count: lines,
                });
            }
            if lines.saturating_add(n) > edit.axis.limit() {
                return Err(Error::LineOutOfBounds {
                    axis: edit.axis,
                    index: lines.saturating_add(n),
                    count: edit.axis.limit(),
                });
            }
            if let Some(id) = self.arrays.straddling(edit.axis, edit.before) {
                let region = self
                    .arrays
                    .get(id)
                    .map(Area::to_a1_string)
                    .unwrap_or_default();
                return Err(Error::RejectedEdit {
                    axis: edit.axis,
                    before: edit.before,
                    region,
                });
            }
        } else if n > 0 && edit.before.saturating_add(n) > lines {
            return Err(Error::LineOutOfBounds {
                axis: edit.axis,
                index: edit.before.saturating_add(n) - 1,
                count: lines,
            });
        }
        Ok(())
    }

    /// Validate and apply a structural edit to this sheet
    ///
    /// Named ranges live on the workbook and are patched there.
    pub fn apply_line_edit(&mut self, edit: &LineEdit) -> Result<EditReport> {
        if edit.count == 0 {
            return Ok(EditReport::default());
        }
        self.check_edit(edit)?;

        let n = edit.magnitude();
        if edit.is_insert() {
            self.grid.insert_lines(edit.axis, edit.before, n);
        } else {
            self.grid.delete_lines(edit.axis, edit.before, n);
        }

        let removed_merges = self.merges.apply_edit(edit);
        let removed_arrays = self.arrays.apply_edit(edit);
        self.styles.apply_edit(edit);
        match edit.axis {
            Axis::Row => shift_line_map(&mut self.row_heights, edit),
            Axis::Column => shift_line_map(&mut self.column_widths, edit),
        }
        let removed_rules = self.conditional_formats.apply_edit(edit);

        debug!(
            "sheet '{}': {} {} {}(s) at {} (merges removed: {}, arrays removed: {}, rules removed: {})",
            self.name,
            if edit.is_insert() { "inserted" } else { "deleted" },
            n,
            edit.axis,
            edit.before,
            removed_merges.len(),
            removed_arrays.len(),
            removed_rules.len()
        );

        Ok(EditReport {
            removed_merges,
            removed_arrays,
            removed_rules,
            removed_names: Vec::new(),
        })
    }

    /// Insert `count` rows before `before`
    pub fn insert_rows(&mut self, before: u32, count: u32) -> Result<EditReport> {
        self.apply_line_edit(&LineEdit::insert(Axis::Row, before, count))
    }

    /// Delete `count` rows starting at `first`
    pub fn delete_rows(&mut self, first: u32, count: u32) -> Result<EditReport> {
        self.apply_line_edit(&LineEdit::delete(Axis::Row, first, count))
    }

    /// Insert `count` columns before `before`
    pub fn insert_columns(&mut self, before: u32, count: u32) -> Result<EditReport> {
        self.apply_line_edit(&LineEdit::insert(Axis::Column, before, count))
    }

    /// Delete `count` columns starting at `first`
    pub fn delete_columns(&mut self, first: u32, count: u32) -> Result<EditReport> {
        self.apply_line_edit(&LineEdit::delete(Axis::Column, first, count))
    }
}
