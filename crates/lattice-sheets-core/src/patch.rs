//! Reference patching under row/column inserts and deletes
//!
//! Every structure that refers to lines of a sheet (merge and array heads,
//! named ranges, conditional format targets, row/column keyed maps) is
//! patched through the same case analysis. [`SpanEdit::classify`] decides
//! once how an edit relates to an inclusive span; [`SpanEdit::apply`] turns
//! that decision into the patched span.
//!
//! With `b` the edit index, `n` the number of lines and `[s, e]` the span:
//!
//! | case                  | condition                      | result          |
//! |-----------------------|--------------------------------|-----------------|
//! | `Unaffected`          | `b > e`                        | `[s, e]`        |
//! | `InsertBefore`        | insert, `b < s`                | `[s+n, e+n]`    |
//! | `InsertInside`        | insert, `s <= b <= e`          | `[s, e+n]`      |
//! | `DeleteBefore`        | delete, `b+n <= s`             | `[s-n, e-n]`    |
//! | `DeleteContains`      | delete, `b <= s`, `b+n > e`    | dropped         |
//! | `DeleteOverlapsStart` | delete, `b <= s < b+n <= e`    | `[b, e-n]`      |
//! | `DeleteOverlapsEnd`   | delete, `s < b <= e < b+n`     | `[s, b-1]`      |
//! | `DeleteInside`        | delete, `s < b`, `b+n <= e`    | `[s, e-n]`      |

use std::collections::BTreeMap;
use std::fmt;

use crate::cell::Area;
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// Direction of a structural edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// Rows are inserted or deleted
    Row,
    /// Columns are inserted or deleted
    Column,
}

impl Axis {
    /// The other axis
    pub fn cross(self) -> Axis {
        match self {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        }
    }

    /// Number of lines a sheet can hold along this axis
    pub fn limit(self) -> u32 {
        match self {
            Axis::Row => MAX_ROWS,
            Axis::Column => MAX_COLS,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// A single insert or delete of whole lines
///
/// `count > 0` inserts `count` lines immediately before `before`;
/// `count < 0` deletes `|count|` lines starting at `before`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEdit {
    /// Axis being edited
    pub axis: Axis,
    /// Index the edit is anchored at
    pub before: u32,
    /// Signed line count
    pub count: i32,
}

impl LineEdit {
    /// Insert `count` lines before `before`
    pub fn insert(axis: Axis, before: u32, count: u32) -> Self {
        Self {
            axis,
            before,
            count: count.min(i32::MAX as u32) as i32,
        }
    }

    /// Delete `count` lines starting at `first`
    pub fn delete(axis: Axis, first: u32, count: u32) -> Self {
        Self {
            axis,
            before: first,
            count: -(count.min(i32::MAX as u32) as i32),
        }
    }

    /// Whether this edit inserts lines
    pub fn is_insert(&self) -> bool {
        self.count > 0
    }

    /// Number of lines inserted or deleted
    pub fn magnitude(&self) -> u32 {
        self.count.unsigned_abs()
    }

    /// Where an existing line ends up, or `None` if the edit deletes it
    pub fn map_line(&self, line: u32) -> Option<u32> {
        let n = self.magnitude();
        if line < self.before {
            Some(line)
        } else if self.is_insert() {
            Some(line.saturating_add(n))
        } else if line < self.before.saturating_add(n) {
            None
        } else {
            Some(line - n)
        }
    }

    /// Classify this edit against the inclusive span `[first, last]`
    pub fn classify(&self, first: u32, last: u32) -> SpanEdit {
        SpanEdit::classify(self.before, self.count, first, last)
    }
}

/// How one edit relates to one span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanEdit {
    /// The edit happens entirely after the span
    Unaffected,
    /// Lines are inserted before the span
    InsertBefore,
    /// Lines are inserted within the span, or at its first line, and
    /// absorbed by it
    InsertInside,
    /// Deleted lines lie entirely before the span
    DeleteBefore,
    /// The deleted lines cover the whole span
    DeleteContains,
    /// The deleted lines cover the span's leading edge
    DeleteOverlapsStart,
    /// The deleted lines cover the span's trailing edge
    DeleteOverlapsEnd,
    /// The deleted lines lie strictly within the span
    DeleteInside,
}

impl SpanEdit {
    /// Decide the case for an edit at `before` of `count` lines against `[first, last]`
    ///
    /// `first <= last` is assumed; callers hold normalized areas.
    pub fn classify(before: u32, count: i32, first: u32, last: u32) -> SpanEdit {
        debug_assert!(first <= last);
        let n = count.unsigned_abs();
        if count == 0 || before > last {
            return SpanEdit::Unaffected;
        }
        if count > 0 {
            return if before < first {
                SpanEdit::InsertBefore
            } else {
                SpanEdit::InsertInside
            };
        }

        // Exclusive end of the deleted block.
        let deleted_end = before.saturating_add(n);
        match (before <= first, deleted_end > last) {
            _ if deleted_end <= first => SpanEdit::DeleteBefore,
            (true, true) => SpanEdit::DeleteContains,
            (true, false) => SpanEdit::DeleteOverlapsStart,
            (false, true) => SpanEdit::DeleteOverlapsEnd,
            (false, false) => SpanEdit::DeleteInside,
        }
    }

    /// The patched span, or `None` when the span is consumed
    pub fn apply(self, before: u32, count: i32, first: u32, last: u32) -> Option<(u32, u32)> {
        let n = count.unsigned_abs();
        match self {
            SpanEdit::Unaffected => Some((first, last)),
            SpanEdit::InsertBefore => Some((first.saturating_add(n), last.saturating_add(n))),
            SpanEdit::InsertInside => Some((first, last.saturating_add(n))),
            SpanEdit::DeleteBefore => Some((first - n, last - n)),
            SpanEdit::DeleteContains => None,
            SpanEdit::DeleteOverlapsStart => Some((before, last - n)),
            SpanEdit::DeleteOverlapsEnd => Some((first, before - 1)),
            SpanEdit::DeleteInside => Some((first, last - n)),
        }
    }
}

/// Outcome of patching one area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaPatch {
    /// The area does not change
    Unchanged,
    /// The area moved or was resized
    Moved(Area),
    /// The edit consumed the area
    Removed,
}

/// Patch `area` for `edit`
///
/// Areas that are open-ended along the edited axis (entire rows when
/// columns are edited, and so on) are left as they are. Inserts never push
/// an area past the last line of the sheet: the end is clipped there, and
/// an area pushed off entirely is removed.
pub fn patch_area(area: &Area, edit: &LineEdit) -> AreaPatch {
    if area.is_open_on(edit.axis) {
        return AreaPatch::Unchanged;
    }
    let (first, last) = area.span(edit.axis);
    let case = edit.classify(first, last);
    let max_line = edit.axis.limit() - 1;
    match case.apply(edit.before, edit.count, first, last) {
        None => AreaPatch::Removed,
        Some((new_first, _)) if new_first > max_line => AreaPatch::Removed,
        Some((new_first, new_last)) => {
            let new_last = new_last.min(max_line);
            if (new_first, new_last) == (first, last) {
                AreaPatch::Unchanged
            } else {
                AreaPatch::Moved(area.with_span(edit.axis, new_first, new_last))
            }
        }
    }
}

/// Check that `area` lies inside the largest possible sheet
pub fn check_area_limits(area: &Area) -> Result<()> {
    for axis in [Axis::Row, Axis::Column] {
        if area.span(axis).1 >= axis.limit() {
            return Err(Error::InvalidRange(format!(
                "{} ends past the last {} ({})",
                area.to_a1_string(),
                axis,
                axis.limit()
            )));
        }
    }
    Ok(())
}

/// Rebuild a line-keyed map for `edit`
///
/// Keys before the edit stay, keys after it move, deleted keys are dropped.
pub fn shift_line_map<V>(map: &mut BTreeMap<u32, V>, edit: &LineEdit) {
    if edit.count == 0 || map.range(edit.before..).next().is_none() {
        return;
    }
    let tail = map.split_off(&edit.before);
    for (line, value) in tail {
        if let Some(line) = edit.map_line(line) {
            map.insert(line, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn patch_span(before: u32, count: i32, first: u32, last: u32) -> Option<(u32, u32)> {
        SpanEdit::classify(before, count, first, last).apply(before, count, first, last)
    }

    #[test]
    fn test_insert_cases() {
        assert_eq!(SpanEdit::classify(1, 2, 2, 3), SpanEdit::InsertBefore);
        assert_eq!(patch_span(1, 2, 2, 3), Some((4, 5)));

        assert_eq!(SpanEdit::classify(3, 1, 2, 3), SpanEdit::InsertInside);
        assert_eq!(patch_span(3, 1, 2, 3), Some((2, 4)));

        // Landing on the first line is absorbed as well
        assert_eq!(SpanEdit::classify(2, 1, 2, 3), SpanEdit::InsertInside);
        assert_eq!(patch_span(2, 1, 2, 3), Some((2, 4)));

        assert_eq!(SpanEdit::classify(4, 1, 2, 3), SpanEdit::Unaffected);
        assert_eq!(patch_span(5, 1, 2, 3), Some((2, 3)));
    }

    #[test]
    fn test_delete_cases() {
        assert_eq!(SpanEdit::classify(0, -2, 2, 3), SpanEdit::DeleteBefore);
        assert_eq!(patch_span(0, -2, 2, 3), Some((0, 1)));

        assert_eq!(SpanEdit::classify(2, -2, 2, 3), SpanEdit::DeleteContains);
        assert_eq!(patch_span(1, -5, 2, 3), None);

        assert_eq!(SpanEdit::classify(1, -2, 2, 4), SpanEdit::DeleteOverlapsStart);
        assert_eq!(patch_span(1, -2, 2, 4), Some((1, 2)));

        assert_eq!(SpanEdit::classify(3, -4, 2, 4), SpanEdit::DeleteOverlapsEnd);
        assert_eq!(patch_span(3, -4, 2, 4), Some((2, 2)));

        assert_eq!(SpanEdit::classify(3, -2, 2, 6), SpanEdit::DeleteInside);
        assert_eq!(patch_span(3, -2, 2, 6), Some((2, 4)));

        assert_eq!(SpanEdit::classify(7, -2, 2, 6), SpanEdit::Unaffected);
    }

    #[test]
    fn test_single_line_clip() {
        // Deleting only the first row of a two-row span leaves one row
        assert_eq!(patch_span(2, -1, 2, 3), Some((2, 2)));
    }

    #[test]
    fn test_patch_area_skips_open_axis() {
        let rows = Area::rows(3, 4);
        let edit = LineEdit::insert(Axis::Column, 0, 2);
        assert_eq!(patch_area(&rows, &edit), AreaPatch::Unchanged);

        let edit = LineEdit::insert(Axis::Row, 0, 2);
        match patch_area(&rows, &edit) {
            AreaPatch::Moved(area) => assert_eq!(area.span(Axis::Row), (5, 6)),
            other => panic!("expected a move, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_clips_at_last_line() {
        let last = MAX_ROWS - 1;
        let full = Area::from_indices(0, 0, last, 0);
        match patch_area(&full, &LineEdit::insert(Axis::Row, 0, 1)) {
            AreaPatch::Moved(area) => assert_eq!(area.span(Axis::Row), (1, last)),
            other => panic!("expected a move, got {:?}", other),
        }
        assert_eq!(
            patch_area(&full, &LineEdit::insert(Axis::Row, 5, 3)),
            AreaPatch::Unchanged
        );

        let bottom = Area::from_indices(last, 0, last, 2);
        assert_eq!(
            patch_area(&bottom, &LineEdit::insert(Axis::Row, 10, 1)),
            AreaPatch::Removed
        );
    }

    #[test]
    fn test_check_area_limits() {
        check_area_limits(&Area::from_indices(0, 0, MAX_ROWS - 1, MAX_COLS - 1)).unwrap();
        assert!(matches!(
            check_area_limits(&Area::from_indices(0, 0, u32::MAX, 0)),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            check_area_limits(&Area::from_indices(0, 0, 0, MAX_COLS)),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_shift_line_map() {
        let mut map = BTreeMap::from([(0, "a"), (2, "b"), (3, "c"), (6, "d")]);

        shift_line_map(&mut map, &LineEdit::insert(Axis::Row, 2, 2));
        assert_eq!(map, BTreeMap::from([(0, "a"), (4, "b"), (5, "c"), (8, "d")]));

        shift_line_map(&mut map, &LineEdit::delete(Axis::Row, 3, 2));
        assert_eq!(map, BTreeMap::from([(0, "a"), (3, "c"), (6, "d")]));
    }

    #[test]
    fn test_map_line() {
        let ins = LineEdit::insert(Axis::Row, 3, 2);
        assert_eq!(ins.map_line(2), Some(2));
        assert_eq!(ins.map_line(3), Some(5));

        let del = LineEdit::delete(Axis::Row, 3, 2);
        assert_eq!(del.map_line(3), None);
        assert_eq!(del.map_line(4), None);
        assert_eq!(del.map_line(5), Some(3));
    }

    fn delete_model(before: u32, n: u32, first: u32, last: u32) -> Option<(u32, u32)> {
        let edit = LineEdit::delete(Axis::Row, before, n);
        let survivors: Vec<u32> = (first..=last).filter_map(|l| edit.map_line(l)).collect();
        Some((*survivors.first()?, *survivors.last()?))
    }

    proptest! {
        #[test]
        fn prop_delete_matches_line_model(
            first in 0u32..40,
            len in 0u32..20,
            before in 0u32..70,
            n in 1u32..30,
        ) {
            let last = first + len;
            let patched = patch_span(before, -(n as i32), first, last);
            prop_assert_eq!(patched, delete_model(before, n, first, last));
        }

        #[test]
        fn prop_insert_keeps_span_consistent(
            first in 0u32..40,
            len in 0u32..20,
            before in 0u32..70,
            n in 1u32..30,
        ) {
            let last = first + len;
            let case = SpanEdit::classify(before, n as i32, first, last);
            let (s, e) = case.apply(before, n as i32, first, last).unwrap();
            prop_assert!(s <= e);
            match case {
                SpanEdit::Unaffected => prop_assert_eq!((s, e), (first, last)),
                SpanEdit::InsertBefore => prop_assert_eq!((s, e), (first + n, last + n)),
                SpanEdit::InsertInside => {
                    prop_assert_eq!(s, first);
                    prop_assert_eq!(e - s, last - first + n);
                }
                other => prop_assert!(false, "delete case {:?} for an insert", other),
            }
        }

        #[test]
        fn prop_patched_spans_never_degenerate(
            first in 0u32..40,
            len in 0u32..20,
            before in 0u32..70,
            count in -30i32..30,
        ) {
            let last = first + len;
            if let Some((s, e)) = patch_span(before, count, first, last) {
                prop_assert!(s <= e);
            }
        }
    }
}
