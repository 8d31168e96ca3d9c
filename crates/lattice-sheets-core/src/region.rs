//! Region heads: merged cells and array-formula regions
//!
//! Each region is stored once in an arena slot and every covered cell maps to
//! the slot's [`RegionId`]. Two cells belong to the same region exactly when
//! they map to the same id.

use ahash::AHashMap;

use crate::cell::Area;
use crate::error::{Error, Result};
use crate::patch::{patch_area, AreaPatch, Axis, LineEdit};

/// Handle to one region in a [`RegionHeads`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(usize);

impl RegionId {
    /// Slot index
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Arena of non-overlapping rectangular regions
///
/// Slots freed by a removal are handed out again, so an id is only
/// meaningful while its region is live.
#[derive(Debug, Clone, Default)]
pub struct RegionHeads {
    slots: Vec<Option<Area>>,
    free: Vec<usize>,
    live: usize,
    coverage: AHashMap<(u32, u32), RegionId>,
}

impl RegionHeads {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region; it must not overlap an existing one
    pub fn insert(&mut self, area: Area) -> Result<RegionId> {
        if self.overlapping(&area).is_some() {
            return Err(Error::RegionConflict(area.to_a1_string()));
        }
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(area);
                RegionId(index)
            }
            None => {
                self.slots.push(Some(area));
                RegionId(self.slots.len() - 1)
            }
        };
        for addr in area.cells() {
            self.coverage.insert((addr.row, addr.col), id);
        }
        self.live += 1;
        Ok(id)
    }

    /// Remove a region, returning its area
    pub fn remove(&mut self, id: RegionId) -> Option<Area> {
        let area = self.slots.get_mut(id.0)?.take()?;
        for addr in area.cells() {
            self.coverage.remove(&(addr.row, addr.col));
        }
        self.free.push(id.0);
        self.live -= 1;
        Some(area)
    }

    /// Area of a region
    pub fn get(&self, id: RegionId) -> Option<&Area> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    /// The region covering a cell
    pub fn region_at(&self, row: u32, col: u32) -> Option<RegionId> {
        self.coverage.get(&(row, col)).copied()
    }

    /// The area of the region covering a cell
    pub fn area_at(&self, row: u32, col: u32) -> Option<&Area> {
        self.region_at(row, col).and_then(|id| self.get(id))
    }

    /// Whether two cells are covered by the same region
    pub fn same_region(&self, a: (u32, u32), b: (u32, u32)) -> bool {
        match (self.region_at(a.0, a.1), self.region_at(b.0, b.1)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// First region overlapping `area`
    pub fn overlapping(&self, area: &Area) -> Option<RegionId> {
        self.iter().find(|(_, a)| a.overlaps(area)).map(|(id, _)| id)
    }

    /// Live regions in slot order
    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &Area)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|area| (RegionId(i), area)))
    }

    /// Number of live regions
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if no region is live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of cells covered by some region
    pub fn covered_cells(&self) -> usize {
        self.coverage.len()
    }

    /// A region that an insert before line `before` would cut in two
    ///
    /// For every cross-axis line a region spans, the cells on either side of
    /// the insertion point are compared by region id. An insert at a
    /// region's first line is not a cut: the region absorbs the new lines
    /// (see [`SpanEdit::InsertInside`]). An insert just past its last line
    /// leaves it alone.
    ///
    /// [`SpanEdit::InsertInside`]: crate::patch::SpanEdit::InsertInside
    pub fn straddling(&self, axis: Axis, before: u32) -> Option<RegionId> {
        if before == 0 {
            return None;
        }
        for (_, area) in self.iter() {
            let (c0, c1) = area.span(axis.cross());
            for cross in c0..=c1 {
                let (prev, at) = match axis {
                    Axis::Row => ((before - 1, cross), (before, cross)),
                    Axis::Column => ((cross, before - 1), (cross, before)),
                };
                if self.same_region(prev, at) {
                    return self.region_at(at.0, at.1);
                }
            }
        }
        None
    }

    /// Patch every region for a structural edit
    ///
    /// Consumed regions are dropped and returned; coverage is rebuilt from
    /// the surviving slots.
    pub fn apply_edit(&mut self, edit: &LineEdit) -> Vec<Area> {
        let mut removed = Vec::new();
        let mut changed = false;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(area) = slot else { continue };
            match patch_area(area, edit) {
                AreaPatch::Unchanged => {}
                AreaPatch::Moved(patched) => {
                    *area = patched;
                    changed = true;
                }
                AreaPatch::Removed => {
                    removed.push(*area);
                    *slot = None;
                    self.free.push(index);
                    self.live -= 1;
                    changed = true;
                }
            }
        }
        if changed {
            self.rebuild_coverage();
        }
        removed
    }

    /// Drop every region
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
        self.coverage.clear();
    }

    fn rebuild_coverage(&mut self) {
        self.coverage.clear();
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(area) = slot {
                for addr in area.cells() {
                    self.coverage.insert((addr.row, addr.col), RegionId(i));
                }
            }
        }
    }
}
