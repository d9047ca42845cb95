use glam::Vec2;
use slotmap::SecondaryMap;

use std::collections::{HashMap, HashSet};

use crate::api::NarrowphaseApi;
use crate::error::{Error, Result};
use crate::narrowphase::Narrowphase;
use crate::types::*;

/// Largest cell index magnitude an item may occupy.
pub const MAX_CELL: f32 = 1.0e9;

/// Inclusive range of grid cells covered by a rect.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl CellRange {
    #[inline]
    pub fn contains(&self, cell: (i32, i32)) -> bool {
        cell.0 >= self.x0 && cell.0 <= self.x1 && cell.1 >= self.y0 && cell.1 <= self.y1
    }

    /// Number of cells in the range.
    pub fn count(&self) -> u64 {
        let w = (self.x1 as i64 - self.x0 as i64 + 1) as u64;
        let h = (self.y1 as i64 - self.y0 as i64 + 1) as u64;
        w.saturating_mul(h)
    }

    pub fn iter(self) -> impl Iterator<Item = (i32, i32)> {
        (self.y0..=self.y1).flat_map(move |iy| (self.x0..=self.x1).map(move |ix| (ix, iy)))
    }
}

struct Slot {
    rect: Rect,
    seq: u64,
    range: CellRange,
}

/// Uniform-grid broad phase over rects keyed by [`Handle`].
///
/// Every stored handle is listed in exactly the cells its rect overlaps. A rect
/// edge lying on a cell boundary does not spill into the next cell.
pub struct SpatialIndex {
    cell_size: f32,
    slots: SecondaryMap<Handle, Slot>,
    // Uniform grid: cell coord -> handles overlapping it
    cells: HashMap<(i32, i32), Vec<Handle>>,
    next_seq: u64,
}

impl SpatialIndex {
    /// `cell_size` must already be validated (see [`WorldConfig::validate`]).
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0 && cell_size.is_finite());
        Self {
            cell_size,
            slots: SecondaryMap::new(),
            cells: HashMap::new(),
            next_seq: 0,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.slots.contains_key(handle)
    }

    /// Every edge of `rect` maps to a cell index within `±MAX_CELL`.
    pub fn in_bounds(&self, rect: &Rect) -> bool {
        let cs = self.cell_size;
        [rect.x, rect.y, rect.x + rect.w, rect.y + rect.h]
            .iter()
            .all(|v| (v / cs).abs() <= MAX_CELL)
    }

    pub fn add(&mut self, handle: Handle, rect: Rect) -> Result<()> {
        if !rect.is_valid() || !self.in_bounds(&rect) {
            return Err(Error::InvalidRect { rect });
        }
        if self.slots.contains_key(handle) {
            return Err(Error::DuplicateHandle(handle));
        }
        let range = self.cell_range(&rect);
        for cell in range.iter() {
            self.cells.entry(cell).or_default().push(handle);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(handle, Slot { rect, seq, range });
        Ok(())
    }

    pub fn remove(&mut self, handle: Handle) -> Result<Rect> {
        let slot = self.slots.remove(handle).ok_or(Error::NotFound(handle))?;
        for cell in slot.range.iter() {
            detach(&mut self.cells, cell, handle);
        }
        Ok(slot.rect)
    }

    /// Replace a stored rect. Only cells entering or leaving the range are touched.
    pub fn update(&mut self, handle: Handle, rect: Rect) -> Result<()> {
        if !rect.is_valid() || !self.in_bounds(&rect) {
            return Err(Error::InvalidRect { rect });
        }
        let new_range = self.cell_range(&rect);
        let slot = self.slots.get_mut(handle).ok_or(Error::NotFound(handle))?;
        let old_range = slot.range;
        slot.rect = rect;
        slot.range = new_range;
        if old_range != new_range {
            for cell in old_range.iter().filter(|c| !new_range.contains(*c)) {
                detach(&mut self.cells, cell, handle);
            }
            for cell in new_range.iter().filter(|c| !old_range.contains(*c)) {
                self.cells.entry(cell).or_default().push(handle);
            }
        }
        Ok(())
    }

    pub fn rect(&self, handle: Handle) -> Result<Rect> {
        self.slots.get(handle).map(|s| s.rect).ok_or(Error::NotFound(handle))
    }

    /// Insertion sequence number; lower means added earlier.
    pub(crate) fn seq(&self, handle: Handle) -> u64 {
        self.slots.get(handle).map(|s| s.seq).unwrap_or(u64::MAX)
    }

    pub fn cell_of(&self, p: Vec2) -> (i32, i32) {
        let cs = self.cell_size;
        ((p.x / cs).floor() as i32, (p.y / cs).floor() as i32)
    }

    pub fn cell_range(&self, rect: &Rect) -> CellRange {
        let cs = self.cell_size;
        let x0 = (rect.x / cs).floor() as i32;
        let y0 = (rect.y / cs).floor() as i32;
        let x1 = (((rect.x + rect.w) / cs).ceil() as i32).saturating_sub(1).max(x0);
        let y1 = (((rect.y + rect.h) / cs).ceil() as i32).saturating_sub(1).max(y0);
        CellRange { x0, y0, x1, y1 }
    }

    /// Cells the stored rect of `handle` is listed in.
    pub fn cells_of(&self, handle: Handle) -> Result<Vec<(i32, i32)>> {
        let slot = self.slots.get(handle).ok_or(Error::NotFound(handle))?;
        Ok(slot
            .range
            .iter()
            .filter(|c| self.cells.get(c).is_some_and(|l| l.contains(&handle)))
            .collect())
    }

    /// Handles listed in one cell (empty if the cell is unused).
    pub fn cell_members(&self, cell: (i32, i32)) -> &[Handle] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Candidates sharing a cell with `rect`, de-duplicated, in insertion order.
    ///
    /// A superset of the true overlaps; callers re-test exact geometry. Ranges
    /// wider than the occupied grid scan the occupied cells instead.
    pub fn query_rect(&self, rect: &Rect) -> Vec<Handle> {
        let range = self.cell_range(rect);
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        if range.count() > self.cells.len() as u64 {
            for (cell, list) in &self.cells {
                if range.contains(*cell) {
                    push_unique(&mut seen, &mut out, list);
                }
            }
        } else {
            for cell in range.iter() {
                if let Some(list) = self.cells.get(&cell) {
                    push_unique(&mut seen, &mut out, list);
                }
            }
        }
        self.sort_by_seq(&mut out);
        out
    }

    /// Handles whose rect strictly contains `p`, in insertion order.
    pub fn query_point(&self, p: Vec2) -> Vec<Handle> {
        let mut out: Vec<Handle> = self
            .cell_members(self.cell_of(p))
            .iter()
            .copied()
            .filter(|&h| self.slots[h].rect.contains_point(p))
            .collect();
        self.sort_by_seq(&mut out);
        out
    }

    /// Rects crossed by the segment `a -> b`, sorted by entry fraction.
    ///
    /// Equal entries (several rects containing `a`) are ordered by where the
    /// infinite line enters them, then by insertion order.
    pub fn query_segment(&self, a: Vec2, b: Vec2) -> Vec<SegmentHit> {
        let d = b - a;
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        if walk_len(self.cell_of(a), self.cell_of(b)) > self.cells.len() as u64 {
            for list in self.cells.values() {
                push_unique(&mut seen, &mut candidates, list);
            }
        } else {
            for cell in self.segment_cells(a, b) {
                if let Some(list) = self.cells.get(&cell) {
                    push_unique(&mut seen, &mut candidates, list);
                }
            }
        }

        let mut hits: Vec<(SegmentHit, f32, u64)> = Vec::new();
        for h in candidates {
            let slot = &self.slots[h];
            let Some(hit) = Narrowphase::segment_intersection(slot.rect, a, b, 0.0, 1.0) else {
                continue;
            };
            if hit.t_enter >= hit.t_exit && d != Vec2::ZERO {
                // Corner graze
                continue;
            }
            let weight = Narrowphase::segment_intersection(slot.rect, a, b, f32::NEG_INFINITY, f32::INFINITY)
                .map(|line| line.t_enter)
                .unwrap_or(hit.t_enter);
            let seg = SegmentHit {
                handle: h,
                entry_time: hit.t_enter,
                exit_time: hit.t_exit,
                entry: a + d * hit.t_enter,
                exit: a + d * hit.t_exit,
            };
            hits.push((seg, weight, slot.seq));
        }
        hits.sort_by(|x, y| {
            x.0.entry_time
                .total_cmp(&y.0.entry_time)
                .then(x.1.total_cmp(&y.1))
                .then(x.2.cmp(&y.2))
        });
        hits.into_iter().map(|(h, _, _)| h).collect()
    }

    /// Cells visited by the segment, in walk order (DDA over the uniform grid).
    ///
    /// When the segment passes exactly through a cell corner both side cells are
    /// visited too. May contain duplicates.
    pub fn segment_cells(&self, a: Vec2, b: Vec2) -> Vec<(i32, i32)> {
        let cs = self.cell_size;
        let d = b - a;
        let start = self.cell_of(a);
        let end = self.cell_of(b);

        let init_step = |c: i32, origin: f32, v: f32| -> (i32, f32, f32) {
            if v > 0.0 {
                (1, ((c as f32 + 1.0) * cs - origin) / v, cs / v)
            } else if v < 0.0 {
                (-1, (c as f32 * cs - origin) / v, -cs / v)
            } else {
                (0, f32::INFINITY, f32::INFINITY)
            }
        };
        let (step_x, mut t_max_x, t_delta_x) = init_step(start.0, a.x, d.x);
        let (step_y, mut t_max_y, t_delta_y) = init_step(start.1, a.y, d.y);

        let mut cell = start;
        let mut out = vec![cell];
        // Every step moves at least one axis towards `end`
        let budget = walk_len(start, end);
        for _ in 0..budget {
            if cell == end {
                break;
            }
            let tx = if cell.0 == end.0 { f32::INFINITY } else { t_max_x };
            let ty = if cell.1 == end.1 { f32::INFINITY } else { t_max_y };
            if tx < ty {
                cell.0 += step_x;
                t_max_x += t_delta_x;
            } else if ty < tx {
                cell.1 += step_y;
                t_max_y += t_delta_y;
            } else {
                out.push((cell.0 + step_x, cell.1));
                out.push((cell.0, cell.1 + step_y));
                cell.0 += step_x;
                cell.1 += step_y;
                t_max_x += t_delta_x;
                t_max_y += t_delta_y;
            }
            out.push(cell);
        }
        if cell != end {
            out.push(end);
        }
        out
    }

    /// All stored handles in insertion order.
    pub fn handles(&self) -> Vec<Handle> {
        let mut out: Vec<Handle> = self.slots.keys().collect();
        self.sort_by_seq(&mut out);
        out
    }

    /// Return debug stats for the current grid.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            items: self.slots.len(),
            cells: self.cells.len(),
            memberships: self.cells.values().map(Vec::len).sum(),
        }
    }

    fn sort_by_seq(&self, handles: &mut [Handle]) {
        handles.sort_by_key(|&h| self.seq(h));
    }
}

/// Manhattan distance between two cells.
fn walk_len(a: (i32, i32), b: (i32, i32)) -> u64 {
    (b.0 as i64 - a.0 as i64).unsigned_abs() + (b.1 as i64 - a.1 as i64).unsigned_abs()
}

fn push_unique(seen: &mut HashSet<Handle>, out: &mut Vec<Handle>, list: &[Handle]) {
    for &h in list {
        if seen.insert(h) {
            out.push(h);
        }
    }
}

fn detach(cells: &mut HashMap<(i32, i32), Vec<Handle>>, cell: (i32, i32), handle: Handle) {
    if let Some(list) = cells.get_mut(&cell) {
        list.retain(|&h| h != handle);
        if list.is_empty() {
            cells.remove(&cell);
        }
    }
}
