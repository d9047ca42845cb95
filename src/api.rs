use glam::Vec2;

use crate::filter::{CollisionFilter, QueryFilter};
use crate::narrowphase::{Contact, SlabHit};
use crate::types::*;

/// Public API contract for the persistent collision world.
pub trait WorldApi<T> {
    /// Construct a new, empty world. Fails on invalid configuration.
    fn new(cfg: WorldConfig) -> crate::Result<Self>
    where
        Self: Sized;

    // --- Item lifecycle ----------------------------------------------------

    /// Insert an item and return its handle.
    fn add(&mut self, user_data: T, rect: Rect) -> crate::Result<Handle>;

    /// Remove an item, returning its user data. The handle is dead afterwards.
    fn remove(&mut self, handle: Handle) -> crate::Result<T>;

    /// Teleport or resize an item without sweeping.
    fn update(&mut self, handle: Handle, rect: Rect) -> crate::Result<()>;

    // --- Movement ----------------------------------------------------------

    /// Sweep the item towards `goal` (new min corner), resolve responses and commit.
    fn move_item<F>(&mut self, handle: Handle, goal: Vec2, filter: &F) -> crate::Result<MoveResult>
    where
        F: CollisionFilter<T> + ?Sized;

    /// Same as `move_item` but leaves the world untouched.
    fn check<F>(&self, handle: Handle, goal: Vec2, filter: &F) -> crate::Result<MoveResult>
    where
        F: CollisionFilter<T> + ?Sized;

    /// Single-pass lookahead from an arbitrary rect; no responses applied, no mutation.
    fn project<F>(&self, handle: Handle, from: Rect, goal: Vec2, filter: &F) -> crate::Result<Vec<Collision>>
    where
        F: CollisionFilter<T> + ?Sized;

    // --- Queries -----------------------------------------------------------

    /// Items crossed by the segment `a -> b`, nearest first.
    fn query_segment<Q>(&self, a: Vec2, b: Vec2, filter: &Q) -> Vec<SegmentHit>
    where
        Q: QueryFilter<T> + ?Sized;

    /// Items whose rect overlaps `rect` (positive area).
    fn query_rect<Q>(&self, rect: Rect, filter: &Q) -> Vec<Handle>
    where
        Q: QueryFilter<T> + ?Sized;

    /// Items strictly containing `p`.
    fn query_point<Q>(&self, p: Vec2, filter: &Q) -> Vec<Handle>
    where
        Q: QueryFilter<T> + ?Sized;

    /// Current rect of an item.
    fn get_rect(&self, handle: Handle) -> crate::Result<Rect>;
}

/// Geometric primitives behind the sweep resolver.
pub trait NarrowphaseApi {
    /// Liang–Barsky clip of the segment `a -> b` against `rect`, within `[t_lo, t_hi]`.
    fn segment_intersection(rect: Rect, a: Vec2, b: Vec2, t_lo: f32, t_hi: f32) -> Option<SlabHit>;

    /// Minkowski difference `other ⊖ item`, expressed relative to the item's min corner.
    fn minkowski_diff(item: Rect, other: Rect) -> Rect;

    fn nearest_corner(rect: Rect, p: Vec2) -> Vec2;

    /// Containment with a `DELTA` margin.
    fn contains_point(rect: Rect, p: Vec2) -> bool;

    /// Sweep `item` towards `goal` against a static `other`.
    fn detect(item: Rect, other: Rect, goal: Vec2) -> Option<Contact>;
}
