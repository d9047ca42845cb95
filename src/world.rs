use glam::Vec2;
use slotmap::SlotMap;
use tracing::debug;

use crate::api::WorldApi;
use crate::error::{Error, Result};
use crate::filter::{CollisionFilter, QueryFilter};
use crate::grid::SpatialIndex;
use crate::sweep::Resolver;
use crate::types::*;

/// Persistent collision world: item table, user data and the grid index.
///
/// All mutation goes through `&mut self`, so a sweep always runs to completion
/// against a consistent grid before anything else can observe it.
pub struct World<T> {
    cfg: WorldConfig,
    items: SlotMap<Handle, T>,
    index: SpatialIndex,
}

impl<T> WorldApi<T> for World<T> {
    fn new(cfg: WorldConfig) -> Result<Self> {
        cfg.validate()?;
        debug!(cell_size = cfg.cell_size, "collision world created");
        Ok(Self {
            index: SpatialIndex::new(cfg.cell_size),
            items: SlotMap::with_key(),
            cfg,
        })
    }

    fn add(&mut self, user_data: T, rect: Rect) -> Result<Handle> {
        if !rect.is_valid() {
            return Err(Error::InvalidRect { rect });
        }
        let handle = self.items.insert(user_data);
        if let Err(e) = self.index.add(handle, rect) {
            self.items.remove(handle);
            return Err(e);
        }
        debug!(?handle, ?rect, "item added");
        Ok(handle)
    }

    fn remove(&mut self, handle: Handle) -> Result<T> {
        self.index.remove(handle)?;
        let data = self.items.remove(handle).ok_or(Error::NotFound(handle))?;
        debug!(?handle, "item removed");
        Ok(data)
    }

    fn update(&mut self, handle: Handle, rect: Rect) -> Result<()> {
        self.index.update(handle, rect)
    }

    fn move_item<F>(&mut self, handle: Handle, goal: Vec2, filter: &F) -> Result<MoveResult>
    where
        F: CollisionFilter<T> + ?Sized,
    {
        let result = self.check(handle, goal, filter)?;
        self.index.update(handle, result.rect)?;
        Ok(result)
    }

    fn check<F>(&self, handle: Handle, goal: Vec2, filter: &F) -> Result<MoveResult>
    where
        F: CollisionFilter<T> + ?Sized,
    {
        Resolver::new(&self.index, &self.items).resolve(handle, goal, filter)
    }

    fn project<F>(&self, handle: Handle, from: Rect, goal: Vec2, filter: &F) -> Result<Vec<Collision>>
    where
        F: CollisionFilter<T> + ?Sized,
    {
        if !from.is_valid() || !self.index.in_bounds(&from) {
            return Err(Error::InvalidRect { rect: from });
        }
        Resolver::new(&self.index, &self.items).project(handle, from, goal, filter)
    }

    fn query_segment<Q>(&self, a: Vec2, b: Vec2, filter: &Q) -> Vec<SegmentHit>
    where
        Q: QueryFilter<T> + ?Sized,
    {
        self.index
            .query_segment(a, b)
            .into_iter()
            .filter(|hit| filter.accept(hit.handle, &self.items[hit.handle]))
            .collect()
    }

    fn query_rect<Q>(&self, rect: Rect, filter: &Q) -> Vec<Handle>
    where
        Q: QueryFilter<T> + ?Sized,
    {
        self.index
            .query_rect(&rect)
            .into_iter()
            .filter(|&h| {
                self.index.rect(h).is_ok_and(|r| r.intersects(&rect)) && filter.accept(h, &self.items[h])
            })
            .collect()
    }

    fn query_point<Q>(&self, p: Vec2, filter: &Q) -> Vec<Handle>
    where
        Q: QueryFilter<T> + ?Sized,
    {
        self.index
            .query_point(p)
            .into_iter()
            .filter(|&h| filter.accept(h, &self.items[h]))
            .collect()
    }

    fn get_rect(&self, handle: Handle) -> Result<Rect> {
        self.index.rect(handle)
    }
}

impl<T> World<T> {
    /// Convenience: world with the given cell size.
    pub fn with_cell_size(cell_size: f32) -> Result<Self> {
        <Self as WorldApi<T>>::new(WorldConfig::with_cell_size(cell_size))
    }

    pub fn config(&self) -> &WorldConfig {
        &self.cfg
    }

    pub fn get(&self, handle: Handle) -> Result<&T> {
        self.items.get(handle).ok_or(Error::NotFound(handle))
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut T> {
        self.items.get_mut(handle).ok_or(Error::NotFound(handle))
    }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.items.contains_key(handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot of live handles in insertion order.
    pub fn handles(&self) -> Vec<Handle> {
        self.index.handles()
    }

    /// Live items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, Rect, &T)> + '_ {
        self.handles().into_iter().filter_map(move |h| {
            let rect = self.index.rect(h).ok()?;
            Some((h, rect, &self.items[h]))
        })
    }

    /// Read-only access to the broad phase, for debugging and diagnostics.
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}
