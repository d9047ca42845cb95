//! Snapshot-then-apply helpers for a game loop.
//!
//! Take `World::handles()` at the start of a tick, skip any handle that is no
//! longer `contains`-ed when its turn comes, and queue structural changes in a
//! [`Deferred`] buffer that is flushed with [`World::apply`] once every entity
//! has run.

use tracing::debug;

use crate::api::WorldApi;
use crate::error::Result;
use crate::types::{Handle, Rect};
use crate::world::World;

/// Adds and removes queued during a tick.
#[derive(Debug)]
pub struct Deferred<T> {
    adds: Vec<(T, Rect)>,
    removes: Vec<Handle>,
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self { adds: Vec::new(), removes: Vec::new() }
    }
}

impl<T> Deferred<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, user_data: T, rect: Rect) {
        self.adds.push((user_data, rect));
    }

    /// Queue a removal. Queuing the same handle twice removes it once.
    pub fn remove(&mut self, handle: Handle) {
        if !self.removes.contains(&handle) {
            self.removes.push(handle);
        }
    }

    pub fn is_removing(&self, handle: Handle) -> bool {
        self.removes.contains(&handle)
    }

    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.adds.len() + self.removes.len()
    }
}

impl<T> World<T> {
    /// Flush queued changes: removals first, then additions.
    ///
    /// Returns the handles of the added items in queue order. Stops at the
    /// first error; changes applied before it stay applied.
    pub fn apply(&mut self, deferred: Deferred<T>) -> Result<Vec<Handle>> {
        let Deferred { adds, removes } = deferred;
        debug!(adds = adds.len(), removes = removes.len(), "applying deferred changes");
        for handle in removes {
            self.remove(handle)?;
        }
        adds.into_iter().map(|(data, rect)| self.add(data, rect)).collect()
    }
}
