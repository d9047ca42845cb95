//! Per-pair response policies.
//!
//! A filter is consulted for every candidate pair before any geometry is
//! tested. Returning `None` ignores the pair completely: it is neither
//! resolved nor reported.

use std::collections::HashMap;
use std::hash::Hash;

use crate::types::{Handle, Response};

/// Maps an (item, neighbour) pair of user data to a response.
pub trait CollisionFilter<T> {
    fn filter(&self, item: &T, other: &T) -> Option<Response>;
}

impl<T, F> CollisionFilter<T> for F
where
    F: Fn(&T, &T) -> Option<Response>,
{
    #[inline]
    fn filter(&self, item: &T, other: &T) -> Option<Response> {
        self(item, other)
    }
}

/// Predicate for queries that have no moving item (segments, rects, points).
pub trait QueryFilter<T> {
    fn accept(&self, handle: Handle, data: &T) -> bool;
}

impl<T, F> QueryFilter<T> for F
where
    F: Fn(Handle, &T) -> bool,
{
    #[inline]
    fn accept(&self, handle: Handle, data: &T) -> bool {
        self(handle, data)
    }
}

/// Query filter accepting every item.
#[derive(Copy, Clone, Debug, Default)]
pub struct Any;

impl<T> QueryFilter<T> for Any {
    #[inline]
    fn accept(&self, _handle: Handle, _data: &T) -> bool {
        true
    }
}

/// Shorthand for [`Any`].
pub fn any() -> Any {
    Any
}

/// User data carrying an explicit kind tag.
pub trait Kinded {
    type Kind: Copy + Eq + Hash;
    fn kind(&self) -> Self::Kind;
}

/// Lookup table from `(item kind, other kind)` to a response.
///
/// Pairs absent from the table are ignored. Rules are directional:
/// `(Player, Enemy)` says nothing about `(Enemy, Player)`.
#[derive(Clone, Debug)]
pub struct PairTable<K> {
    rules: HashMap<(K, K), Response>,
}

impl<K: Copy + Eq + Hash> Default for PairTable<K> {
    fn default() -> Self {
        Self { rules: HashMap::new() }
    }
}

impl<K: Copy + Eq + Hash> PairTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style rule insertion; later rules for the same pair win.
    pub fn with(mut self, item: K, other: K, response: Response) -> Self {
        self.rules.insert((item, other), response);
        self
    }

    /// Same response both ways.
    pub fn with_symmetric(self, a: K, b: K, response: Response) -> Self {
        self.with(a, b, response).with(b, a, response)
    }

    pub fn set(&mut self, item: K, other: K, response: Response) {
        self.rules.insert((item, other), response);
    }

    pub fn lookup(&self, item: K, other: K) -> Option<Response> {
        self.rules.get(&(item, other)).copied()
    }
}

impl<T: Kinded> CollisionFilter<T> for PairTable<T::Kind> {
    #[inline]
    fn filter(&self, item: &T, other: &T) -> Option<Response> {
        self.lookup(item.kind(), other.kind())
    }
}
