//! nobump: persistent 2D AABB world with swept movement and per-pair responses

pub mod types;
pub mod error;
pub mod api;
pub mod filter;
pub mod grid;
pub mod narrowphase;
pub mod sweep;
pub mod tick;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::{Error, Result};
pub use crate::filter::{any, Any, CollisionFilter, Kinded, PairTable, QueryFilter};
pub use crate::grid::SpatialIndex;
pub use crate::tick::Deferred;
pub use crate::world::World;
