use crate::types::{Handle, Rect};

/// Usage errors. All of them indicate a caller bug and are reported immediately.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("rect {rect:?} must have positive size and finite, in-range coordinates")]
    InvalidRect { rect: Rect },
    #[error("no item for handle {0:?} (never added or already removed)")]
    NotFound(Handle),
    #[error("handle {0:?} is already present in the index")]
    DuplicateHandle(Handle),
    #[error("goal ({x}, {y}) must be finite and within the grid range")]
    InvalidGoal { x: f32, y: f32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
