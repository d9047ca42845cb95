use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

slotmap::new_key_type! {
    /// Stable, generational handle for an item stored in a [`World`](crate::World).
    ///
    /// A removed handle is never handed out again, so using one after removal
    /// reports [`Error::NotFound`](crate::Error::NotFound) instead of aliasing a new item.
    pub struct Handle;
}

/// Axis-aligned rectangle: min corner (`x`, `y`) plus size (`w`, `h`).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::new(min.x, min.y, size.x, size.y)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.w, self.y + self.h)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Same size, min corner moved to `pos`.
    #[inline]
    pub fn at(&self, pos: Vec2) -> Self {
        Self::new(pos.x, pos.y, self.w, self.h)
    }

    /// Smallest rect containing both.
    pub fn union(&self, other: &Rect) -> Self {
        let min = self.min().min(other.min());
        let max = self.max().max(other.max());
        Self::from_min_size(min, max - min)
    }

    /// Positive-area intersection; edges that only touch do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    /// Strict containment: points on the boundary are outside.
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x > self.x && p.x < self.x + self.w && p.y > self.y && p.y < self.y + self.h
    }

    /// Storable rects have positive size and finite coordinates.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
            && self.w > 0.0
            && self.h > 0.0
    }
}

/// How a detected pair affects the mover's path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Response {
    /// Stop at the contact point and end resolution.
    Touch,
    /// Report only; the path is unchanged.
    Cross,
    /// Clip motion along the normal axis, keep the parallel component.
    Slide,
    /// Stop at contact and reflect the remaining displacement on the normal axis.
    Bounce,
}

/// One resolved contact between the moving item and a neighbour.
#[derive(Copy, Clone, Debug)]
pub struct Collision {
    pub item: Handle,
    pub other: Handle,
    pub response: Response,
    /// Axis-aligned unit normal pointing from `other` towards `item`.
    pub normal: Vec2,
    /// Fraction of `motion` at first contact, in `[0, 1)`. Zero when `overlaps`.
    pub toi: f32,
    /// Item's min corner at contact (or after push-out when `overlaps`).
    pub touch: Vec2,
    /// The pair already overlapped at the start of the sweep.
    pub overlaps: bool,
    pub item_rect: Rect,
    pub other_rect: Rect,
    /// Displacement being resolved when this contact was found.
    pub motion: Vec2,
    /// New goal assigned by `Slide` or `Bounce`.
    pub redirect: Option<Vec2>,
    /// Insertion sequence of `other`; breaks `toi` ties.
    pub(crate) seq: u64,
}

/// Outcome of a sweep: where the item ended up and what it met on the way.
#[derive(Clone, Debug)]
pub struct MoveResult {
    pub rect: Rect,
    pub collisions: Vec<Collision>,
}

impl MoveResult {
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.rect.min()
    }

    pub fn is_empty(&self) -> bool {
        self.collisions.is_empty()
    }
}

/// Segment cast hit, sorted by distance from the segment start.
#[derive(Copy, Clone, Debug)]
pub struct SegmentHit {
    pub handle: Handle,
    /// Fraction along the segment where it enters the rect (0 if it starts inside).
    pub entry_time: f32,
    /// Fraction where it leaves the rect (1 if it ends inside).
    pub exit_time: f32,
    pub entry: Vec2,
    pub exit: Vec2,
}

/// World-level configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Grid cell size in world units. Tune to the typical item size.
    pub cell_size: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { cell_size: 64.0 }
    }
}

impl WorldConfig {
    pub fn with_cell_size(cell_size: f32) -> Self {
        Self { cell_size }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(crate::Error::InvalidConfig(format!(
                "cell_size must be positive and finite, got {}",
                self.cell_size
            )));
        }
        Ok(())
    }
}

/// Debug statistics for the spatial index.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub items: usize,
    /// Non-empty cells.
    pub cells: usize,
    /// Sum over items of the number of cells each occupies.
    pub memberships: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_union_and_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 5.0, 5.0);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, 0.0, 25.0, 10.0));
        assert!(!a.intersects(&b));
        // Edge contact is not an intersection
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(a.intersects(&Rect::new(9.0, 9.0, 5.0, 5.0)));
    }

    #[test]
    fn test_rect_validity() {
        assert!(Rect::new(-3.0, 2.0, 1.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, 1.0, -1.0).is_valid());
        assert!(!Rect::new(f32::NAN, 0.0, 1.0, 1.0).is_valid());
    }

    #[test]
    fn test_config_validation() {
        assert!(WorldConfig::default().validate().is_ok());
        assert!(WorldConfig::with_cell_size(0.0).validate().is_err());
        assert!(WorldConfig::with_cell_size(f32::INFINITY).validate().is_err());
    }
}
