use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::types::Rect;

/// Tolerance for "strictly inside" and degenerate-interval checks.
pub const DELTA: f32 = 1e-5;

/// Parametric interval where a segment crosses a rect.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SlabHit {
    pub t_enter: f32,
    pub t_exit: f32,
    /// Normal of the face entered (zero if the interval start was not clipped).
    pub n_enter: Vec2,
    /// Normal of the face exited (zero if the interval end was not clipped).
    pub n_exit: Vec2,
}

/// Raw contact between a moving rect and a static one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact {
    /// Fraction of the motion at first contact; zero when `overlaps`.
    pub toi: f32,
    pub normal: Vec2,
    pub touch: Vec2,
    pub overlaps: bool,
    pub motion: Vec2,
}

pub struct Narrowphase;

#[inline]
fn nearest(x: f32, a: f32, b: f32) -> f32 {
    if (a - x).abs() < (b - x).abs() { a } else { b }
}

/// Put the contact coordinate on the normal axis exactly on `other`'s face.
fn snap_to_face(mut touch: Vec2, normal: Vec2, item: Rect, other: Rect) -> Vec2 {
    if normal.x < 0.0 {
        touch.x = other.x - item.w;
    } else if normal.x > 0.0 {
        touch.x = other.x + other.w;
    } else if normal.y < 0.0 {
        touch.y = other.y - item.h;
    } else if normal.y > 0.0 {
        touch.y = other.y + other.h;
    }
    touch
}

impl NarrowphaseApi for Narrowphase {
    fn segment_intersection(rect: Rect, a: Vec2, b: Vec2, t_lo: f32, t_hi: f32) -> Option<SlabHit> {
        // Liang–Barsky over the four faces; p is the directed speed towards the face
        let d = b - a;
        let mut t_enter = t_lo;
        let mut t_exit = t_hi;
        let mut n_enter = Vec2::ZERO;
        let mut n_exit = Vec2::ZERO;

        let faces = [
            (Vec2::NEG_X, -d.x, a.x - rect.x),
            (Vec2::X, d.x, rect.x + rect.w - a.x),
            (Vec2::NEG_Y, -d.y, a.y - rect.y),
            (Vec2::Y, d.y, rect.y + rect.h - a.y),
        ];
        for (n, p, q) in faces {
            if p == 0.0 {
                // Parallel: must be strictly inside this slab
                if q <= 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    if r > t_exit {
                        return None;
                    } else if r > t_enter {
                        t_enter = r;
                        n_enter = n;
                    }
                } else if r < t_enter {
                    return None;
                } else if r < t_exit {
                    t_exit = r;
                    n_exit = n;
                }
            }
        }
        Some(SlabHit { t_enter, t_exit, n_enter, n_exit })
    }

    fn minkowski_diff(item: Rect, other: Rect) -> Rect {
        Rect::new(
            other.x - item.x - item.w,
            other.y - item.y - item.h,
            item.w + other.w,
            item.h + other.h,
        )
    }

    fn nearest_corner(rect: Rect, p: Vec2) -> Vec2 {
        Vec2::new(
            nearest(p.x, rect.x, rect.x + rect.w),
            nearest(p.y, rect.y, rect.y + rect.h),
        )
    }

    fn contains_point(rect: Rect, p: Vec2) -> bool {
        p.x - rect.x > DELTA
            && p.y - rect.y > DELTA
            && rect.x + rect.w - p.x > DELTA
            && rect.y + rect.h - p.y > DELTA
    }

    fn detect(item: Rect, other: Rect, goal: Vec2) -> Option<Contact> {
        let start = item.min();
        let motion = goal - start;
        let diff = Self::minkowski_diff(item, other);

        if Self::contains_point(diff, Vec2::ZERO) {
            // Already overlapping: push out along the axis of least penetration
            let corner = Self::nearest_corner(diff, Vec2::ZERO);
            let (px, py) = (corner.x.abs(), corner.y.abs());
            let along_x = if px != py {
                px < py
            } else {
                motion.x.abs() >= motion.y.abs()
            };
            let (push, normal) = if along_x {
                (Vec2::new(corner.x, 0.0), Vec2::new(corner.x.signum(), 0.0))
            } else {
                (Vec2::new(0.0, corner.y), Vec2::new(0.0, corner.y.signum()))
            };
            return Some(Contact {
                toi: 0.0,
                normal,
                touch: snap_to_face(start + push, normal, item, other),
                overlaps: true,
                motion,
            });
        }

        let hit = Self::segment_intersection(diff, Vec2::ZERO, motion, f32::NEG_INFINITY, f32::INFINITY)?;
        let entering = 0.0 < hit.t_enter + DELTA || (hit.t_enter == 0.0 && hit.t_exit > 0.0);
        if hit.t_enter < 1.0 && (hit.t_exit - hit.t_enter).abs() >= DELTA && entering {
            Some(Contact {
                toi: hit.t_enter.max(0.0),
                normal: hit.n_enter,
                touch: snap_to_face(start + motion * hit.t_enter, hit.n_enter, item, other),
                overlaps: false,
                motion,
            })
        } else {
            None
        }
    }
}
