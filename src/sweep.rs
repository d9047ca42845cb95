//! Sweep resolver: turns a goal position into a corrected rect plus the
//! ordered contacts met on the way.

use glam::Vec2;
use slotmap::SlotMap;
use tracing::trace;

use std::collections::HashSet;

use crate::api::NarrowphaseApi;
use crate::error::{Error, Result};
use crate::filter::CollisionFilter;
use crate::grid::SpatialIndex;
use crate::narrowphase::Narrowphase;
use crate::types::*;

/// What the resolver does after applying one response.
enum Step {
    /// Final goal reached; stop resolving.
    Stop(Vec2),
    /// Re-project from `start` towards `goal`.
    Continue { start: Vec2, goal: Vec2 },
}

/// Borrowed view over the index and the user data it refers to.
pub struct Resolver<'a, T> {
    index: &'a SpatialIndex,
    items: &'a SlotMap<Handle, T>,
}

impl<'a, T> Resolver<'a, T> {
    pub fn new(index: &'a SpatialIndex, items: &'a SlotMap<Handle, T>) -> Self {
        Self { index, items }
    }

    /// Single pass: every contact between `from` swept to `goal` and the
    /// neighbours the filter accepts, sorted by time of impact.
    pub fn project<F>(&self, handle: Handle, from: Rect, goal: Vec2, filter: &F) -> Result<Vec<Collision>>
    where
        F: CollisionFilter<T> + ?Sized,
    {
        let mut exclude = HashSet::new();
        exclude.insert(handle);
        self.project_excluding(handle, from, goal, filter, &exclude)
    }

    /// Full resolution loop. Does not mutate; the caller commits `rect`.
    pub fn resolve<F>(&self, handle: Handle, goal: Vec2, filter: &F) -> Result<MoveResult>
    where
        F: CollisionFilter<T> + ?Sized,
    {
        let rect = self.index.rect(handle)?;
        if !goal.is_finite() || !self.index.in_bounds(&rect.at(goal)) {
            return Err(Error::InvalidGoal { x: goal.x, y: goal.y });
        }
        let mut start = rect.min();
        let mut goal = goal;

        let mut visited = HashSet::new();
        visited.insert(handle);
        let mut collisions = Vec::new();
        let mut projected = self.project_excluding(handle, rect, goal, filter, &visited)?;

        // Each round marks one more neighbour visited, so this terminates
        while let Some(&first) = projected.first() {
            let mut col = first;
            visited.insert(col.other);
            let step = respond(&mut col, start, goal);
            collisions.push(col);
            match step {
                Step::Stop(g) => {
                    goal = g;
                    break;
                }
                Step::Continue { start: s, goal: g } => {
                    start = s;
                    goal = g;
                    projected = self.project_excluding(handle, rect.at(start), goal, filter, &visited)?;
                }
            }
        }

        trace!(?handle, collisions = collisions.len(), x = goal.x, y = goal.y, "sweep resolved");
        Ok(MoveResult { rect: rect.at(goal), collisions })
    }

    fn project_excluding<F>(
        &self,
        handle: Handle,
        from: Rect,
        goal: Vec2,
        filter: &F,
        exclude: &HashSet<Handle>,
    ) -> Result<Vec<Collision>>
    where
        F: CollisionFilter<T> + ?Sized,
    {
        if !goal.is_finite() || !self.index.in_bounds(&from.at(goal)) {
            return Err(Error::InvalidGoal { x: goal.x, y: goal.y });
        }
        let item_data = self.items.get(handle).ok_or(Error::NotFound(handle))?;
        let query = from.union(&from.at(goal));

        let mut out = Vec::new();
        for other in self.index.query_rect(&query) {
            if exclude.contains(&other) {
                continue;
            }
            let other_data = self.items.get(other).ok_or(Error::NotFound(other))?;
            let Some(response) = filter.filter(item_data, other_data) else { continue };
            let other_rect = self.index.rect(other)?;
            let Some(contact) = Narrowphase::detect(from, other_rect, goal) else { continue };
            out.push(Collision {
                item: handle,
                other,
                response,
                normal: contact.normal,
                toi: contact.toi,
                touch: contact.touch,
                overlaps: contact.overlaps,
                item_rect: from,
                other_rect,
                motion: contact.motion,
                redirect: None,
                seq: self.index.seq(other),
            });
        }
        out.sort_by(|a, b| a.toi.total_cmp(&b.toi).then(a.seq.cmp(&b.seq)));
        Ok(out)
    }
}

fn respond(col: &mut Collision, start: Vec2, goal: Vec2) -> Step {
    match col.response {
        Response::Touch => Step::Stop(col.touch),
        Response::Cross => Step::Continue { start, goal },
        Response::Slide => {
            // Clip along the normal axis; also pushes a resting overlap out
            let mut g = goal;
            if col.normal.x != 0.0 {
                g.x = col.touch.x;
            } else {
                g.y = col.touch.y;
            }
            col.redirect = Some(g);
            Step::Continue { start: col.touch, goal: g }
        }
        Response::Bounce => {
            let t = col.touch;
            let mut b = t;
            if col.motion != Vec2::ZERO {
                let mut rest = goal - t;
                if col.normal.x == 0.0 {
                    rest.y = -rest.y;
                } else {
                    rest.x = -rest.x;
                }
                b = t + rest;
            }
            col.redirect = Some(b);
            Step::Continue { start: t, goal: b }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, PartialEq)]
    enum Tag {
        Mover,
        Wall,
        Ghost,
        Pad,
        Sensor,
    }

    struct Fixture {
        index: SpatialIndex,
        items: SlotMap<Handle, Tag>,
    }

    impl Fixture {
        fn new(cell: f32) -> Self {
            Self { index: SpatialIndex::new(cell), items: SlotMap::with_key() }
        }

        fn add(&mut self, tag: Tag, rect: Rect) -> Handle {
            let h = self.items.insert(tag);
            self.index.add(h, rect).unwrap();
            h
        }

        fn resolver(&self) -> Resolver<'_, Tag> {
            Resolver::new(&self.index, &self.items)
        }
    }

    fn filter(_: &Tag, other: &Tag) -> Option<Response> {
        match other {
            Tag::Wall => Some(Response::Slide),
            Tag::Ghost => Some(Response::Cross),
            Tag::Pad => Some(Response::Bounce),
            Tag::Sensor => Some(Response::Touch),
            Tag::Mover => None,
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_slide_keeps_parallel_component() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        fx.add(Tag::Wall, Rect::new(20.0, -100.0, 10.0, 300.0));
        let res = fx.resolver().resolve(m, Vec2::new(15.0, 5.0), &filter).unwrap();
        assert_eq!(res.collisions.len(), 1);
        let c = res.collisions[0];
        assert_eq!(c.normal, Vec2::NEG_X);
        assert!(approx(res.rect.x, 10.0));
        assert!(approx(res.rect.y, 5.0));
        let redirect = c.redirect.unwrap();
        assert!(approx(redirect.x, 10.0) && approx(redirect.y, 5.0));
    }

    #[test]
    fn test_perpendicular_slides_compose_in_corner() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        // Right wall and ceiling
        fx.add(Tag::Wall, Rect::new(15.0, -50.0, 10.0, 100.0));
        fx.add(Tag::Wall, Rect::new(-50.0, 15.0, 100.0, 10.0));
        let res = fx.resolver().resolve(m, Vec2::new(20.0, 20.0), &filter).unwrap();
        assert_eq!(res.collisions.len(), 2);
        assert!(approx(res.rect.x, 5.0));
        assert!(approx(res.rect.y, 5.0));
        let normals: Vec<Vec2> = res.collisions.iter().map(|c| c.normal).collect();
        assert!(normals.contains(&Vec2::NEG_X) && normals.contains(&Vec2::NEG_Y));
    }

    #[test]
    fn test_cross_passes_through_and_reports() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        let g = fx.add(Tag::Ghost, Rect::new(20.0, 0.0, 10.0, 10.0));
        let res = fx.resolver().resolve(m, Vec2::new(50.0, 0.0), &filter).unwrap();
        assert_eq!(res.rect, Rect::new(50.0, 0.0, 10.0, 10.0));
        assert_eq!(res.collisions.len(), 1);
        assert_eq!(res.collisions[0].other, g);
        assert_eq!(res.collisions[0].response, Response::Cross);
    }

    #[test]
    fn test_touch_stops_at_contact() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        fx.add(Tag::Sensor, Rect::new(20.0, 0.0, 10.0, 10.0));
        fx.add(Tag::Ghost, Rect::new(40.0, 0.0, 10.0, 10.0));
        let res = fx.resolver().resolve(m, Vec2::new(60.0, 0.0), &filter).unwrap();
        assert_eq!(res.collisions.len(), 1);
        assert!(approx(res.rect.x, 10.0));
    }

    #[test]
    fn test_bounce_reflects_remaining_motion() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        fx.add(Tag::Pad, Rect::new(20.0, -100.0, 10.0, 300.0));
        let res = fx.resolver().resolve(m, Vec2::new(16.0, 4.0), &filter).unwrap();
        assert_eq!(res.collisions.len(), 1);
        // Contact at x=10 after 10 of 16; the remaining 6 is reflected
        assert!(approx(res.rect.x, 4.0));
        assert!(approx(res.rect.y, 4.0));
    }

    #[test]
    fn test_ordering_by_time_of_impact() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        // Inserted far one first
        let far = fx.add(Tag::Ghost, Rect::new(60.0, 0.0, 10.0, 10.0));
        let near = fx.add(Tag::Ghost, Rect::new(20.0, 0.0, 10.0, 10.0));
        let res = fx.resolver().resolve(m, Vec2::new(100.0, 0.0), &filter).unwrap();
        let others: Vec<Handle> = res.collisions.iter().map(|c| c.other).collect();
        assert_eq!(others, vec![near, far]);
        assert!(res.collisions[0].toi < res.collisions[1].toi);
    }

    #[test]
    fn test_equal_time_of_impact_keeps_insertion_order() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        // Both faces sit at x=20; the taller one is added first and its centre is farther
        let first = fx.add(Tag::Ghost, Rect::new(20.0, -40.0, 10.0, 45.0));
        let second = fx.add(Tag::Ghost, Rect::new(20.0, 0.0, 10.0, 10.0));
        let res = fx.resolver().resolve(m, Vec2::new(100.0, 0.0), &filter).unwrap();
        let others: Vec<Handle> = res.collisions.iter().map(|c| c.other).collect();
        assert_eq!(others, vec![first, second]);
        assert_eq!(res.collisions[0].toi, res.collisions[1].toi);
    }

    #[test]
    fn test_starting_overlaps_share_zero_toi_in_insertion_order() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        let shallow = fx.add(Tag::Ghost, Rect::new(9.0, 0.0, 10.0, 10.0));
        let deep = fx.add(Tag::Ghost, Rect::new(2.0, 2.0, 6.0, 6.0));
        let projected = fx.resolver().project(m, Rect::new(0.0, 0.0, 10.0, 10.0), Vec2::ZERO, &filter).unwrap();
        let others: Vec<Handle> = projected.iter().map(|c| c.other).collect();
        assert_eq!(others, vec![shallow, deep]);
        assert!(projected.iter().all(|c| c.overlaps && c.toi == 0.0));
    }

    #[test]
    fn test_resting_overlap_pushed_out_by_slide() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 8.0, 10.0, 10.0));
        fx.add(Tag::Wall, Rect::new(-50.0, 0.0, 100.0, 10.0));
        let res = fx.resolver().resolve(m, Vec2::new(0.0, 8.0), &filter).unwrap();
        assert_eq!(res.collisions.len(), 1);
        assert!(res.collisions[0].overlaps);
        assert_eq!(res.collisions[0].toi, 0.0);
        assert_eq!(res.collisions[0].normal, Vec2::Y);
        assert!(approx(res.rect.y, 10.0));
    }

    #[test]
    fn test_ignored_pairs_are_not_reported() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        fx.add(Tag::Mover, Rect::new(20.0, 0.0, 10.0, 10.0));
        let res = fx.resolver().resolve(m, Vec2::new(40.0, 0.0), &filter).unwrap();
        assert!(res.collisions.is_empty());
        assert_eq!(res.rect.x, 40.0);
    }

    #[test]
    fn test_index_entry_without_user_data_is_an_error() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        let orphan = fx.add(Tag::Wall, Rect::new(20.0, 0.0, 10.0, 10.0));
        fx.items.remove(orphan);
        let err = fx.resolver().resolve(m, Vec2::new(40.0, 0.0), &filter).unwrap_err();
        assert_eq!(err, Error::NotFound(orphan));
    }

    #[test]
    fn test_non_finite_goal_rejected() {
        let mut fx = Fixture::new(16.0);
        let m = fx.add(Tag::Mover, Rect::new(0.0, 0.0, 10.0, 10.0));
        let err = fx.resolver().resolve(m, Vec2::new(f32::NAN, 0.0), &filter).unwrap_err();
        assert!(matches!(err, Error::InvalidGoal { .. }));
    }
}
