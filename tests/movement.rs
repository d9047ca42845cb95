use glam::Vec2;
use nobump::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Kind {
    Player,
    Block,
    Enemy,
    Bullet,
}

impl Kinded for Kind {
    type Kind = Kind;
    fn kind(&self) -> Kind {
        *self
    }
}

fn platformer_rules() -> PairTable<Kind> {
    PairTable::new()
        .with(Kind::Player, Kind::Block, Response::Slide)
        .with(Kind::Player, Kind::Enemy, Response::Cross)
        .with(Kind::Enemy, Kind::Block, Response::Slide)
        .with(Kind::Enemy, Kind::Enemy, Response::Slide)
        .with(Kind::Bullet, Kind::Enemy, Response::Cross)
}

fn new_world() -> World<Kind> {
    World::new(WorldConfig::with_cell_size(100.0)).unwrap()
}

#[test]
fn zero_move_without_neighbours_is_idempotent() {
    let mut w = new_world();
    let r = Rect::new(10.0, 20.0, 70.0, 130.0);
    let p = w.add(Kind::Player, r).unwrap();
    let res = w.move_item(p, r.min(), &platformer_rules()).unwrap();
    assert!(res.collisions.is_empty());
    assert_eq!(res.rect, r);
    assert_eq!(w.get_rect(p).unwrap(), r);
}

#[test]
fn slide_on_x_edge_applies_full_y_displacement() {
    let mut w = new_world();
    let p = w.add(Kind::Player, Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
    w.add(Kind::Block, Rect::new(60.0, -500.0, 100.0, 1000.0)).unwrap();

    let res = w.move_item(p, Vec2::new(30.0, 40.0), &platformer_rules()).unwrap();
    assert_eq!(res.collisions.len(), 1);
    let hit = res.collisions[0];
    assert!(hit.normal.x != 0.0);
    assert_eq!(hit.normal.y, 0.0);
    assert!((res.rect.x - 10.0).abs() < 1e-3);
    assert!((res.rect.y - 40.0).abs() < 1e-3);

    // Caller reaction: zero the blocked velocity component
    let mut vel = Vec2::new(300.0, 400.0);
    for c in &res.collisions {
        if c.normal.x != 0.0 {
            vel.x = 0.0;
        }
    }
    assert_eq!(vel, Vec2::new(0.0, 400.0));
}

#[test]
fn cross_neighbour_does_not_block() {
    let mut w = new_world();
    let b = w.add(Kind::Bullet, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    let e = w.add(Kind::Enemy, Rect::new(100.0, -40.0, 90.0, 90.0)).unwrap();
    let goal = Vec2::new(400.0, 0.0);

    let res = w.move_item(b, goal, &platformer_rules()).unwrap();
    assert_eq!(res.rect, Rect::from_min_size(goal, Vec2::splat(10.0)));
    assert_eq!(res.collisions.len(), 1);
    assert_eq!(res.collisions[0].other, e);
    assert_eq!(res.collisions[0].response, Response::Cross);
}

#[test]
fn collisions_are_ordered_by_time_of_impact() {
    let mut w = new_world();
    let b = w.add(Kind::Bullet, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    let late = w.add(Kind::Enemy, Rect::new(600.0, 0.0, 20.0, 20.0)).unwrap();
    let early = w.add(Kind::Enemy, Rect::new(200.0, 0.0, 20.0, 20.0)).unwrap();

    let res = w.move_item(b, Vec2::new(1000.0, 0.0), &platformer_rules()).unwrap();
    assert_eq!(res.collisions.len(), 2);
    assert_eq!(res.collisions[0].other, early);
    assert_eq!(res.collisions[1].other, late);
    assert!(res.collisions[0].toi < res.collisions[1].toi);
}

#[test]
fn segment_query_reports_entry_at_near_face() {
    let mut w = new_world();
    let target = w.add(Kind::Block, Rect::new(500.0, -10.0, 100.0, 20.0)).unwrap();
    let hits = w.query_segment(Vec2::ZERO, Vec2::new(1000.0, 0.0), &any());
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].handle, target);
    assert!((hits[0].entry_time - 0.5).abs() < 1e-5);
    assert!((hits[0].entry.x - 500.0).abs() < 1e-2);
    assert!((hits[0].exit_time - 0.6).abs() < 1e-5);
}

#[test]
fn segment_query_skips_rejected_and_sorts_by_distance() {
    let mut w = new_world();
    let far = w.add(Kind::Enemy, Rect::new(700.0, -10.0, 50.0, 20.0)).unwrap();
    w.add(Kind::Block, Rect::new(300.0, -10.0, 50.0, 20.0)).unwrap();
    let near = w.add(Kind::Enemy, Rect::new(100.0, -10.0, 50.0, 20.0)).unwrap();
    let enemies = |_: Handle, k: &Kind| *k == Kind::Enemy;
    let hits = w.query_segment(Vec2::ZERO, Vec2::new(1000.0, 0.0), &enemies);
    let order: Vec<Handle> = hits.iter().map(|h| h.handle).collect();
    assert_eq!(order, vec![near, far]);
}

#[test]
fn add_then_get_then_remove() {
    let mut w = new_world();
    let r = Rect::new(-33.5, 12.25, 7.0, 9.0);
    let h = w.add(Kind::Block, r).unwrap();
    assert_eq!(w.get_rect(h).unwrap(), r);
    w.remove(h).unwrap();
    assert_eq!(w.get_rect(h), Err(Error::NotFound(h)));
}

#[test]
fn landing_reports_floor_normal_and_ground_check_sees_it() {
    let mut w = new_world();
    let rules = platformer_rules();
    let p = w.add(Kind::Player, Rect::new(0.0, 150.0, 70.0, 130.0)).unwrap();
    for i in -2..5 {
        w.add(Kind::Block, Rect::new(i as f32 * 100.0, 0.0, 100.0, 100.0)).unwrap();
    }

    // Falling onto a row of tiles, drifting right
    let res = w.move_item(p, Vec2::new(20.0, 80.0), &rules).unwrap();
    assert!(res.collisions.iter().any(|c| c.normal.y == 1.0));
    assert!((res.rect.y - 100.0).abs() < 1e-3);
    assert!((res.rect.x - 20.0).abs() < 1e-3);

    let rect = w.get_rect(p).unwrap();
    let below = w.project(p, rect, rect.min() - Vec2::new(0.0, 0.1), &rules).unwrap();
    assert!(!below.is_empty());

    // Walking along the floor meets nothing
    let res = w.move_item(p, rect.min() + Vec2::new(150.0, 0.0), &rules).unwrap();
    assert!(res.collisions.is_empty());
}

#[test]
fn stomp_is_distinguished_from_side_hit() {
    let mut w = new_world();
    let rules = platformer_rules();
    let p = w.add(Kind::Player, Rect::new(0.0, 200.0, 70.0, 130.0)).unwrap();
    let e = w.add(Kind::Enemy, Rect::new(0.0, 0.0, 90.0, 90.0)).unwrap();
    let res = w.move_item(p, Vec2::new(0.0, 50.0), &rules).unwrap();
    let stomp = res.collisions.iter().find(|c| c.other == e).unwrap();
    assert_eq!(stomp.normal, Vec2::new(0.0, 1.0));
    assert!(!stomp.overlaps);
    // Cross: the player passes into the enemy
    assert_eq!(res.rect.y, 50.0);
}

#[test]
fn enemies_slide_off_each_other() {
    let mut w = new_world();
    let rules = platformer_rules();
    let a = w.add(Kind::Enemy, Rect::new(0.0, 0.0, 90.0, 90.0)).unwrap();
    let b = w.add(Kind::Enemy, Rect::new(150.0, 0.0, 90.0, 90.0)).unwrap();
    let res = w.move_item(a, Vec2::new(100.0, 0.0), &rules).unwrap();
    assert_eq!(res.collisions.len(), 1);
    assert_eq!(res.collisions[0].other, b);
    assert_eq!(res.collisions[0].normal, Vec2::NEG_X);
    assert!((res.rect.x - 60.0).abs() < 1e-3);
}
