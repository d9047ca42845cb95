use glam::Vec2;
use nobump::*;
use std::time::Instant;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f32 {
    lcg(seed) as f32 / u32::MAX as f32
}

fn main() -> Result<()> {
    let cell_size = 4.0;
    let mut world: World<Vec2> = World::new(WorldConfig::with_cell_size(cell_size))?;

    let n = 20_000usize; // number of movers
    let mut seed = 1u32;
    let t0 = Instant::now();
    for _ in 0..n {
        let rx = unit(&mut seed) * 400.0 - 200.0;
        let ry = unit(&mut seed) * 400.0 - 200.0;
        let vx = unit(&mut seed) * 4.0 - 2.0;
        let vy = unit(&mut seed) * 4.0 - 2.0;
        world.add(Vec2::new(vx, vy), Rect::new(rx, ry, 0.5, 0.5))?;
    }
    let t_add = t0.elapsed();

    let slide = |_: &Vec2, _: &Vec2| Some(Response::Slide);
    let frames = 10;
    let mut n_collisions = 0usize;
    let t1 = Instant::now();
    for _ in 0..frames {
        for h in world.handles() {
            let rect = world.get_rect(h)?;
            let vel = *world.get(h)?;
            let res = world.move_item(h, rect.min() + vel / 60.0, &slide)?;
            n_collisions += res.collisions.len();
        }
    }
    let t_move = t1.elapsed();

    let t2 = Instant::now();
    let mut n_hits = 0usize;
    for i in 0..1000 {
        let a = Vec2::new(-200.0, i as f32 * 0.4 - 200.0);
        n_hits += world.query_segment(a, a + Vec2::new(400.0, 0.0), &any()).len();
    }
    let t_seg = t2.elapsed();

    let stats = world.stats();
    println!(
        "N={} cell_size={} add={:?} move={:?} ({} frames, {} collisions) segments={:?} ({} hits) cells={} memberships={}",
        n, cell_size, t_add, t_move, frames, n_collisions, t_seg, n_hits, stats.cells, stats.memberships
    );
    Ok(())
}
