use glam::Vec2;
use nobump::*;

fn main() -> Result<()> {
    let mut world = World::new(WorldConfig::with_cell_size(1.0))?;

    world.add(10u32, Rect::new(1.5, -0.5, 1.0, 1.0))?;
    world.add(20u32, Rect::new(3.5, -0.5, 1.0, 1.0))?;
    world.add(30u32, Rect::new(3.5, 2.0, 1.0, 1.0))?;

    let hits = world.query_segment(Vec2::ZERO, Vec2::new(100.0, 0.0), &any());
    if hits.is_empty() {
        println!("No hit");
    }
    for hit in &hits {
        let key = world.get(hit.handle)?;
        println!(
            "Segment hit id={:?} key={} t=[{:.3}, {:.3}] entry=({:.2},{:.2})",
            hit.handle, key, hit.entry_time, hit.exit_time, hit.entry.x, hit.entry.y
        );
    }

    let odd = |_: Handle, key: &u32| *key != 10;
    if let Some(first) = world.query_segment(Vec2::ZERO, Vec2::new(100.0, 0.0), &odd).first() {
        println!("First past key 10: key={} t={:.3}", world.get(first.handle)?, first.entry_time);
    }
    Ok(())
}
