//! Headless top-down shooter: a tank circles the arena while enemies home in on
//! it. Bullets cross enemies and kill them; a laser reports the first thing in
//! front of the turret each tick.

use glam::Vec2;
use nobump::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DT: f32 = 1.0 / 60.0;
const VIEW: Rect = Rect { x: 0.0, y: 0.0, w: 1600.0, h: 1200.0 };

const MOVE_SPEED: f32 = 300.0;
const ENEMY_SPEED: f32 = 150.0;
const BULLET_SPEED: f32 = 1200.0;
const BULLET_DELAY: f32 = 0.1;
const BULLET_START_DISTANCE: f32 = 120.0;
const BULLET_PUSH: f32 = 0.25;
const LASER_LENGTH: f32 = 800.0;
const SPAWN_DELAY: f32 = 0.75;
const DEATH_TIME: f32 = 1.0;
const DEATH_FRICTION: f32 = 100.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Kind {
    Player,
    Enemy,
    Bullet,
}

#[derive(Debug)]
struct Entity {
    kind: Kind,
    vel: Vec2,
    death_timer: f32,
}

impl Entity {
    fn new(kind: Kind, vel: Vec2) -> Self {
        Self { kind, vel, death_timer: 0.0 }
    }
}

impl Kinded for Entity {
    type Kind = Kind;
    fn kind(&self) -> Kind {
        self.kind
    }
}

struct Arena {
    world: World<Entity>,
    rules: PairTable<Kind>,
    player: Option<Handle>,
    seed: u32,
    time: f32,
    bullet_timer: f32,
    spawn_timer: f32,
    kills: u32,
    laser_hits: u32,
}

fn lcg(seed: &mut u32) -> f32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed as f32 / u32::MAX as f32
}

impl Arena {
    fn new() -> Result<Self> {
        let mut world = World::new(WorldConfig::with_cell_size(128.0))?;
        let center = VIEW.center();
        let player = world.add(
            Entity::new(Kind::Player, Vec2::ZERO),
            Rect::new(center.x - 50.0, center.y - 50.0, 100.0, 100.0),
        )?;
        Ok(Self {
            world,
            rules: PairTable::new()
                .with(Kind::Player, Kind::Enemy, Response::Slide)
                .with(Kind::Enemy, Kind::Enemy, Response::Cross)
                .with(Kind::Bullet, Kind::Enemy, Response::Cross),
            player: Some(player),
            seed: 7,
            time: 0.0,
            bullet_timer: 0.0,
            spawn_timer: 0.0,
            kills: 0,
            laser_hits: 0,
        })
    }

    fn tick(&mut self) -> Result<()> {
        self.time += DT;
        let mut pending = Deferred::new();
        for h in self.world.handles() {
            if !self.world.contains(h) || pending.is_removing(h) {
                continue;
            }
            match self.world.get(h)?.kind {
                Kind::Player => self.player_act(h, &mut pending)?,
                Kind::Enemy => self.enemy_act(h, &mut pending)?,
                Kind::Bullet => self.bullet_act(h, &mut pending)?,
            }
        }

        self.spawn_timer -= DT;
        if self.spawn_timer <= 0.0 {
            self.spawn_timer = SPAWN_DELAY;
            let angle = lcg(&mut self.seed) * std::f32::consts::TAU;
            let at = VIEW.center() + Vec2::from_angle(angle) * 700.0;
            pending.add(Entity::new(Kind::Enemy, Vec2::ZERO), Rect::new(at.x, at.y, 90.0, 90.0));
        }
        self.world.apply(pending)?;
        Ok(())
    }

    fn player_act(&mut self, h: Handle, pending: &mut Deferred<Entity>) -> Result<()> {
        let rect = self.world.get_rect(h)?;
        let heading = Vec2::from_angle(self.time * 0.8);
        let goal = rect.min() + heading * MOVE_SPEED * DT;
        let res = self.world.move_item(h, goal, &self.rules)?;
        for c in &res.collisions {
            if self.world.get(c.other)?.death_timer <= 0.0 {
                info!(x = res.rect.x, y = res.rect.y, "tank destroyed");
                pending.remove(h);
                self.player = None;
                return Ok(());
            }
        }

        // Turret sweeps slowly; fire along it and look down the laser
        let aim = Vec2::from_angle(-self.time * 1.7);
        let muzzle = res.rect.center() + aim * BULLET_START_DISTANCE;
        let enemies = |_: Handle, e: &Entity| e.kind == Kind::Enemy;
        if let Some(hit) = self.world.query_segment(muzzle, muzzle + aim * LASER_LENGTH, &enemies).first() {
            self.laser_hits += 1;
            debug!(x = hit.entry.x, y = hit.entry.y, "laser hit");
        }

        self.bullet_timer = (self.bullet_timer - DT).max(0.0);
        if self.bullet_timer == 0.0 {
            self.bullet_timer = BULLET_DELAY;
            pending.add(
                Entity::new(Kind::Bullet, aim * BULLET_SPEED),
                Rect::new(muzzle.x - 5.0, muzzle.y - 5.0, 10.0, 10.0),
            );
        }
        Ok(())
    }

    fn enemy_act(&mut self, h: Handle, pending: &mut Deferred<Entity>) -> Result<()> {
        let rect = self.world.get_rect(h)?;
        let target = match self.player {
            Some(p) => self.world.get_rect(p)?.center(),
            None => rect.center(),
        };
        let e = self.world.get_mut(h)?;
        if e.death_timer <= 0.0 {
            e.vel = (target - rect.center()).normalize_or_zero() * ENEMY_SPEED;
        } else {
            let speed = (e.vel.length() - DEATH_FRICTION).max(0.0);
            e.vel = e.vel.normalize_or_zero() * speed;
            e.death_timer -= DT;
            if e.death_timer <= 0.0 {
                pending.remove(h);
            }
        }
        let goal = rect.min() + e.vel * DT;
        self.world.move_item(h, goal, &self.rules)?;
        Ok(())
    }

    fn bullet_act(&mut self, h: Handle, pending: &mut Deferred<Entity>) -> Result<()> {
        let rect = self.world.get_rect(h)?;
        let vel = self.world.get(h)?.vel;
        let res = self.world.move_item(h, rect.min() + vel * DT, &self.rules)?;
        if let Some(c) = res.collisions.first() {
            pending.remove(h);
            let enemy = self.world.get_mut(c.other)?;
            if enemy.death_timer <= 0.0 {
                enemy.vel = Vec2::ZERO;
                enemy.death_timer = DEATH_TIME;
                self.kills += 1;
                debug!(enemy = ?c.other, "enemy shot");
            } else {
                enemy.vel += vel * BULLET_PUSH;
            }
            return Ok(());
        }
        if !res.rect.intersects(&VIEW) {
            pending.remove(h);
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let mut arena = Arena::new()?;
    for tick in 0..3600 {
        arena.tick()?;
        if arena.player.is_none() {
            info!(tick, "game over");
            break;
        }
        if tick % 600 == 0 {
            info!(tick, items = arena.world.len(), kills = arena.kills, "arena");
        }
    }
    info!(
        kills = arena.kills,
        laser_hits = arena.laser_hits,
        survived = arena.player.is_some(),
        stats = ?arena.world.stats(),
        "done"
    );
    Ok(())
}
