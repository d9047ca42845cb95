//! Headless platformer: a player runs and jumps across a tile level, stomping
//! enemies that patrol back and forth. Run with `RUST_LOG=debug` for detail.

use glam::Vec2;
use nobump::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MAP: &str = "\
+------------------------------------------------+
+------------------------+-----------------------+
+-++--++-----------------+--------+-+-+-+--------+
+--------------e--e------+----------------++-----+
+-----------+++++++------+------++---------------+
+-----------------+------+------++---------------+
+p----------------+----e-e-e----++-----e-----e---+
++++++++++++++++++++++++++++++++++++++++++++++++++";
const TILE: f32 = 100.0;
const DT: f32 = 1.0 / 60.0;

const FRICTION: f32 = 250.0;
const RUN_ACCELERATION: f32 = 1800.0;
const RUN_SPEED: f32 = 800.0;
const JUMP_SPEED: f32 = 1200.0;
const BOUNCE_SPEED: f32 = 800.0;
const GRAVITY: f32 = 3000.0;
const JUMP_MAX_TIME: f32 = 0.25;
const ENEMY_SPEED: f32 = 200.0;
const DEATH_TIME: f32 = 1.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Kind {
    Block,
    Player,
    Enemy,
}

#[derive(Debug)]
struct Actor {
    kind: Kind,
    vel: Vec2,
    jump_time: f32,
    jumping: bool,
    death_timer: f32,
}

impl Actor {
    fn new(kind: Kind, vel: Vec2) -> Self {
        Self { kind, vel, jump_time: 0.0, jumping: false, death_timer: 0.0 }
    }

    fn is_dying(&self) -> bool {
        self.death_timer > 0.0
    }
}

impl Kinded for Actor {
    type Kind = Kind;
    fn kind(&self) -> Kind {
        self.kind
    }
}

#[derive(Copy, Clone, Default)]
struct Input {
    left: bool,
    right: bool,
    up: bool,
    up_just_pressed: bool,
}

struct GameWorld {
    world: World<Actor>,
    player_rules: PairTable<Kind>,
    enemy_rules: PairTable<Kind>,
    stomps: u32,
    player_alive: bool,
}

fn approach(value: f32, target: f32, step: f32) -> f32 {
    if value < target { (value + step).min(target) } else { (value - step).max(target) }
}

impl GameWorld {
    fn load(map: &str) -> Result<Self> {
        let mut world = World::new(WorldConfig::with_cell_size(TILE))?;
        let lines: Vec<&str> = map.lines().collect();
        for (j, line) in lines.iter().enumerate() {
            for (i, ch) in line.chars().enumerate() {
                let x = i as f32 * TILE;
                let y = (lines.len() - j) as f32 * TILE;
                match ch {
                    '+' => { world.add(Actor::new(Kind::Block, Vec2::ZERO), Rect::new(x, y, TILE, TILE))?; }
                    'p' => { world.add(Actor::new(Kind::Player, Vec2::ZERO), Rect::new(x + 30.0, y + 15.0, 70.0, 130.0))?; }
                    'e' => { world.add(Actor::new(Kind::Enemy, Vec2::new(-ENEMY_SPEED, 0.0)), Rect::new(x, y, 90.0, 90.0))?; }
                    _ => {}
                }
            }
        }
        Ok(Self {
            world,
            player_rules: PairTable::new()
                .with(Kind::Player, Kind::Block, Response::Slide)
                .with(Kind::Player, Kind::Enemy, Response::Cross),
            enemy_rules: PairTable::new()
                .with(Kind::Enemy, Kind::Block, Response::Slide)
                .with(Kind::Enemy, Kind::Enemy, Response::Slide),
            stomps: 0,
            player_alive: true,
        })
    }

    fn tick(&mut self, input: Input) -> Result<()> {
        let mut pending = Deferred::new();
        for h in self.world.handles() {
            if !self.world.contains(h) || pending.is_removing(h) {
                continue;
            }
            match self.world.get(h)?.kind {
                Kind::Block => {}
                Kind::Player => self.player_act(h, input, &mut pending)?,
                Kind::Enemy => self.enemy_act(h, &mut pending)?,
            }
        }
        self.world.apply(pending)?;
        Ok(())
    }

    fn player_act(&mut self, h: Handle, input: Input, pending: &mut Deferred<Actor>) -> Result<()> {
        let rect = self.world.get_rect(h)?;
        let on_ground = input.up_just_pressed
            && !self.world.project(h, rect, rect.min() - Vec2::new(0.0, 0.1), &self.player_rules)?.is_empty();

        let p = self.world.get_mut(h)?;
        p.vel.x = approach(p.vel.x, 0.0, FRICTION * DT);
        if input.right {
            p.vel.x = approach(p.vel.x, RUN_SPEED, RUN_ACCELERATION * DT);
        } else if input.left {
            p.vel.x = approach(p.vel.x, -RUN_SPEED, RUN_ACCELERATION * DT);
        }
        if !input.up {
            p.jumping = false;
        }
        if on_ground {
            p.jumping = true;
        }
        if input.up && p.jumping && p.jump_time < JUMP_MAX_TIME {
            p.vel.y = JUMP_SPEED;
            p.jump_time += DT;
        }
        p.vel.y -= GRAVITY * DT;
        let goal = rect.min() + p.vel * DT;

        let res = self.world.move_item(h, goal, &self.player_rules)?;
        let mut vel = self.world.get(h)?.vel;
        let mut jump_time = self.world.get(h)?.jump_time;
        let mut landed = false;
        let mut stomped = Vec::new();
        let mut died = false;
        for c in &res.collisions {
            let other = self.world.get(c.other)?;
            match other.kind {
                Kind::Block => {
                    if c.normal.x != 0.0 {
                        vel.x = 0.0;
                    }
                    if c.normal.y != 0.0 {
                        vel.y = 0.0;
                        jump_time = JUMP_MAX_TIME;
                        if c.normal.y == 1.0 {
                            jump_time = 0.0;
                            landed = true;
                        }
                    }
                }
                Kind::Enemy if !other.is_dying() => {
                    if c.normal.y == 1.0 && !c.overlaps {
                        vel.y = BOUNCE_SPEED;
                        stomped.push(c.other);
                    } else {
                        died = true;
                    }
                }
                _ => {}
            }
        }

        let p = self.world.get_mut(h)?;
        p.vel = vel;
        p.jump_time = jump_time;
        if landed {
            p.jumping = false;
        }
        for e in stomped {
            let enemy = self.world.get_mut(e)?;
            enemy.vel.x = 0.0;
            enemy.death_timer = DEATH_TIME;
            self.stomps += 1;
            info!(?e, "enemy stomped");
        }
        if died {
            warn!(x = res.rect.x, y = res.rect.y, "player hit by enemy");
            self.player_alive = false;
            pending.remove(h);
        }
        Ok(())
    }

    fn enemy_act(&mut self, h: Handle, pending: &mut Deferred<Actor>) -> Result<()> {
        let rect = self.world.get_rect(h)?;
        let e = self.world.get_mut(h)?;
        e.vel.y -= GRAVITY * DT;
        let goal = rect.min() + e.vel * DT;

        let res = self.world.move_item(h, goal, &self.enemy_rules)?;
        let e = self.world.get_mut(h)?;
        for c in &res.collisions {
            if c.normal.x != 0.0 {
                e.vel.x = -e.vel.x;
            }
            if c.normal.y != 0.0 {
                e.vel.y = 0.0;
            }
        }
        if e.death_timer > 0.0 {
            e.death_timer -= DT;
            if e.death_timer <= 0.0 {
                pending.remove(h);
            }
        }
        Ok(())
    }

    fn player(&self) -> Option<Rect> {
        self.world.iter().find(|(_, _, a)| a.kind == Kind::Player).map(|(_, r, _)| r)
    }
}

fn scripted_input(tick: u32) -> Input {
    let phase = tick % 90;
    Input {
        right: tick < 900,
        left: tick >= 900,
        up: phase < 12,
        up_just_pressed: phase == 0,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let mut game = GameWorld::load(MAP)?;
    info!(items = game.world.len(), stats = ?game.world.stats(), "level loaded");

    for tick in 0..1200 {
        game.tick(scripted_input(tick))?;
        if !game.player_alive {
            info!(tick, "game over");
            break;
        }
        if tick % 120 == 0 {
            if let Some(r) = game.player() {
                info!(tick, x = r.x, y = r.y, "player");
            }
        }
    }
    info!(stomps = game.stomps, alive = game.player_alive, remaining = game.world.len(), "done");
    Ok(())
}
