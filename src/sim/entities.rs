//! Climber entities: player, platforms, enemies, bullets, particles
//!
//! Each entity is a plain recyclable record owned by a [`Pool`](super::pool::Pool)
//! (the player excepted). `init` establishes a valid state; `release` never
//! touches contents.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Circle, Rect};
use super::difficulty::DifficultyParams;
use super::pool::{Recyclable, SlotId};
use crate::consts::*;
use crate::{chance, rand_between};

/// Anything with an axis-aligned hitbox
pub trait Collidable {
    fn bounds(&self) -> Rect;
}

/// Horizontal input intents for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub left: bool,
    pub right: bool,
}

/// The climbing player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub w: f32,
    pub h: f32,
    pub on_ground: bool,
    pub active: bool,
    /// Damage flash remaining (seconds)
    pub blink_timer: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            w: PLAYER_SIZE,
            h: PLAYER_SIZE,
            on_ground: false,
            active: true,
            blink_timer: 0.0,
        }
    }
}

impl Player {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Integrate one step of horizontal control, gravity and wrap-around
    pub fn update(&mut self, dt: f32, intent: MoveIntent, params: &DifficultyParams, world_width: f32) {
        if intent.left && !intent.right {
            self.vel.x -= params.acceleration * dt;
        } else if intent.right && !intent.left {
            self.vel.x += params.acceleration * dt;
        } else {
            self.vel.x *= FRICTION.powf(dt * 60.0);
        }
        self.vel.x = self.vel.x.clamp(-params.max_velocity_x, params.max_velocity_x);

        self.vel.y += params.gravity * dt;
        self.pos += self.vel * dt;

        // Horizontal wrap
        if self.pos.x < -self.w / 2.0 {
            self.pos.x = world_width + self.w / 2.0;
        } else if self.pos.x > world_width + self.w / 2.0 {
            self.pos.x = -self.w / 2.0;
        }

        // Re-established by platform collision each frame
        self.on_ground = false;
        self.blink_timer = (self.blink_timer - dt).max(0.0);
    }

    /// Launch upward at `velocity` (sign is ignored)
    pub fn jump(&mut self, velocity: f32) {
        self.vel.y = -velocity.abs();
        self.on_ground = false;
    }

    pub fn take_damage(&mut self) {
        self.blink_timer = 0.3;
    }

    /// Whether the damage flash is in its dim half-cycle
    pub fn is_blinking(&self) -> bool {
        self.blink_timer > 0.0 && (self.blink_timer * 20.0).floor() as i32 % 2 == 1
    }
}

impl Collidable for Player {
    fn bounds(&self) -> Rect {
        Rect::centered(self.pos, self.w, self.h)
    }
}

/// Platform movement types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlatformKind {
    /// Never generated; kept for hand-placed platforms
    Stationary,
    #[default]
    Horizontal,
    Vertical,
    Explosive,
}

/// Seconds between the first step and detonation
pub const EXPLOSION_DELAY: f32 = 3.0;
/// Proximity window that suspends moving platforms
const PAUSE_DISTANCE_X: f32 = 60.0;
const PAUSE_DISTANCE_Y: f32 = 40.0;
const MAX_PAUSE: f32 = 0.8;
/// Horizontal platforms bounce this far from the world edges
const EDGE_MARGIN: f32 = 20.0;

/// A platform the player bounces on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub pos: Vec2,
    pub vel: Vec2,
    pub w: f32,
    pub h: f32,
    pub kind: PlatformKind,
    pub active: bool,
    pub move_range: f32,
    pub origin: Vec2,
    pub pause_timer: f32,
    pub explosion_timer: f32,
    pub stepped_on: bool,
    pub blink_timer: f32,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            w: 80.0,
            h: PLATFORM_HEIGHT,
            kind: PlatformKind::Horizontal,
            active: false,
            move_range: 100.0,
            origin: Vec2::ZERO,
            pause_timer: 0.0,
            explosion_timer: 0.0,
            stepped_on: false,
            blink_timer: 0.0,
        }
    }
}

impl Platform {
    pub fn init(&mut self, pos: Vec2, width: f32, kind: PlatformKind, move_speed: f32) {
        self.pos = pos;
        self.origin = pos;
        self.w = width;
        self.h = PLATFORM_HEIGHT;
        self.kind = kind;
        self.active = true;
        self.pause_timer = 0.0;
        self.explosion_timer = 0.0;
        self.stepped_on = false;
        self.blink_timer = 0.0;

        match kind {
            PlatformKind::Horizontal => {
                self.vel = Vec2::new(move_speed, 0.0);
                self.move_range = 150.0;
            }
            PlatformKind::Vertical => {
                self.vel = Vec2::new(0.0, move_speed);
                self.move_range = 100.0;
            }
            PlatformKind::Explosive | PlatformKind::Stationary => {
                self.vel = Vec2::ZERO;
                self.move_range = 0.0;
            }
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.kind, PlatformKind::Horizontal | PlatformKind::Vertical)
    }

    pub fn update(&mut self, dt: f32, world_width: f32, player_pos: Option<Vec2>) {
        if !self.active {
            return;
        }

        if self.kind == PlatformKind::Explosive && self.stepped_on {
            self.explosion_timer += dt;
            self.blink_timer += dt;
            if self.explosion_timer >= EXPLOSION_DELAY {
                self.active = false;
                return;
            }
        }

        if !self.is_moving() {
            return;
        }

        // Hover while the player is right next to us
        let mut should_pause = false;
        if let Some(player) = player_pos {
            let dx = (self.pos.x - player.x).abs();
            let dy = (self.pos.y - player.y).abs();
            if dx < PAUSE_DISTANCE_X && dy < PAUSE_DISTANCE_Y {
                should_pause = true;
                self.pause_timer = (self.pause_timer + dt).min(MAX_PAUSE);
            } else {
                self.pause_timer = (self.pause_timer - dt * 3.0).max(0.0);
            }
        }

        if should_pause || self.pause_timer > 0.0 {
            return;
        }

        match self.kind {
            PlatformKind::Horizontal => {
                self.pos.x += self.vel.x * dt;
                let drift = (self.pos.x - self.origin.x).abs();
                if drift > self.move_range
                    || self.pos.x < EDGE_MARGIN
                    || self.pos.x > world_width - EDGE_MARGIN
                {
                    self.vel.x = -self.vel.x;
                }
            }
            PlatformKind::Vertical => {
                self.pos.y += self.vel.y * dt;
                if (self.pos.y - self.origin.y).abs() > self.move_range {
                    self.vel.y = -self.vel.y;
                }
            }
            _ => {}
        }
    }

    /// Arm an explosive platform. Later calls do nothing.
    pub fn step_on(&mut self) {
        if self.kind == PlatformKind::Explosive && !self.stepped_on {
            self.stepped_on = true;
            self.explosion_timer = 0.0;
        }
    }

    /// Blink frequency (Hz) for an armed explosive; speeds up toward detonation
    pub fn blink_speed(&self) -> f32 {
        2.0 + (self.explosion_timer / EXPLOSION_DELAY) * 8.0
    }

    /// Seconds left before an armed explosive detonates
    pub fn time_left(&self) -> Option<f32> {
        (self.kind == PlatformKind::Explosive && self.stepped_on)
            .then(|| (EXPLOSION_DELAY - self.explosion_timer).max(0.0))
    }
}

impl Collidable for Platform {
    fn bounds(&self) -> Rect {
        Rect::centered(self.pos, self.w, self.h)
    }
}

impl Recyclable for Platform {
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Enemy behaviours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Hurts on contact only
    #[default]
    Touch,
    /// Also fires bullets at the player
    Shooter,
}

/// A platform-patrolling enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    pub vel: Vec2,
    pub w: f32,
    pub h: f32,
    pub kind: EnemyKind,
    pub active: bool,
    pub shoot_cooldown: f32,
    /// Platform this enemy patrols, if it still exists
    pub anchor: Option<SlotId>,
    pub patrol_range: f32,
    pub origin_x: f32,
}

impl Default for Enemy {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::new(30.0, 0.0),
            w: ENEMY_SIZE,
            h: ENEMY_SIZE,
            kind: EnemyKind::Touch,
            active: false,
            shoot_cooldown: 0.0,
            anchor: None,
            patrol_range: 80.0,
            origin_x: 0.0,
        }
    }
}

impl Enemy {
    pub fn init(
        &mut self,
        pos: Vec2,
        kind: EnemyKind,
        anchor: Option<(SlotId, f32)>,
        rng: &mut impl Rng,
    ) {
        self.pos = pos;
        self.origin_x = pos.x;
        self.kind = kind;
        self.active = true;
        self.vel = Vec2::new(rand_between(rng, -40.0, 40.0), 0.0);
        self.shoot_cooldown = rand_between(rng, 0.5, 2.0);
        self.anchor = anchor.map(|(id, _)| id);
        self.patrol_range = match anchor {
            Some((_, platform_width)) => (platform_width * 0.8).min(80.0),
            None => 80.0,
        };
    }

    /// Patrol around the anchor platform centre (`anchor_x`), or between the
    /// world edges when unanchored
    pub fn update(&mut self, dt: f32, world_width: f32, anchor_x: Option<f32>) {
        if !self.active {
            return;
        }

        self.pos.x += self.vel.x * dt;

        match anchor_x {
            Some(center) => {
                let left = center - self.patrol_range / 2.0;
                let right = center + self.patrol_range / 2.0;
                if self.pos.x <= left || self.pos.x >= right {
                    self.vel.x = -self.vel.x;
                    self.pos.x = self.pos.x.clamp(left, right);
                }
            }
            None => {
                if self.pos.x < EDGE_MARGIN || self.pos.x > world_width - EDGE_MARGIN {
                    self.vel.x = -self.vel.x;
                }
            }
        }

        self.shoot_cooldown = (self.shoot_cooldown - dt).max(0.0);
    }

    pub fn can_shoot(&self) -> bool {
        self.kind == EnemyKind::Shooter && self.shoot_cooldown <= 0.0
    }

    /// Consume the shot if ready and schedule the next one 1-2.5 s out
    pub fn try_shoot(&mut self, rng: &mut impl Rng) -> bool {
        if !self.can_shoot() {
            return false;
        }
        self.shoot_cooldown = rand_between(rng, 1.0, 2.5);
        true
    }
}

impl Collidable for Enemy {
    fn bounds(&self) -> Rect {
        Rect::centered(self.pos, self.w, self.h)
    }
}

impl Recyclable for Enemy {
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Bullet lifetime in seconds
pub const BULLET_LIFETIME: f32 = 5.0;

/// An enemy projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub r: f32,
    pub active: bool,
    pub age: f32,
    pub lifetime: f32,
}

impl Default for Bullet {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            r: BULLET_RADIUS,
            active: false,
            age: 0.0,
            lifetime: BULLET_LIFETIME,
        }
    }
}

impl Bullet {
    pub fn init(&mut self, pos: Vec2, vel: Vec2) {
        self.pos = pos;
        self.vel = vel;
        self.r = BULLET_RADIUS;
        self.active = true;
        self.age = 0.0;
        self.lifetime = BULLET_LIFETIME;
    }

    /// Move and age; expires when too old, off the sides, or far below the view
    pub fn update(&mut self, dt: f32, world_width: f32, view_bottom: f32) {
        if !self.active {
            return;
        }
        self.pos += self.vel * dt;
        self.age += dt;

        if self.age > self.lifetime
            || self.pos.x < -50.0
            || self.pos.x > world_width + 50.0
            || self.pos.y > view_bottom + 200.0
        {
            self.active = false;
        }
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.pos, self.r)
    }

    /// Opacity that fades with age, never below 0.3
    pub fn alpha(&self) -> f32 {
        (1.0 - self.age / self.lifetime).max(0.3)
    }
}

impl Collidable for Bullet {
    fn bounds(&self) -> Rect {
        Rect::centered(self.pos, self.r * 2.0, self.r * 2.0)
    }
}

impl Recyclable for Bullet {
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Gravity applied to particles (px/s²)
const PARTICLE_GRAVITY: f32 = 200.0;

/// A short-lived visual particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
    /// 0xRRGGBB
    pub color: u32,
    pub active: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            life: 1.0,
            max_life: 1.0,
            size: 2.0,
            color: 0xffffff,
            active: false,
        }
    }
}

impl Particle {
    pub fn init(&mut self, pos: Vec2, vel: Vec2, life: f32, size: f32, color: u32) {
        self.pos = pos;
        self.vel = vel;
        self.life = life;
        self.max_life = life.max(f32::EPSILON);
        self.size = size;
        self.color = color;
        self.active = true;
    }

    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.pos += self.vel * dt;
        self.vel.y += PARTICLE_GRAVITY * dt;
        self.life -= dt;
        if self.life <= 0.0 {
            self.active = false;
        }
    }

    pub fn alpha(&self) -> f32 {
        (self.life / self.max_life).clamp(0.0, 1.0)
    }
}

impl Collidable for Particle {
    fn bounds(&self) -> Rect {
        Rect::centered(self.pos, self.size, self.size)
    }
}

impl Recyclable for Particle {
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Borrowed view over any climber entity, for exhaustive dispatch
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Player(&'a Player),
    Platform(&'a Platform),
    Enemy(&'a Enemy),
    Bullet(&'a Bullet),
    Particle(&'a Particle),
}

impl Collidable for EntityRef<'_> {
    fn bounds(&self) -> Rect {
        match self {
            EntityRef::Player(p) => p.bounds(),
            EntityRef::Platform(p) => p.bounds(),
            EntityRef::Enemy(e) => e.bounds(),
            EntityRef::Bullet(b) => b.bounds(),
            EntityRef::Particle(p) => p.bounds(),
        }
    }
}

/// Roll whether a freshly spawned platform should carry an enemy
pub fn rolls_enemy(kind: PlatformKind, params: &DifficultyParams, rng: &mut impl Rng) -> bool {
    let scale = match kind {
        PlatformKind::Horizontal | PlatformKind::Vertical => 0.6,
        PlatformKind::Explosive => 0.3,
        PlatformKind::Stationary => 1.0,
    };
    chance(rng, params.enemy_spawn_chance * scale)
}
