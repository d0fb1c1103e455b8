//! The wizard hero
//!
//! Position is anchored at the feet: `pos.x` is the horizontal centre and
//! `pos.y` the bottom edge of the hitbox.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::Virus;
use super::level::LevelInput;
use super::magic::{CastMode, MagicSystem};
use super::powers::Resolution;
use crate::sim::collision::Rect;
use crate::sim::entities::Collidable;

pub const HERO_SPEED: f32 = 200.0;
pub const HERO_JUMP: f32 = 350.0;
pub const HERO_GRAVITY: f32 = 800.0;
pub const HERO_WIDTH: f32 = 48.0;
pub const HERO_HEIGHT: f32 = 64.0;
pub const HERO_HEALTH: f32 = 100.0;
pub const INVULNERABLE_MS: f32 = 1500.0;
pub const CAST_POSE_MS: f32 = 300.0;
/// Spells leave from chest height
const CAST_OFFSET_Y: f32 = 32.0;
/// Horizontal speed above which the hero counts as running
const RUN_THRESHOLD: f32 = 10.0;
/// How far below a surface the feet may sink and still stand on it
const STAND_TOLERANCE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pose {
    #[default]
    Idle,
    Run,
    Jump,
    Crouch,
    Cast,
    Victory,
}

/// What a cast produced
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    Spell,
    Power(Resolution),
}

#[derive(Debug, Clone)]
pub struct Hero {
    pub pos: Vec2,
    pub vel: Vec2,
    pub width: f32,
    pub height: f32,
    pub health: f32,
    pub max_health: f32,
    pub grounded: bool,
    pub crouching: bool,
    pub pose: Pose,
    /// +1 facing right, -1 facing left
    pub facing: f32,
    pub magic: MagicSystem,
    invulnerable_ms: f32,
    cast_pose_ms: f32,
}

impl Hero {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            width: HERO_WIDTH,
            height: HERO_HEIGHT,
            health: HERO_HEALTH,
            max_health: HERO_HEALTH,
            grounded: false,
            crouching: false,
            pose: Pose::Idle,
            facing: 1.0,
            magic: MagicSystem::new(),
            invulnerable_ms: 0.0,
            cast_pose_ms: 0.0,
        }
    }

    /// Spawn point for a level of the given size
    pub fn spawn_point(width: f32, height: f32) -> Vec2 {
        Vec2::new(width * 0.2, height * 0.7)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms > 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.y - self.height / 2.0)
    }

    pub fn health_fraction(&self) -> f32 {
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    pub fn update(&mut self, dt: f32, input: &LevelInput, world: Vec2) {
        self.invulnerable_ms = (self.invulnerable_ms - dt * 1000.0).max(0.0);
        self.cast_pose_ms = (self.cast_pose_ms - dt * 1000.0).max(0.0);
        self.magic.update(dt, world.x, world.y);

        if self.pose == Pose::Victory || !self.is_alive() {
            self.vel = Vec2::ZERO;
            return;
        }

        let axis = (input.right as i32 - input.left as i32) as f32;
        self.vel.x = axis * HERO_SPEED;
        if axis != 0.0 {
            self.facing = axis;
        }

        if (input.up || input.jump) && self.grounded {
            self.vel.y = -HERO_JUMP;
            self.grounded = false;
        }
        self.crouching = input.down && self.grounded;

        if !self.grounded {
            self.vel.y += HERO_GRAVITY * dt;
        }
        self.pos += self.vel * dt;

        let half = self.width / 2.0;
        if world.x > self.width {
            self.pos.x = self.pos.x.clamp(half, world.x - half);
        }

        self.pose = self.pick_pose();
    }

    fn pick_pose(&self) -> Pose {
        if self.cast_pose_ms > 0.0 {
            Pose::Cast
        } else if self.crouching {
            Pose::Crouch
        } else if !self.grounded {
            Pose::Jump
        } else if self.vel.x.abs() > RUN_THRESHOLD {
            Pose::Run
        } else {
            Pose::Idle
        }
    }

    /// Stand on the ground line or the first platform underfoot.
    ///
    /// Clears `grounded` when there is nothing to stand on, so walking off a
    /// ledge starts a fall on the next update.
    pub fn resolve_surfaces(&mut self, ground_y: f32, platforms: &[Rect]) -> bool {
        self.grounded = false;
        if self.vel.y < 0.0 {
            return false;
        }

        if self.pos.y >= ground_y {
            self.land(ground_y);
            return true;
        }

        let feet = self.pos.y;
        let body = self.bounds();
        let surface = platforms.iter().find(|p| {
            body.overlaps_x(p) && feet >= p.y - 1.0 && feet <= p.y + STAND_TOLERANCE
        });
        if let Some(p) = surface {
            self.land(p.y);
            return true;
        }
        false
    }

    fn land(&mut self, y: f32) {
        self.pos.y = y;
        self.vel.y = 0.0;
        self.grounded = true;
    }

    /// Spell origin in world space
    pub fn cast_origin(&self) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.y - CAST_OFFSET_Y)
    }

    /// Cast toward `target` with the current mode
    pub fn cast(&mut self, target: Vec2, enemies: &mut [Virus], now_ms: f64) -> Option<CastOutcome> {
        if !self.is_alive() || self.pose == Pose::Victory {
            return None;
        }
        let outcome = match self.magic.mode {
            CastMode::Basic => {
                let origin = self.cast_origin();
                self.magic
                    .cast_spell(origin, target - origin, now_ms)
                    .then_some(CastOutcome::Spell)
            }
            CastMode::Power => self
                .magic
                .use_power(target, enemies, now_ms)
                .map(CastOutcome::Power),
        };
        if outcome.is_some() {
            self.cast_pose_ms = CAST_POSE_MS;
            self.pose = Pose::Cast;
            if target.x != self.pos.x {
                self.facing = (target.x - self.pos.x).signum();
            }
        }
        outcome
    }

    /// Returns true if the hit landed
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.is_invulnerable() || !self.is_alive() {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.invulnerable_ms = INVULNERABLE_MS;
        if !self.is_alive() {
            log::info!("Hero defeated");
        }
        true
    }

    pub fn heal(&mut self, amount: f32) {
        if self.is_alive() {
            self.health = (self.health + amount).min(self.max_health);
        }
    }

    pub fn start_victory(&mut self) {
        self.pose = Pose::Victory;
        self.vel = Vec2::ZERO;
    }

    pub fn stop_victory(&mut self) {
        if self.pose == Pose::Victory {
            self.pose = Pose::Idle;
        }
    }
}

impl Collidable for Hero {
    fn bounds(&self) -> Rect {
        Rect::new(
            self.pos.x - self.width / 2.0,
            self.pos.y - self.height,
            self.width,
            self.height,
        )
    }
}
