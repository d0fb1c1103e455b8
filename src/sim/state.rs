//! Climber game state
//!
//! Owns every pool, the active-entity lists, scoring, the camera and the
//! generation frontier. Per-frame logic lives in [`super::tick`].

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::{DifficultyParams, next_tier_score};
use super::entities::{
    Bullet, Collidable, Enemy, EnemyKind, EntityRef, Particle, Platform, PlatformKind, Player,
    rolls_enemy,
};
use super::pool::{Pool, SlotId};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::platform::storage::KeyValueStore;
use crate::{chance, finite_or, rand_between};

/// Pre-allocated pool sizes
pub const PLATFORM_POOL_SIZE: usize = 80;
pub const ENEMY_POOL_SIZE: usize = 40;
pub const BULLET_POOL_SIZE: usize = 60;
pub const PARTICLE_POOL_SIZE: usize = 64;

/// Current phase of the climber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing simulated yet
    Menu,
    Playing,
    Paused,
    /// Run ended; only `reset` leaves this
    GameOver,
}

/// Notifications produced during a tick, drained by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged(f32),
    TierChanged(u32),
    PlayerDamaged(f32),
    Jumped,
    PlatformExploded { pos: Vec2 },
    EnemyShot { pos: Vec2 },
    GameOver { score: f32, best: f32 },
}

/// Snapshot of pool usage for debug overlays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub platforms: usize,
    pub enemies: usize,
    pub bullets: usize,
    pub particles: usize,
    pub platforms_available: usize,
    pub enemies_available: usize,
    pub bullets_available: usize,
}

/// Complete climber state
pub struct GameState {
    pub seed: u64,
    pub width: f32,
    pub height: f32,
    pub phase: GamePhase,

    pub player: Player,
    pub platforms: Pool<Platform>,
    pub enemies: Pool<Enemy>,
    pub bullets: Pool<Bullet>,
    pub particles: Pool<Particle>,
    /// Slots currently in play, in spawn order
    pub active_platforms: Vec<SlotId>,
    pub active_enemies: Vec<SlotId>,
    pub active_bullets: Vec<SlotId>,
    pub active_particles: Vec<SlotId>,
    /// Upper bound on live particles (0 disables them)
    pub particle_cap: usize,

    pub score: f32,
    pub best_score: f32,
    pub tier: u32,
    pub params: DifficultyParams,

    pub camera_y: f32,
    pub camera_target_y: f32,
    /// Y of the most recently generated platform
    pub frontier_y: f32,
    /// Generation continues while the frontier is below this
    pub generation_height: f32,
    /// Minimum Y the player has reached
    pub max_height: f32,

    pub damage_timer: f32,
    pub fall_timer: f32,
    /// Host wall-clock (ms), stamped on leaderboard entries
    pub wall_clock_ms: f64,

    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
    store: Box<dyn KeyValueStore>,
    pub highscores: HighScores,
}

impl GameState {
    /// Create a game in the `Menu` phase. Call [`super::tick::reset`] to start a run.
    pub fn new(width: f32, height: f32, seed: u64, store: Box<dyn KeyValueStore>) -> Self {
        let width = sanitize_extent(width, WORLD_WIDTH);
        let height = sanitize_extent(height, FALLBACK_HEIGHT);
        let highscores = HighScores::load(store.as_ref());
        let best_score = highscores.best();

        log::info!(
            "Climber created: {}x{} seed={} best={}",
            width,
            height,
            seed,
            best_score
        );

        Self {
            seed,
            width,
            height,
            phase: GamePhase::Menu,
            player: Player::default(),
            platforms: Pool::new(PLATFORM_POOL_SIZE),
            enemies: Pool::new(ENEMY_POOL_SIZE),
            bullets: Pool::new(BULLET_POOL_SIZE),
            particles: Pool::new(PARTICLE_POOL_SIZE),
            active_platforms: Vec::with_capacity(PLATFORM_POOL_SIZE),
            active_enemies: Vec::with_capacity(ENEMY_POOL_SIZE),
            active_bullets: Vec::with_capacity(BULLET_POOL_SIZE),
            active_particles: Vec::with_capacity(PARTICLE_POOL_SIZE),
            particle_cap: PARTICLE_POOL_SIZE,
            score: STARTING_SCORE,
            best_score,
            tier: 0,
            params: DifficultyParams::for_tier(0),
            camera_y: 0.0,
            camera_target_y: 0.0,
            frontier_y: 0.0,
            generation_height: 0.0,
            max_height: 0.0,
            damage_timer: 0.0,
            fall_timer: 0.0,
            wall_clock_ms: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            store,
            highscores,
        }
    }

    /// Viewport height with a safe fallback
    #[inline]
    pub fn safe_height(&self) -> f32 {
        sanitize_extent(self.height, FALLBACK_HEIGHT)
    }

    /// Camera Y with a safe fallback
    #[inline]
    pub fn safe_camera_y(&self) -> f32 {
        finite_or(self.camera_y, 0.0)
    }

    /// Resize the viewport; non-finite or non-positive sizes are ignored
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = sanitize_extent(width, self.width);
        self.height = sanitize_extent(height, self.height);
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Force a phase (hosts use this for menus)
    pub fn set_state(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::info!("Climber phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Score at which the next difficulty tier starts
    pub fn next_tier_score(&self) -> f32 {
        next_tier_score(self.tier)
    }

    pub fn entity_counts(&self) -> EntityCounts {
        EntityCounts {
            platforms: self.active_platforms.len(),
            enemies: self.active_enemies.len(),
            bullets: self.active_bullets.len(),
            particles: self.active_particles.len(),
            platforms_available: self.platforms.available_count(),
            enemies_available: self.enemies.available_count(),
            bullets_available: self.bullets.available_count(),
        }
    }

    /// Every live entity, player first
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> {
        std::iter::once(EntityRef::Player(&self.player))
            .chain(
                self.active_platforms
                    .iter()
                    .filter_map(|id| self.platforms.get(*id))
                    .map(EntityRef::Platform),
            )
            .chain(
                self.active_enemies
                    .iter()
                    .filter_map(|id| self.enemies.get(*id))
                    .map(EntityRef::Enemy),
            )
            .chain(
                self.active_bullets
                    .iter()
                    .filter_map(|id| self.bullets.get(*id))
                    .map(EntityRef::Bullet),
            )
            .chain(
                self.active_particles
                    .iter()
                    .filter_map(|id| self.particles.get(*id))
                    .map(EntityRef::Particle),
            )
    }

    /// Place a platform and maybe an enemy on top of it
    pub fn spawn_platform(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        kind: PlatformKind,
        move_speed: f32,
    ) -> SlotId {
        let (id, platform) = self.platforms.acquire();
        platform.init(Vec2::new(x, y), width, kind, move_speed);
        self.active_platforms.push(id);

        if rolls_enemy(kind, &self.params, &mut self.rng) {
            self.spawn_enemy(x, y - 25.0, Some((id, width)));
        }
        id
    }

    pub fn spawn_enemy(&mut self, x: f32, y: f32, anchor: Option<(SlotId, f32)>) -> SlotId {
        let kind = if chance(&mut self.rng, self.params.shooter_ratio) {
            EnemyKind::Shooter
        } else {
            EnemyKind::Touch
        };
        let speed = self.params.enemy_move_speed;

        let (id, enemy) = self.enemies.acquire();
        enemy.init(Vec2::new(x, y), kind, anchor, &mut self.rng);
        enemy.vel.x = rand_between(&mut self.rng, -speed, speed);
        self.active_enemies.push(id);
        log::debug!("Spawned {:?} enemy at ({:.0}, {:.0})", kind, x, y);
        id
    }

    /// Fire a bullet from `from` toward `target` at the tier's bullet speed
    pub fn spawn_bullet(&mut self, from: Vec2, target: Vec2) -> SlotId {
        let speed = self.params.bullet_speed;
        let delta = target - from;
        let vel = if delta.length() > 0.0 {
            delta.normalize() * speed
        } else {
            Vec2::new(0.0, speed)
        };

        let (id, bullet) = self.bullets.acquire();
        bullet.init(from, vel);
        self.active_bullets.push(id);
        id
    }

    /// Radial burst of particles, limited by `particle_cap`
    pub fn spawn_burst(&mut self, pos: Vec2, count: usize, color: u32) {
        let room = self.particle_cap.saturating_sub(self.active_particles.len());
        for _ in 0..count.min(room) {
            let angle = rand_between(&mut self.rng, 0.0, std::f32::consts::TAU);
            let speed = rand_between(&mut self.rng, 40.0, 160.0);
            let life = rand_between(&mut self.rng, 0.4, 0.9);
            let size = rand_between(&mut self.rng, 2.0, 4.0);
            let vel = Vec2::new(angle.cos(), angle.sin()) * speed;

            let (id, particle) = self.particles.acquire();
            particle.init(pos, vel, life, size, color);
            self.active_particles.push(id);
        }
    }

    /// Apply damage to the run: lowers the score and starts the cooldown
    pub fn take_damage(&mut self, amount: f32) {
        self.score = (self.score - amount).max(0.0);
        self.damage_timer = DAMAGE_COOLDOWN;
        self.player.take_damage();
        self.push_event(GameEvent::PlayerDamaged(amount));
        let pos = self.player.pos;
        self.spawn_burst(pos, 8, 0xff4d4d);
    }

    /// Record a finished run; returns true on a new best
    pub(crate) fn record_run(&mut self, timestamp: f64) -> bool {
        let new_best = self.score > self.best_score;
        if new_best {
            self.best_score = self.score;
        }
        if self.highscores.add_score(self.score, self.tier, timestamp).is_some() || new_best {
            self.highscores.save(self.store.as_mut());
        }
        new_best
    }

    /// Axis-aligned bounds of the player
    pub fn player_bounds(&self) -> super::collision::Rect {
        self.player.bounds()
    }
}

fn sanitize_extent(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;

    fn state() -> GameState {
        GameState::new(400.0, 600.0, 7, Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_new_starts_in_menu() {
        let s = state();
        assert_eq!(s.phase, GamePhase::Menu);
        assert_eq!(s.platforms.available_count(), PLATFORM_POOL_SIZE);
        assert_eq!(s.enemies.available_count(), ENEMY_POOL_SIZE);
        assert_eq!(s.bullets.available_count(), BULLET_POOL_SIZE);
        assert_eq!(s.best_score, 0.0);
    }

    #[test]
    fn test_bad_viewport_falls_back() {
        let s = GameState::new(f32::NAN, -1.0, 1, Box::new(MemoryStore::new()));
        assert_eq!(s.width, WORLD_WIDTH);
        assert_eq!(s.height, FALLBACK_HEIGHT);
    }

    #[test]
    fn test_take_damage_scenario() {
        let mut s = state();
        s.score = 100.0;
        s.params = DifficultyParams::for_tier(4);

        let amount = s.params.enemy_damage;
        assert_eq!(amount, 14.0);
        s.take_damage(amount);
        assert_eq!(s.score, 86.0);
        assert_eq!(s.damage_timer, DAMAGE_COOLDOWN);
        assert!(s.player.blink_timer > 0.0);
        assert!(matches!(s.drain_events()[0], GameEvent::PlayerDamaged(a) if a == 14.0));

        // Damage never drives the score negative
        s.take_damage(1000.0);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn test_bullet_straight_down_when_colocated() {
        let mut s = state();
        let id = s.spawn_bullet(Vec2::new(10.0, 10.0), Vec2::new(10.0, 10.0));
        let bullet = s.bullets.get(id).unwrap();
        assert_eq!(bullet.vel, Vec2::new(0.0, s.params.bullet_speed));

        let id = s.spawn_bullet(Vec2::ZERO, Vec2::new(3.0, 4.0));
        let v = s.bullets.get(id).unwrap().vel;
        assert!((v.length() - s.params.bullet_speed).abs() < 1e-3);
    }

    #[test]
    fn test_burst_respects_cap() {
        let mut s = state();
        s.particle_cap = 5;
        s.spawn_burst(Vec2::ZERO, 20, 0xffffff);
        assert_eq!(s.active_particles.len(), 5);
        s.particle_cap = 0;
        s.spawn_burst(Vec2::ZERO, 20, 0xffffff);
        assert_eq!(s.active_particles.len(), 5);
    }

    #[test]
    fn test_entities_iterates_player_first() {
        let mut s = state();
        s.spawn_platform(100.0, 100.0, 80.0, PlatformKind::Explosive, 0.0);
        let first = s.entities().next();
        assert!(matches!(first, Some(EntityRef::Player(_))));
        assert!(s.entities().count() >= 2);
    }
}
