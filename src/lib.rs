//! Climb Defender - two browser game cores
//!
//! Core modules:
//! - `sim`: Infinite climber simulation (pools, generation, difficulty, collisions)
//! - `defender`: Motherboard defender (enemy AI, spells, powers, level)
//! - `platform`: Browser/native platform abstraction (storage, time, input)
//! - `renderer`: Draw-call surface the hosts implement
//! - `highscores` / `settings`: Persisted player data

pub mod audio;
pub mod defender;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};

use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Upper bound on a single simulation step (seconds)
    pub const MAX_DT: f32 = 0.033;
    /// Viewport height used when the configured one is unusable
    pub const FALLBACK_HEIGHT: f32 = 600.0;

    /// Player physics
    pub const GRAVITY: f32 = 1000.0;
    pub const JUMP_VELOCITY: f32 = 420.0;
    pub const PLAYER_ACCELERATION: f32 = 1800.0;
    pub const MAX_VELOCITY_X: f32 = 200.0;
    /// Per-frame (60 Hz) horizontal friction factor
    pub const FRICTION: f32 = 0.88;

    /// World
    pub const WORLD_WIDTH: f32 = 400.0;
    pub const PLATFORM_HEIGHT: f32 = 12.0;
    pub const MIN_PLATFORM_WIDTH: f32 = 70.0;
    pub const MAX_PLATFORM_WIDTH: f32 = 130.0;
    pub const PLATFORM_GAP_Y: f32 = 55.0;

    /// Scoring
    pub const STARTING_SCORE: f32 = 100.0;
    pub const SCORE_PER_HEIGHT: f32 = 40.0;
    pub const POINTS_PER_TIER: f32 = 25.0;
    pub const FALL_PENALTY_PER_SEC: f32 = 6.0;
    pub const DAMAGE_COOLDOWN: f32 = 0.8;

    /// Enemies
    pub const ENEMY_SPAWN_CHANCE: f32 = 0.12;
    pub const SHOOTER_CHANCE: f32 = 0.25;
    pub const BULLET_SPEED: f32 = 180.0;
    pub const ENEMY_DAMAGE: f32 = 8.0;

    /// Entity sizes
    pub const PLAYER_SIZE: f32 = 28.0;
    pub const ENEMY_SIZE: f32 = 20.0;
    pub const BULLET_RADIUS: f32 = 3.0;

    /// Platforms generated by a single generation pass, at most
    pub const MAX_PLATFORMS_PER_PASS: usize = 100;

    /// Camera smoothing speed (1/s)
    pub const CAMERA_SPEED: f32 = 8.0;
}

/// Return `value` if finite, `fallback` otherwise
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Clamp a host-provided timestep into `[0, MAX_DT]`
///
/// Non-finite and negative values become zero so a bad frame simply does nothing.
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if !dt.is_finite() || dt <= 0.0 {
        0.0
    } else {
        dt.min(consts::MAX_DT)
    }
}

/// Uniform value in `[min, max)`; tolerates `min >= max`
#[inline]
pub fn rand_between(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

/// Bernoulli trial with probability `p` (clamped into [0, 1])
#[inline]
pub fn chance(rng: &mut impl Rng, p: f32) -> bool {
    rng.random::<f32>() < p.clamp(0.0, 1.0)
}

/// Random magnitude in `[min, max)` with a random sign
#[inline]
pub fn signed_between(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    let magnitude = rand_between(rng, min, max);
    if chance(rng, 0.5) { magnitude } else { -magnitude }
}
