//! Tiered difficulty
//!
//! Every tunable that scales with progress is derived from a single integer
//! tier, so a snapshot can be rebuilt at any time from the score alone.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Physics and spawn tunables for one difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    pub tier: u32,
    pub gravity: f32,
    pub jump_velocity: f32,
    pub acceleration: f32,
    pub max_velocity_x: f32,
    pub platform_gap_y: f32,
    pub platform_width_min: f32,
    pub platform_width_max: f32,
    pub moving_platform_chance: f32,
    pub enemy_spawn_chance: f32,
    pub shooter_ratio: f32,
    pub bullet_speed: f32,
    pub enemy_move_speed: f32,
    pub fall_penalty_rate: f32,
    pub enemy_damage: f32,
    pub explosive_platform_chance: f32,
}

impl DifficultyParams {
    pub fn for_tier(tier: u32) -> Self {
        let t = tier as f32;
        Self {
            tier,
            gravity: GRAVITY + t * 60.0,
            jump_velocity: JUMP_VELOCITY + t * 15.0,
            acceleration: PLAYER_ACCELERATION + t * 80.0,
            max_velocity_x: MAX_VELOCITY_X + t * 12.0,
            platform_gap_y: PLATFORM_GAP_Y + t * 6.0,
            platform_width_min: (MIN_PLATFORM_WIDTH - t * 2.0).max(50.0),
            platform_width_max: (MAX_PLATFORM_WIDTH - t * 4.0).max(70.0),
            moving_platform_chance: (0.15 + t * 0.025).min(0.4),
            enemy_spawn_chance: (ENEMY_SPAWN_CHANCE + t * 0.02).min(0.28),
            shooter_ratio: (SHOOTER_CHANCE + t * 0.05).min(0.6),
            bullet_speed: BULLET_SPEED + t * 20.0,
            enemy_move_speed: 35.0 + t * 6.0,
            fall_penalty_rate: FALL_PENALTY_PER_SEC + t,
            enemy_damage: ENEMY_DAMAGE + t * 1.5,
            explosive_platform_chance: (0.05 + t * 0.01).min(0.15),
        }
    }
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Self::for_tier(0)
    }
}

/// Tier reached at `score`
#[inline]
pub fn tier_for_score(score: f32) -> u32 {
    if !score.is_finite() || score <= 0.0 {
        return 0;
    }
    (score / POINTS_PER_TIER).floor() as u32
}

/// Score at which the tier after `tier` begins
#[inline]
pub fn next_tier_score(tier: u32) -> f32 {
    (tier + 1) as f32 * POINTS_PER_TIER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_zero_matches_base_constants() {
        let p = DifficultyParams::for_tier(0);
        assert_eq!(p.gravity, 1000.0);
        assert_eq!(p.jump_velocity, 420.0);
        assert_eq!(p.platform_width_min, 70.0);
        assert_eq!(p.platform_width_max, 130.0);
        assert!((p.explosive_platform_chance - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_caps_apply_at_high_tiers() {
        let p = DifficultyParams::for_tier(100);
        assert_eq!(p.platform_width_min, 50.0);
        assert_eq!(p.platform_width_max, 70.0);
        assert_eq!(p.moving_platform_chance, 0.4);
        assert_eq!(p.enemy_spawn_chance, 0.28);
        assert_eq!(p.shooter_ratio, 0.6);
        assert_eq!(p.explosive_platform_chance, 0.15);
        // Uncapped values keep growing
        assert_eq!(p.bullet_speed, 180.0 + 2000.0);
    }

    #[test]
    fn test_tier_for_score() {
        assert_eq!(tier_for_score(0.0), 0);
        assert_eq!(tier_for_score(24.9), 0);
        assert_eq!(tier_for_score(25.0), 1);
        assert_eq!(tier_for_score(100.0), 4);
        assert_eq!(tier_for_score(-5.0), 0);
        assert_eq!(tier_for_score(f32::NAN), 0);
        assert_eq!(next_tier_score(4), 125.0);
    }
}
