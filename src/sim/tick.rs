//! Per-frame climber step
//!
//! One call to [`tick`] runs the whole frame in a fixed order: player,
//! platforms, enemies, bullets, particles, collisions, camera, generation,
//! score, cleanup, game over, timers.

use glam::Vec2;

use super::collision::{aabb_overlap, circle_rect_overlap, is_landing};
use super::difficulty::{DifficultyParams, tier_for_score};
use super::entities::{Collidable, MoveIntent, PlatformKind};
use super::pool::SlotId;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::{clamp_dt, rand_between, signed_between};

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    fn intent(&self) -> MoveIntent {
        MoveIntent {
            left: self.left,
            right: self.right,
        }
    }
}

/// Platforms in the opening column
const INITIAL_PLATFORMS: usize = 18;

/// Start (or restart) a run
pub fn reset(state: &mut GameState) {
    state.active_platforms.clear();
    state.active_enemies.clear();
    state.active_bullets.clear();
    state.active_particles.clear();
    state.platforms.release_all();
    state.enemies.release_all();
    state.bullets.release_all();
    state.particles.release_all();
    state.events.clear();

    let height = state.safe_height();
    state.player.reset();
    state.player.pos = Vec2::new(state.width / 2.0, height - 100.0);

    state.score = STARTING_SCORE;
    state.max_height = state.player.pos.y;
    state.tier = 0;
    state.params = DifficultyParams::for_tier(0);

    state.camera_y = 0.0;
    state.camera_target_y = 0.0;
    state.damage_timer = 0.0;
    state.fall_timer = 0.0;

    state.frontier_y = state.player.pos.y + 40.0;
    generate_initial_platforms(state);
    state.generation_height = state.frontier_y - height * 3.0;

    state.set_state(GamePhase::Playing);
    log::info!(
        "Climber reset: {} platforms, {} enemies",
        state.active_platforms.len(),
        state.active_enemies.len()
    );
}

/// One wide platform under the player, then an easy column above it
fn generate_initial_platforms(state: &mut GameState) {
    let start_y = state.frontier_y;
    let center = state.width / 2.0;
    state.spawn_platform(center, start_y, 120.0, PlatformKind::Horizontal, 25.0);

    let mut y = start_y;
    for _ in 0..INITIAL_PLATFORMS {
        y -= rand_between(&mut state.rng, 50.0, 70.0);
        let x = rand_between(&mut state.rng, 60.0, state.width - 60.0);
        let width = rand_between(&mut state.rng, 80.0, 120.0);

        let roll: f32 = rand_between(&mut state.rng, 0.0, 1.0);
        let (kind, speed) = if roll < 0.6 {
            (PlatformKind::Horizontal, signed_between(&mut state.rng, 20.0, 40.0))
        } else if roll < 0.85 {
            (PlatformKind::Vertical, signed_between(&mut state.rng, 15.0, 30.0))
        } else {
            (PlatformKind::Explosive, 0.0)
        };

        state.spawn_platform(x, y, width, kind, speed);
    }
    state.frontier_y = y;
}

/// Lazily extend the level above the camera
pub fn generate_platforms(state: &mut GameState) {
    let mut generated = 0;
    while state.frontier_y > state.generation_height {
        if generated >= MAX_PLATFORMS_PER_PASS {
            log::warn!(
                "Generation pass capped at {} platforms (frontier {:.0}, target {:.0})",
                MAX_PLATFORMS_PER_PASS,
                state.frontier_y,
                state.generation_height
            );
            break;
        }

        let p = state.params;
        let gap = rand_between(&mut state.rng, p.platform_gap_y * 0.8, p.platform_gap_y * 1.3);
        state.frontier_y -= gap;

        let x = rand_between(&mut state.rng, 60.0, state.width - 60.0);
        let width = rand_between(&mut state.rng, p.platform_width_min, p.platform_width_max);

        let horizontal = 0.6;
        let vertical = 0.25;
        let roll: f32 = rand_between(&mut state.rng, 0.0, 1.0);
        let (kind, speed) = if roll < horizontal {
            (PlatformKind::Horizontal, signed_between(&mut state.rng, 25.0, 45.0))
        } else if roll < horizontal + vertical {
            (PlatformKind::Vertical, signed_between(&mut state.rng, 20.0, 35.0))
        } else if roll < horizontal + vertical + p.explosive_platform_chance {
            (PlatformKind::Explosive, 0.0)
        } else {
            (PlatformKind::Horizontal, signed_between(&mut state.rng, 25.0, 45.0))
        };

        let y = state.frontier_y;
        state.spawn_platform(x, y, width, kind, speed);
        generated += 1;
    }

    if generated > 0 {
        log::debug!("Generated {} platforms, frontier at {:.0}", generated, state.frontier_y);
    }

    let next = state.camera_y - state.safe_height() * 2.0;
    if next.is_finite() {
        state.generation_height = next;
    }
}

/// Advance the climber by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        match state.phase {
            GamePhase::Playing => state.set_state(GamePhase::Paused),
            GamePhase::Paused => state.set_state(GamePhase::Playing),
            _ => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    let dt = clamp_dt(dt);
    if dt <= 0.0 {
        return;
    }

    let params = state.params;
    let width = state.width;
    state.player.update(dt, input.intent(), &params, width);

    update_platforms(state, dt);
    update_enemies(state, dt);
    update_projectiles(state, dt);

    check_collisions(state);
    update_camera(state, dt);
    generate_platforms(state);
    update_score(state, dt);
    cleanup(state);
    check_game_over(state);

    state.damage_timer = (state.damage_timer - dt).max(0.0);
}

fn update_platforms(state: &mut GameState, dt: f32) {
    let player = Some(state.player.pos);
    let mut exploded = Vec::new();

    for id in &state.active_platforms {
        if let Some(platform) = state.platforms.get_mut(*id) {
            let was_active = platform.active;
            platform.update(dt, state.width, player);
            if was_active && !platform.active && platform.kind == PlatformKind::Explosive {
                exploded.push(platform.pos);
            }
        }
    }

    for pos in exploded {
        log::debug!("Platform exploded at ({:.0}, {:.0})", pos.x, pos.y);
        state.push_event(GameEvent::PlatformExploded { pos });
        state.spawn_burst(pos, 12, 0xff8c1a);
    }
}

fn update_enemies(state: &mut GameState, dt: f32) {
    let mut shots = Vec::new();

    for i in 0..state.active_enemies.len() {
        let id = state.active_enemies[i];
        let anchor_x = state
            .enemies
            .get(id)
            .and_then(|e| e.anchor)
            .and_then(|pid| state.platforms.get(pid))
            .filter(|p| p.active)
            .map(|p| p.pos.x);

        let Some(enemy) = state.enemies.get_mut(id) else {
            continue;
        };
        enemy.update(dt, state.width, anchor_x);
        if enemy.try_shoot(&mut state.rng) {
            shots.push(enemy.pos);
        }
    }

    let target = state.player.pos;
    for from in shots {
        state.spawn_bullet(from, target);
        state.push_event(GameEvent::EnemyShot { pos: from });
    }
}

fn update_projectiles(state: &mut GameState, dt: f32) {
    let view_bottom = state.safe_camera_y() + state.safe_height();
    for id in &state.active_bullets {
        if let Some(bullet) = state.bullets.get_mut(*id) {
            bullet.update(dt, state.width, view_bottom);
        }
    }
    for id in &state.active_particles {
        if let Some(particle) = state.particles.get_mut(*id) {
            particle.update(dt);
        }
    }
}

/// Landing, then enemy contact, then bullets; at most one of each per frame
pub fn check_collisions(state: &mut GameState) {
    let player_box = state.player.bounds();
    let vy = state.player.vel.y;

    let landed_on = state.active_platforms.iter().copied().find(|id| {
        state
            .platforms
            .get(*id)
            .is_some_and(|p| p.active && is_landing(&player_box, vy, &p.bounds()))
    });

    if let Some(id) = landed_on
        && let Some(platform) = state.platforms.get_mut(id)
    {
        let top = platform.pos.y - platform.h / 2.0;
        platform.step_on();
        state.player.pos.y = top - state.player.h / 2.0;
        state.player.on_ground = true;
        state.player.jump(state.params.jump_velocity);
        state.push_event(GameEvent::Jumped);
    }

    let player_box = state.player.bounds();

    if state.damage_timer <= 0.0 {
        let touched = state.active_enemies.iter().any(|id| {
            state
                .enemies
                .get(*id)
                .is_some_and(|e| e.active && aabb_overlap(&player_box, &e.bounds()))
        });
        if touched {
            state.take_damage(state.params.enemy_damage);
        }
    }

    if state.damage_timer <= 0.0 {
        let hit = state.active_bullets.iter().copied().find(|id| {
            state
                .bullets
                .get(*id)
                .is_some_and(|b| b.active && circle_rect_overlap(&b.circle(), &player_box))
        });
        if let Some(id) = hit {
            if let Some(bullet) = state.bullets.get_mut(id) {
                bullet.active = false;
            }
            state.take_damage(state.params.enemy_damage);
        }
    }
}

/// Ease the camera toward the player when they climb into the top 30%
pub fn update_camera(state: &mut GameState, dt: f32) {
    if !dt.is_finite() || dt <= 0.0 {
        return;
    }

    let height = state.safe_height();
    if state.player.pos.y < state.camera_y + height * 0.3 {
        state.camera_target_y = state.player.pos.y - height * 0.3;
    }

    let delta = (state.camera_target_y - state.camera_y) * CAMERA_SPEED * dt;
    if delta.is_finite() {
        state.camera_y += delta;
    }

    if !state.camera_y.is_finite() {
        log::warn!("Camera position was non-finite, resetting");
        state.camera_y = 0.0;
    }
    if !state.camera_target_y.is_finite() {
        state.camera_target_y = 0.0;
    }
}

fn update_score(state: &mut GameState, dt: f32) {
    // Height ratchet
    if state.player.pos.y < state.max_height {
        state.max_height = state.player.pos.y;
        let height_score = (-state.max_height / SCORE_PER_HEIGHT).floor();
        if height_score > state.score {
            state.score = height_score;
            state.push_event(GameEvent::ScoreChanged(state.score));
        }
    }

    // Falling behind the camera
    let threshold = state.safe_camera_y() + state.safe_height() * 0.8;
    if state.player.pos.y > threshold {
        state.fall_timer += dt;
        if state.fall_timer >= 1.0 {
            let penalty = state.params.fall_penalty_rate.floor();
            state.score = (state.score - penalty).max(0.0);
            state.fall_timer = 0.0;
            state.push_event(GameEvent::ScoreChanged(state.score));
        }
    } else {
        state.fall_timer = 0.0;
    }

    update_tier(state);
}

/// Recompute difficulty when the score crosses a tier boundary
pub fn update_tier(state: &mut GameState) {
    let tier = tier_for_score(state.score);
    if tier != state.tier {
        log::info!("Tier {} -> {} at score {}", state.tier, tier, state.score);
        state.tier = tier;
        state.params = DifficultyParams::for_tier(tier);
        state.push_event(GameEvent::TierChanged(tier));
        state.push_event(GameEvent::ScoreChanged(state.score));
    }
}

/// Release every entity that is inactive or far outside the view
pub fn cleanup(state: &mut GameState) {
    let camera = state.safe_camera_y();
    let bottom = camera + state.safe_height() + 500.0;
    let top = camera - 1000.0;
    let in_band = |y: f32| y >= top && y <= bottom;

    let mut released_platforms: Vec<SlotId> = Vec::new();
    state.active_platforms.retain(|id| {
        let keep = state
            .platforms
            .get(*id)
            .is_some_and(|p| p.active && in_band(p.pos.y));
        if !keep {
            state.platforms.release(*id);
            released_platforms.push(*id);
        }
        keep
    });

    state.active_enemies.retain(|id| {
        let keep = state
            .enemies
            .get(*id)
            .is_some_and(|e| e.active && in_band(e.pos.y));
        if !keep {
            state.enemies.release(*id);
        }
        keep
    });

    // A released platform slot may be reused; drop stale anchors
    if !released_platforms.is_empty() {
        for id in &state.active_enemies {
            if let Some(enemy) = state.enemies.get_mut(*id)
                && enemy.anchor.is_some_and(|a| released_platforms.contains(&a))
            {
                enemy.anchor = None;
            }
        }
    }

    state.active_bullets.retain(|id| {
        let keep = state
            .bullets
            .get(*id)
            .is_some_and(|b| b.active && in_band(b.pos.y));
        if !keep {
            state.bullets.release(*id);
        }
        keep
    });

    state.active_particles.retain(|id| {
        let keep = state.particles.get(*id).is_some_and(|p| p.active);
        if !keep {
            state.particles.release(*id);
        }
        keep
    });
}

fn check_game_over(state: &mut GameState) {
    let limit = state.safe_camera_y() + state.safe_height() * 1.5;
    if state.score < 0.0 || state.player.pos.y > limit {
        game_over(state);
    }
}

/// End the run once; later calls do nothing
pub fn game_over(state: &mut GameState) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    state.set_state(GamePhase::GameOver);

    let new_best = state.record_run(state.wall_clock_ms);
    log::info!(
        "Game over: score={} best={}{}",
        state.score,
        state.best_score,
        if new_best { " (new best)" } else { "" }
    );
    state.push_event(GameEvent::GameOver {
        score: state.score,
        best: state.best_score,
    });
}
