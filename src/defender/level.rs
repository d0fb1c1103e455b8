//! Arena level orchestration
//!
//! One hero, a handful of floating platforms and a virus manager. The level
//! owns its logical clock: `elapsed_ms` only advances while playing, and every
//! cooldown in the magic system is measured against it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hero::{CastOutcome, Hero};
use super::manager::EnemyManager;
use super::powers::PowerId;
use crate::clamp_dt;
use crate::sim::collision::Rect;

pub const DEFAULT_WIDTH: f32 = 1024.0;
pub const DEFAULT_HEIGHT: f32 = 600.0;
/// Ground line sits this far above the bottom edge
pub const GROUND_OFFSET: f32 = 80.0;
pub const ENEMIES_TO_WIN: u32 = 10;
pub const TIME_LIMIT_MS: f64 = 180_000.0;
pub const SCORE_PER_DEFEAT: u32 = 100;
/// One new power for every this many defeats
pub const DEFEATS_PER_UNLOCK: u32 = 2;
/// Falling this far below the bottom edge is fatal
const FALL_MARGIN: f32 = 100.0;

const PLATFORMS: [(f32, f32, f32, f32); 5] = [
    (200.0, 450.0, 150.0, 20.0),
    (450.0, 380.0, 120.0, 20.0),
    (700.0, 320.0, 150.0, 20.0),
    (100.0, 300.0, 100.0, 20.0),
    (800.0, 450.0, 120.0, 20.0),
];

const INITIAL_ENEMIES: [Vec2; 3] = [
    Vec2::new(800.0, 400.0),
    Vec2::new(150.0, 400.0),
    Vec2::new(600.0, 300.0),
];

/// Input snapshot for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelInput {
    pub up: bool,
    pub left: bool,
    pub down: bool,
    pub right: bool,
    pub jump: bool,
    pub cast_pressed: bool,
    /// Pointer position in world space
    pub mouse: Vec2,
    pub toggle_mode: bool,
    pub cycle_power: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    Playing,
    Paused,
    Complete,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    HeroDefeated,
    Fell,
    TimeUp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LevelEvent {
    PlayerDamaged(f32),
    HealthChanged(f32),
    EnemyDefeated { id: u32 },
    ScoreChanged(u32),
    SpellCast,
    PowerCast(PowerId),
    PowerUnlocked(PowerId),
    LevelComplete { score: u32, elapsed_ms: f64 },
    GameOver(GameOverReason),
}

pub struct Level {
    pub width: f32,
    pub height: f32,
    pub ground_y: f32,
    pub platforms: Vec<Rect>,
    pub hero: Hero,
    pub enemies: EnemyManager,
    pub phase: LevelPhase,
    pub score: u32,
    pub defeated: u32,
    pub enemies_to_win: u32,
    pub time_limit_ms: f64,
    elapsed_ms: f64,
    seed: u64,
    events: Vec<LevelEvent>,
}

impl Level {
    pub fn new(width: f32, height: f32, seed: u64) -> Self {
        let width = if width.is_finite() && width > 0.0 { width } else { DEFAULT_WIDTH };
        let height = if height.is_finite() && height > 0.0 { height } else { DEFAULT_HEIGHT };

        let mut enemies = EnemyManager::new(seed);
        for pos in INITIAL_ENEMIES {
            enemies.spawn_enemy(pos);
        }

        log::info!("Level started ({}x{}, seed {})", width, height, seed);
        Self {
            width,
            height,
            ground_y: height - GROUND_OFFSET,
            platforms: PLATFORMS
                .iter()
                .map(|&(x, y, w, h)| Rect::new(x, y, w, h))
                .collect(),
            hero: Hero::new(Hero::spawn_point(width, height)),
            enemies,
            phase: LevelPhase::Playing,
            score: 0,
            defeated: 0,
            enemies_to_win: ENEMIES_TO_WIN,
            time_limit_ms: TIME_LIMIT_MS,
            elapsed_ms: 0.0,
            seed,
            events: Vec::new(),
        }
    }

    /// Start over with the same size and seed
    pub fn restart(&mut self) {
        *self = Self::new(self.width, self.height, self.seed);
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn remaining_time_ms(&self) -> f64 {
        (self.time_limit_ms - self.elapsed_ms).max(0.0)
    }

    /// Fraction of the defeat goal reached, 0..=1
    pub fn progress(&self) -> f32 {
        if self.enemies_to_win == 0 {
            return 1.0;
        }
        (self.defeated as f32 / self.enemies_to_win as f32).min(1.0)
    }

    pub fn pause(&mut self) {
        if self.phase == LevelPhase::Playing {
            self.phase = LevelPhase::Paused;
            log::info!("Level paused");
        }
    }

    pub fn resume(&mut self) {
        if self.phase == LevelPhase::Paused {
            self.phase = LevelPhase::Playing;
            log::info!("Level resumed");
        }
    }

    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn update(&mut self, dt: f32, input: &LevelInput) {
        if self.phase != LevelPhase::Playing {
            return;
        }
        let dt = clamp_dt(dt);
        if dt <= 0.0 {
            return;
        }

        self.elapsed_ms += dt as f64 * 1000.0;
        if self.elapsed_ms >= self.time_limit_ms {
            self.end(GameOverReason::TimeUp);
            return;
        }
        let now = self.elapsed_ms;

        if input.toggle_mode {
            self.hero.magic.toggle_mode(now);
        }
        if input.cycle_power {
            let power = self.hero.magic.cycle_power();
            log::debug!("Selected power: {}", power.name);
        }

        self.hero
            .update(dt, input, Vec2::new(self.width, self.height));
        if self.hero.pos.y > self.height + FALL_MARGIN {
            self.end(GameOverReason::Fell);
            return;
        }
        self.hero.resolve_surfaces(self.ground_y, &self.platforms);

        if input.cast_pressed {
            match self
                .hero
                .cast(input.mouse, self.enemies.enemies_mut(), now)
            {
                Some(CastOutcome::Spell) => self.events.push(LevelEvent::SpellCast),
                Some(CastOutcome::Power(_)) => self
                    .events
                    .push(LevelEvent::PowerCast(self.hero.magic.current_power().id)),
                None => {}
            }
        }

        let report = self
            .enemies
            .update(dt, self.hero.center(), self.ground_y, self.width);
        for damage in report.hits {
            if self.hero.take_damage(damage) {
                self.events.push(LevelEvent::PlayerDamaged(damage));
                self.events.push(LevelEvent::HealthChanged(self.hero.health));
            }
        }

        self.enemies
            .check_spell_collisions(&mut self.hero.magic.spells);
        self.hero
            .magic
            .apply_pending(self.enemies.enemies_mut(), now);

        let mut defeated = report.defeated;
        defeated.extend(self.enemies.remove_dead());
        for id in defeated {
            self.on_enemy_defeated(id);
        }

        if !self.hero.is_alive() {
            self.end(GameOverReason::HeroDefeated);
        } else if self.defeated >= self.enemies_to_win {
            self.complete();
        }
    }

    fn on_enemy_defeated(&mut self, id: u32) {
        self.defeated += 1;
        self.score += SCORE_PER_DEFEAT;
        self.events.push(LevelEvent::EnemyDefeated { id });
        self.events.push(LevelEvent::ScoreChanged(self.score));

        if self.defeated % DEFEATS_PER_UNLOCK == 0 {
            let level = self.defeated / DEFEATS_PER_UNLOCK + 1;
            if let Some(power) = self.hero.magic.powers.unlock_level(level) {
                self.events.push(LevelEvent::PowerUnlocked(power.id));
            }
        }
    }

    fn complete(&mut self) {
        self.phase = LevelPhase::Complete;
        self.hero.start_victory();
        self.hero.magic.clear_all_spells();
        log::info!(
            "Level complete: score {} in {:.1}s",
            self.score,
            self.elapsed_ms / 1000.0
        );
        self.events.push(LevelEvent::LevelComplete {
            score: self.score,
            elapsed_ms: self.elapsed_ms,
        });
    }

    fn end(&mut self, reason: GameOverReason) {
        self.phase = LevelPhase::GameOver;
        log::info!("Level over ({:?}), score {}", reason, self.score);
        self.events.push(LevelEvent::GameOver(reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defender::hero::Pose;

    fn quiet_level() -> Level {
        let mut level = Level::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, 7);
        level.enemies.clear();
        level
    }

    #[test]
    fn test_initial_layout() {
        let level = Level::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, 1);
        assert_eq!(level.ground_y, 520.0);
        assert_eq!(level.platforms.len(), 5);
        assert_eq!(level.enemies.len(), 3);
        assert_eq!(level.phase, LevelPhase::Playing);
        assert_eq!(level.remaining_time_ms(), TIME_LIMIT_MS);
        assert_eq!(level.progress(), 0.0);
    }

    #[test]
    fn test_bad_dimensions_fall_back() {
        let level = Level::new(f32::NAN, -5.0, 1);
        assert_eq!(level.width, DEFAULT_WIDTH);
        assert_eq!(level.height, DEFAULT_HEIGHT);
    }

    #[test]
    fn test_pause_stops_the_clock() {
        let mut level = quiet_level();
        level.update(0.016, &LevelInput::default());
        let before = level.elapsed_ms();
        let hero = level.hero.pos;

        level.pause();
        for _ in 0..10 {
            level.update(0.016, &LevelInput { right: true, ..Default::default() });
        }
        assert_eq!(level.elapsed_ms(), before);
        assert_eq!(level.hero.pos, hero);

        level.resume();
        level.update(0.016, &LevelInput::default());
        assert!(level.elapsed_ms() > before);
    }

    #[test]
    fn test_time_limit_ends_the_level() {
        let mut level = quiet_level();
        level.time_limit_ms = 100.0;
        for _ in 0..10 {
            level.update(0.016, &LevelInput::default());
        }
        assert_eq!(level.phase, LevelPhase::GameOver);
        let events = level.drain_events();
        assert_eq!(events.last(), Some(&LevelEvent::GameOver(GameOverReason::TimeUp)));
        assert_eq!(level.remaining_time_ms(), 0.0);
    }

    #[test]
    fn test_falling_out_is_fatal() {
        let mut level = quiet_level();
        level.hero.pos.y = level.height + 150.0;
        level.update(0.016, &LevelInput::default());
        assert_eq!(level.phase, LevelPhase::GameOver);
        assert!(
            level
                .drain_events()
                .contains(&LevelEvent::GameOver(GameOverReason::Fell))
        );
    }

    #[test]
    fn test_power_cast_defeats_and_unlocks() {
        let mut level = quiet_level();
        level.enemies.spawn_enemy(Vec2::new(600.0, 504.0));
        level.enemies.spawn_enemy(Vec2::new(620.0, 504.0));

        let input = LevelInput {
            toggle_mode: true,
            cast_pressed: true,
            mouse: Vec2::new(610.0, 504.0),
            ..Default::default()
        };
        level.update(0.016, &input);

        assert_eq!(level.defeated, 2);
        assert_eq!(level.score, 200);
        assert!(level.enemies.is_empty());
        let events = level.drain_events();
        assert!(events.contains(&LevelEvent::PowerCast(PowerId::Reduce)));
        assert!(events.contains(&LevelEvent::PowerUnlocked(PowerId::Map)));
        assert!(events.contains(&LevelEvent::ScoreChanged(200)));
    }

    #[test]
    fn test_ten_defeats_win() {
        let mut level = quiet_level();
        for _ in 0..ENEMIES_TO_WIN {
            if let Some(id) = level.enemies.spawn_enemy(Vec2::new(900.0, 504.0))
                && let Some(virus) = level.enemies.get_mut(id)
            {
                virus.take_damage(999.0);
            }
            level.update(0.016, &LevelInput::default());
        }

        assert_eq!(level.phase, LevelPhase::Complete);
        assert_eq!(level.score, 1000);
        assert_eq!(level.progress(), 1.0);
        assert_eq!(level.hero.pose, Pose::Victory);
        assert_eq!(level.hero.magic.powers.unlocked_powers().len(), 6);
        assert!(
            level
                .drain_events()
                .iter()
                .any(|e| matches!(e, LevelEvent::LevelComplete { score: 1000, .. }))
        );

        // Finished levels ignore further updates
        let elapsed = level.elapsed_ms();
        level.update(0.016, &LevelInput::default());
        assert_eq!(level.elapsed_ms(), elapsed);
    }

    #[test]
    fn test_virus_attack_hurts_hero() {
        let mut level = quiet_level();
        level.hero.pos = Vec2::new(500.0, level.ground_y);
        level.enemies.spawn_enemy(Vec2::new(520.0, 504.0));

        for _ in 0..5 {
            level.update(0.016, &LevelInput::default());
        }
        assert_eq!(level.hero.health, 80.0);
        let events = level.drain_events();
        assert!(events.contains(&LevelEvent::PlayerDamaged(20.0)));
        assert!(events.contains(&LevelEvent::HealthChanged(80.0)));
    }

    #[test]
    fn test_restart_rebuilds() {
        let mut level = Level::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, 3);
        level.score = 500;
        level.pause();
        level.restart();
        assert_eq!(level.score, 0);
        assert_eq!(level.phase, LevelPhase::Playing);
        assert_eq!(level.enemies.len(), 3);
    }
}
