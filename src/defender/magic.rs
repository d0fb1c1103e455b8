//! Spells, mana and power casting
//!
//! Every time-dependent call takes the logical clock in milliseconds so the
//! whole system can be driven from tests without a wall clock.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::Virus;
use super::powers::{Power, PowerBook, PowerId, Resolution, ScheduledHit, resolve};
use crate::sim::collision::Rect;
use crate::sim::entities::Collidable;

pub const SPELL_SPEED: f32 = 400.0;
pub const SPELL_DAMAGE: f32 = 30.0;
pub const SPELL_LIFETIME_MS: f32 = 3000.0;
pub const SPELL_SIZE: f32 = 24.0;
/// Spells this far past any edge are discarded
const OFFSCREEN_MARGIN: f32 = 50.0;

pub const CAST_COOLDOWN_MS: f64 = 300.0;
pub const MAX_MANA: f32 = 100.0;
/// Mana per second
pub const MANA_REGEN: f32 = 20.0;
pub const SPELL_COST: f32 = 15.0;
pub const MODE_TOGGLE_COOLDOWN_MS: f64 = 500.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicSpell {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub age_ms: f32,
    pub active: bool,
}

impl MagicSpell {
    /// `direction` need not be normalized; a zero direction yields a spell at rest
    pub fn new(pos: Vec2, direction: Vec2) -> Self {
        Self {
            pos,
            vel: direction.normalize_or_zero() * SPELL_SPEED,
            damage: SPELL_DAMAGE,
            age_ms: 0.0,
            active: true,
        }
    }

    pub fn update(&mut self, dt: f32, width: f32, height: f32) {
        if !self.active {
            return;
        }
        self.pos += self.vel * dt;
        self.age_ms += dt * 1000.0;

        let off_screen = self.pos.x < -OFFSCREEN_MARGIN
            || self.pos.x > width + OFFSCREEN_MARGIN
            || self.pos.y < -OFFSCREEN_MARGIN
            || self.pos.y > height + OFFSCREEN_MARGIN;
        if off_screen || self.age_ms >= SPELL_LIFETIME_MS {
            self.active = false;
        }
    }

    pub fn destroy(&mut self) {
        self.active = false;
    }
}

impl Collidable for MagicSpell {
    fn bounds(&self) -> Rect {
        Rect::centered(self.pos, SPELL_SIZE, SPELL_SIZE)
    }
}

/// What the cast button does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CastMode {
    #[default]
    Basic,
    Power,
}

#[derive(Debug, Clone)]
pub struct MagicSystem {
    pub spells: Vec<MagicSpell>,
    pub mana: f32,
    pub max_mana: f32,
    pub mode: CastMode,
    pub powers: PowerBook,
    last_cast_ms: Option<f64>,
    last_toggle_ms: Option<f64>,
    /// Last use of each power
    power_used_ms: HashMap<PowerId, f64>,
    pending: Vec<ScheduledHit>,
}

impl Default for MagicSystem {
    fn default() -> Self {
        Self {
            spells: Vec::new(),
            mana: MAX_MANA,
            max_mana: MAX_MANA,
            mode: CastMode::Basic,
            powers: PowerBook::new(),
            last_cast_ms: None,
            last_toggle_ms: None,
            power_used_ms: HashMap::new(),
            pending: Vec::new(),
        }
    }
}

fn elapsed(since: Option<f64>, now_ms: f64, cooldown_ms: f64) -> bool {
    since.is_none_or(|t| now_ms - t >= cooldown_ms)
}

impl MagicSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_cast(&self, now_ms: f64) -> bool {
        elapsed(self.last_cast_ms, now_ms, CAST_COOLDOWN_MS) && self.mana >= SPELL_COST
    }

    /// Fire a basic spell. Mana is only spent if the spell is actually spawned.
    pub fn cast_spell(&mut self, origin: Vec2, direction: Vec2, now_ms: f64) -> bool {
        if !self.can_cast(now_ms) || direction.length_squared() == 0.0 {
            return false;
        }
        self.mana -= SPELL_COST;
        self.last_cast_ms = Some(now_ms);
        self.spells.push(MagicSpell::new(origin, direction));
        true
    }

    pub fn current_power(&self) -> &'static Power {
        self.powers.current()
    }

    pub fn can_use_power(&self, now_ms: f64) -> bool {
        let power = self.current_power();
        self.mana >= power.mana_cost
            && elapsed(
                self.power_used_ms.get(&power.id).copied(),
                now_ms,
                power.cooldown_ms,
            )
    }

    /// Milliseconds until the selected power is off cooldown
    pub fn power_cooldown_remaining(&self, now_ms: f64) -> f64 {
        let power = self.current_power();
        self.power_used_ms
            .get(&power.id)
            .map_or(0.0, |t| (power.cooldown_ms - (now_ms - t)).max(0.0))
    }

    /// Unleash the selected power around `target`.
    ///
    /// Hits due now are delivered before returning; staggered hits wait in the
    /// pending queue for [`MagicSystem::apply_pending`].
    pub fn use_power(
        &mut self,
        target: Vec2,
        enemies: &mut [Virus],
        now_ms: f64,
    ) -> Option<Resolution> {
        if !self.can_use_power(now_ms) {
            return None;
        }
        let power = self.current_power();
        self.mana -= power.mana_cost;
        self.power_used_ms.insert(power.id, now_ms);
        log::info!("Power cast: {} at ({:.0}, {:.0})", power.name, target.x, target.y);

        let mut resolution = resolve(power, enemies, target, now_ms);
        self.pending.extend(resolution.scheduled.iter().copied());
        resolution
            .killed
            .extend(self.apply_pending(enemies, now_ms));
        Some(resolution)
    }

    /// Deliver every pending hit that is due. Returns the ids it killed.
    ///
    /// A hit whose virus has died or gone away is dropped.
    pub fn apply_pending(&mut self, enemies: &mut [Virus], now_ms: f64) -> Vec<u32> {
        let mut killed = Vec::new();
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|h| h.due_ms <= now_ms);
        self.pending = waiting;

        for hit in due {
            if let Some(enemy) = enemies
                .iter_mut()
                .find(|e| e.id == hit.enemy_id && e.is_alive())
                && enemy.take_damage(hit.damage)
            {
                killed.push(enemy.id);
            }
        }
        killed
    }

    pub fn pending_hits(&self) -> &[ScheduledHit] {
        &self.pending
    }

    pub fn toggle_mode(&mut self, now_ms: f64) -> bool {
        if !elapsed(self.last_toggle_ms, now_ms, MODE_TOGGLE_COOLDOWN_MS) {
            return false;
        }
        self.last_toggle_ms = Some(now_ms);
        self.mode = match self.mode {
            CastMode::Basic => CastMode::Power,
            CastMode::Power => CastMode::Basic,
        };
        log::debug!("Cast mode: {:?}", self.mode);
        true
    }

    pub fn cycle_power(&mut self) -> &'static Power {
        self.powers.switch_power()
    }

    pub fn update(&mut self, dt: f32, width: f32, height: f32) {
        self.mana = (self.mana + MANA_REGEN * dt).min(self.max_mana);
        for spell in &mut self.spells {
            spell.update(dt, width, height);
        }
        self.spells.retain(|s| s.active);
    }

    pub fn mana_percent(&self) -> f32 {
        if self.max_mana > 0.0 {
            self.mana / self.max_mana * 100.0
        } else {
            0.0
        }
    }

    pub fn clear_all_spells(&mut self) {
        self.spells.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn viruses(healths: &[f32]) -> Vec<Virus> {
        let mut rng = Pcg32::seed_from_u64(9);
        healths
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                let mut v = Virus::new(i as u32, Vec2::new(300.0 + i as f32 * 20.0, 400.0), &mut rng);
                v.health = h;
                v
            })
            .collect()
    }

    #[test]
    fn test_cast_spends_mana_and_respects_cooldown() {
        let mut magic = MagicSystem::new();
        assert!(magic.cast_spell(Vec2::ZERO, Vec2::X, 0.0));
        assert_eq!(magic.mana, MAX_MANA - SPELL_COST);
        assert_eq!(magic.spells.len(), 1);
        assert_eq!(magic.spells[0].vel, Vec2::new(SPELL_SPEED, 0.0));

        assert!(!magic.cast_spell(Vec2::ZERO, Vec2::X, 299.0));
        assert!(magic.cast_spell(Vec2::ZERO, Vec2::X, 300.0));
        assert_eq!(magic.spells.len(), 2);
    }

    #[test]
    fn test_failed_cast_changes_nothing() {
        let mut magic = MagicSystem::new();
        magic.mana = SPELL_COST - 1.0;
        assert!(!magic.cast_spell(Vec2::ZERO, Vec2::X, 1000.0));
        assert_eq!(magic.mana, SPELL_COST - 1.0);
        assert!(magic.spells.is_empty());

        // Zero direction is not a cast either, and does not start the cooldown
        magic.mana = MAX_MANA;
        assert!(!magic.cast_spell(Vec2::ZERO, Vec2::ZERO, 1000.0));
        assert_eq!(magic.mana, MAX_MANA);
        assert!(magic.can_cast(1000.0));
    }

    #[test]
    fn test_mana_regenerates_to_cap() {
        let mut magic = MagicSystem::new();
        magic.mana = 10.0;
        magic.update(0.5, 1024.0, 600.0);
        assert!((magic.mana - 20.0).abs() < 1e-4);
        magic.update(10.0, 1024.0, 600.0);
        assert_eq!(magic.mana, MAX_MANA);
        assert_eq!(magic.mana_percent(), 100.0);
    }

    #[test]
    fn test_spells_expire_off_screen_and_by_age() {
        let mut magic = MagicSystem::new();
        magic.cast_spell(Vec2::new(1000.0, 300.0), Vec2::X, 0.0);
        magic.update(0.2, 1024.0, 600.0);
        assert!(magic.spells.is_empty());

        let mut slow = MagicSpell::new(Vec2::new(500.0, 300.0), Vec2::ZERO);
        slow.update(2.9, 1024.0, 600.0);
        assert!(slow.active);
        slow.update(0.1, 1024.0, 600.0);
        assert!(!slow.active);
    }

    #[test]
    fn test_reduce_power_wipes_pack() {
        let mut magic = MagicSystem::new();
        let mut enemies = viruses(&[40.0, 40.0, 40.0]);
        let res = magic
            .use_power(Vec2::new(320.0, 400.0), &mut enemies, 0.0)
            .expect("power should fire");

        assert_eq!(enemies[0].health, -110.0);
        assert!(enemies.iter().all(|e| !e.is_alive()));
        assert_eq!(res.killed.len(), 3);
        assert_eq!(magic.mana, MAX_MANA - 25.0);

        // On cooldown now
        assert!(magic.use_power(Vec2::new(320.0, 400.0), &mut enemies, 1999.0).is_none());
        assert_eq!(magic.mana, MAX_MANA - 25.0);
        assert!(magic.can_use_power(2000.0));
    }

    #[test]
    fn test_power_without_mana_is_refused() {
        let mut magic = MagicSystem::new();
        magic.mana = 24.0;
        let mut enemies = viruses(&[40.0, 40.0]);
        assert!(magic.use_power(Vec2::new(310.0, 400.0), &mut enemies, 0.0).is_none());
        assert_eq!(magic.mana, 24.0);
        assert!(enemies.iter().all(|e| e.health == 40.0));
    }

    #[test]
    fn test_foreach_hits_land_over_time() {
        let mut magic = MagicSystem::new();
        magic.powers.unlock_level(4);
        assert!(magic.powers.select(PowerId::ForEach));
        let mut enemies = viruses(&[50.0, 50.0, 50.0]);

        magic.use_power(Vec2::new(320.0, 400.0), &mut enemies, 1000.0);
        // First hit lands immediately
        assert_eq!(enemies[0].health, 15.0);
        assert_eq!(enemies[1].health, 50.0);
        assert_eq!(magic.pending_hits().len(), 2);

        magic.apply_pending(&mut enemies, 1199.0);
        assert_eq!(enemies[1].health, 50.0);
        magic.apply_pending(&mut enemies, 1200.0);
        assert_eq!(enemies[1].health, 15.0);

        // Target died in the meantime: its hit is dropped
        enemies[2].take_damage(100.0);
        let killed = magic.apply_pending(&mut enemies, 5000.0);
        assert!(killed.is_empty());
        assert!(magic.pending_hits().is_empty());
    }

    #[test]
    fn test_mode_toggle_cooldown() {
        let mut magic = MagicSystem::new();
        assert!(magic.toggle_mode(0.0));
        assert_eq!(magic.mode, CastMode::Power);
        assert!(!magic.toggle_mode(499.0));
        assert_eq!(magic.mode, CastMode::Power);
        assert!(magic.toggle_mode(500.0));
        assert_eq!(magic.mode, CastMode::Basic);
    }

    #[test]
    fn test_clear_all_spells_drops_pending() {
        let mut magic = MagicSystem::new();
        magic.cast_spell(Vec2::ZERO, Vec2::Y, 0.0);
        magic.powers.unlock_level(6);
        magic.powers.select(PowerId::Sort);
        let mut enemies = viruses(&[50.0, 50.0]);
        magic.use_power(Vec2::new(310.0, 400.0), &mut enemies, 0.0);
        assert_eq!(magic.pending_hits().len(), 1);

        magic.clear_all_spells();
        assert!(magic.spells.is_empty());
        assert!(magic.pending_hits().is_empty());
    }
}
