//! Unlockable area powers
//!
//! Each power is an immutable descriptor plus a resolution rule over the
//! living viruses near a target point. Staggered powers do not apply their
//! later hits immediately; they hand back [`ScheduledHit`]s keyed on logical
//! milliseconds for the magic system to deliver.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::Virus;

/// Damage that kills any virus outright
pub const LETHAL_DAMAGE: f32 = 999.0;
/// Health fraction below which Filter executes a virus
pub const WEAK_THRESHOLD: f32 = 0.3;
const FOREACH_STAGGER_MS: f64 = 200.0;
const SORT_STAGGER_MS: f64 = 150.0;
const SORT_DAMAGE_STEP: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerId {
    Reduce,
    Map,
    Filter,
    ForEach,
    Find,
    Sort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Collapse every target into the first one
    AreaDamage,
    TransformDamage,
    InstantKillWeak,
    SequentialDamage,
    FindAndMark,
    CascadeDamage,
}

/// Static description of a power
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Power {
    pub id: PowerId,
    pub name: &'static str,
    /// Unlock order, starting at 1
    pub level: u32,
    pub mana_cost: f32,
    pub cooldown_ms: f64,
    pub damage: f32,
    pub range: f32,
    pub effect: EffectKind,
    /// 0xRRGGBB
    pub color: u32,
}

pub const POWERS: [Power; 6] = [
    Power {
        id: PowerId::Reduce,
        name: "Reduce",
        level: 1,
        mana_cost: 25.0,
        cooldown_ms: 2000.0,
        damage: 50.0,
        range: 100.0,
        effect: EffectKind::AreaDamage,
        color: 0xff6b35,
    },
    Power {
        id: PowerId::Map,
        name: "Map",
        level: 2,
        mana_cost: 20.0,
        cooldown_ms: 1500.0,
        damage: 40.0,
        range: 80.0,
        effect: EffectKind::TransformDamage,
        color: 0x4ecdc4,
    },
    Power {
        id: PowerId::Filter,
        name: "Filter",
        level: 3,
        mana_cost: 30.0,
        cooldown_ms: 3000.0,
        damage: LETHAL_DAMAGE,
        range: 120.0,
        effect: EffectKind::InstantKillWeak,
        color: 0x45b7d1,
    },
    Power {
        id: PowerId::ForEach,
        name: "ForEach",
        level: 4,
        mana_cost: 35.0,
        cooldown_ms: 2500.0,
        damage: 35.0,
        range: 150.0,
        effect: EffectKind::SequentialDamage,
        color: 0xf7931e,
    },
    Power {
        id: PowerId::Find,
        name: "Find",
        level: 5,
        mana_cost: 20.0,
        cooldown_ms: 4000.0,
        damage: 80.0,
        range: 200.0,
        effect: EffectKind::FindAndMark,
        color: 0x9b59b6,
    },
    Power {
        id: PowerId::Sort,
        name: "Sort",
        level: 6,
        mana_cost: 40.0,
        cooldown_ms: 3500.0,
        damage: 30.0,
        range: 180.0,
        effect: EffectKind::CascadeDamage,
        color: 0xe74c3c,
    },
];

impl PowerId {
    pub const ALL: [PowerId; 6] = [
        PowerId::Reduce,
        PowerId::Map,
        PowerId::Filter,
        PowerId::ForEach,
        PowerId::Find,
        PowerId::Sort,
    ];

    pub fn descriptor(self) -> &'static Power {
        match self {
            PowerId::Reduce => &POWERS[0],
            PowerId::Map => &POWERS[1],
            PowerId::Filter => &POWERS[2],
            PowerId::ForEach => &POWERS[3],
            PowerId::Find => &POWERS[4],
            PowerId::Sort => &POWERS[5],
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        let found = Self::ALL
            .into_iter()
            .find(|id| id.descriptor().name.eq_ignore_ascii_case(name));
        if found.is_none() {
            log::warn!("Unknown power name: {}", name);
        }
        found
    }

    pub fn for_level(level: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.descriptor().level == level)
    }
}

/// Which powers are unlocked and which one is selected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerBook {
    unlocked: Vec<PowerId>,
    current: PowerId,
}

impl Default for PowerBook {
    fn default() -> Self {
        Self {
            unlocked: vec![PowerId::Reduce],
            current: PowerId::Reduce,
        }
    }
}

impl PowerBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &'static Power {
        self.current.descriptor()
    }

    pub fn current_id(&self) -> PowerId {
        self.current
    }

    pub fn is_unlocked(&self, id: PowerId) -> bool {
        self.unlocked.contains(&id)
    }

    /// Unlocked powers in table order
    pub fn unlocked_powers(&self) -> Vec<&'static Power> {
        POWERS
            .iter()
            .filter(|p| self.unlocked.contains(&p.id))
            .collect()
    }

    /// Select the next unlocked power (table order, wrapping)
    pub fn switch_power(&mut self) -> &'static Power {
        let unlocked: Vec<PowerId> = PowerId::ALL
            .into_iter()
            .filter(|id| self.unlocked.contains(id))
            .collect();
        if let Some(index) = unlocked.iter().position(|id| *id == self.current) {
            self.current = unlocked[(index + 1) % unlocked.len()];
        }
        self.current()
    }

    /// Select a specific unlocked power
    pub fn select(&mut self, id: PowerId) -> bool {
        if self.is_unlocked(id) {
            self.current = id;
            true
        } else {
            false
        }
    }

    /// Unlock the power for `level`; `None` if there is none or it is already unlocked
    pub fn unlock_level(&mut self, level: u32) -> Option<&'static Power> {
        let id = PowerId::for_level(level)?;
        if self.unlocked.contains(&id) {
            return None;
        }
        self.unlocked.push(id);
        log::info!("Power unlocked: {}", id.descriptor().name);
        Some(id.descriptor())
    }
}

/// A delayed hit waiting for its logical time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledHit {
    pub due_ms: f64,
    pub enemy_id: u32,
    pub damage: f32,
}

/// What a power did when it resolved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Viruses in range when the power went off
    pub affected: Vec<u32>,
    /// Viruses killed by the immediate part of the effect
    pub killed: Vec<u32>,
    pub scheduled: Vec<ScheduledHit>,
}

/// Indices of living viruses within `range` of `target`, in list order
fn in_range(enemies: &[Virus], target: Vec2, range: f32) -> Vec<usize> {
    enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_alive() && e.pos.distance(target) <= range)
        .map(|(i, _)| i)
        .collect()
}

fn hit(enemy: &mut Virus, amount: f32, killed: &mut Vec<u32>) {
    if enemy.take_damage(amount) {
        killed.push(enemy.id);
    }
}

/// Apply `power` around `target` at logical time `now_ms`
pub fn resolve(power: &Power, enemies: &mut [Virus], target: Vec2, now_ms: f64) -> Resolution {
    let targets = in_range(enemies, target, power.range);
    let mut out = Resolution {
        affected: targets.iter().map(|&i| enemies[i].id).collect(),
        ..Default::default()
    };

    match power.effect {
        EffectKind::AreaDamage => {
            // Needs at least two targets to collapse
            if targets.len() > 1 {
                let total = power.damage * targets.len() as f32;
                hit(&mut enemies[targets[0]], total, &mut out.killed);
                for &i in &targets[1..] {
                    hit(&mut enemies[i], LETHAL_DAMAGE, &mut out.killed);
                }
            }
        }
        EffectKind::TransformDamage => {
            for &i in &targets {
                hit(&mut enemies[i], power.damage, &mut out.killed);
            }
        }
        EffectKind::InstantKillWeak => {
            for &i in &targets {
                if enemies[i].health_fraction() < WEAK_THRESHOLD {
                    hit(&mut enemies[i], LETHAL_DAMAGE, &mut out.killed);
                }
            }
        }
        EffectKind::SequentialDamage => {
            out.scheduled = targets
                .iter()
                .enumerate()
                .map(|(n, &i)| ScheduledHit {
                    due_ms: now_ms + n as f64 * FOREACH_STAGGER_MS,
                    enemy_id: enemies[i].id,
                    damage: power.damage,
                })
                .collect();
        }
        EffectKind::FindAndMark => {
            // First of the healthiest on ties
            let strongest = targets.iter().copied().reduce(|best, i| {
                if enemies[i].health > enemies[best].health {
                    i
                } else {
                    best
                }
            });
            if let Some(i) = strongest {
                hit(&mut enemies[i], power.damage, &mut out.killed);
            }
        }
        EffectKind::CascadeDamage => {
            let mut sorted = targets.clone();
            sorted.sort_by(|&a, &b| enemies[a].health.total_cmp(&enemies[b].health));
            out.scheduled = sorted
                .iter()
                .enumerate()
                .map(|(n, &i)| ScheduledHit {
                    due_ms: now_ms + n as f64 * SORT_STAGGER_MS,
                    enemy_id: enemies[i].id,
                    damage: power.damage + n as f32 * SORT_DAMAGE_STEP,
                })
                .collect();
        }
    }

    log::debug!(
        "{} resolved: {} in range, {} killed, {} scheduled",
        power.name,
        out.affected.len(),
        out.killed.len(),
        out.scheduled.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defender::enemy::AiState;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn pack(healths: &[f32]) -> Vec<Virus> {
        let mut rng = Pcg32::seed_from_u64(5);
        healths
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                let mut v = Virus::new(i as u32, Vec2::new(100.0 + i as f32 * 10.0, 100.0), &mut rng);
                v.health = h;
                v
            })
            .collect()
    }

    #[test]
    fn test_reduce_collapses_pack() {
        let mut enemies = pack(&[40.0, 40.0, 40.0]);
        let res = resolve(PowerId::Reduce.descriptor(), &mut enemies, Vec2::new(110.0, 100.0), 0.0);

        assert_eq!(enemies[0].health, -110.0);
        assert!(enemies.iter().all(|e| !e.is_alive()));
        assert_eq!(res.killed.len(), 3);
    }

    #[test]
    fn test_reduce_needs_two_targets() {
        let mut enemies = pack(&[40.0]);
        resolve(PowerId::Reduce.descriptor(), &mut enemies, Vec2::new(100.0, 100.0), 0.0);
        assert_eq!(enemies[0].health, 40.0);
    }

    #[test]
    fn test_map_hits_only_in_range() {
        let mut enemies = pack(&[50.0, 50.0]);
        enemies[1].pos = Vec2::new(1000.0, 100.0);
        let res = resolve(PowerId::Map.descriptor(), &mut enemies, Vec2::new(100.0, 100.0), 0.0);
        assert_eq!(res.affected, vec![0]);
        assert_eq!(enemies[0].health, 10.0);
        assert_eq!(enemies[1].health, 50.0);
    }

    #[test]
    fn test_filter_only_executes_weak() {
        let mut enemies = pack(&[10.0, 40.0]);
        resolve(PowerId::Filter.descriptor(), &mut enemies, Vec2::new(105.0, 100.0), 0.0);
        assert!(!enemies[0].is_alive());
        assert!(enemies[1].is_alive());
        assert_eq!(enemies[1].health, 40.0);
    }

    #[test]
    fn test_find_picks_first_strongest() {
        let mut enemies = pack(&[30.0, 50.0, 50.0]);
        resolve(PowerId::Find.descriptor(), &mut enemies, Vec2::new(110.0, 100.0), 0.0);
        assert_eq!(enemies[0].health, 30.0);
        assert_eq!(enemies[1].state, AiState::Dead);
        assert_eq!(enemies[2].health, 50.0);
    }

    #[test]
    fn test_foreach_schedules_staggered_hits() {
        let mut enemies = pack(&[50.0, 50.0, 50.0]);
        let res = resolve(PowerId::ForEach.descriptor(), &mut enemies, Vec2::new(110.0, 100.0), 1000.0);
        let dues: Vec<f64> = res.scheduled.iter().map(|h| h.due_ms).collect();
        assert_eq!(dues, vec![1000.0, 1200.0, 1400.0]);
        // Nothing applied yet
        assert!(enemies.iter().all(|e| e.health == 50.0));
    }

    #[test]
    fn test_sort_orders_by_health_with_rising_damage() {
        let mut enemies = pack(&[45.0, 15.0, 30.0]);
        let res = resolve(PowerId::Sort.descriptor(), &mut enemies, Vec2::new(110.0, 100.0), 0.0);
        let order: Vec<u32> = res.scheduled.iter().map(|h| h.enemy_id).collect();
        assert_eq!(order, vec![1, 2, 0]);
        let damage: Vec<f32> = res.scheduled.iter().map(|h| h.damage).collect();
        assert_eq!(damage, vec![30.0, 40.0, 50.0]);
        assert_eq!(res.scheduled[2].due_ms, 300.0);
    }

    #[test]
    fn test_dead_enemies_are_ignored() {
        let mut enemies = pack(&[50.0, 50.0]);
        enemies[0].take_damage(100.0);
        let res = resolve(PowerId::Map.descriptor(), &mut enemies, Vec2::new(105.0, 100.0), 0.0);
        assert_eq!(res.affected, vec![1]);
    }

    #[test]
    fn test_power_book_cycles_unlocked() {
        let mut book = PowerBook::new();
        assert_eq!(book.switch_power().id, PowerId::Reduce);

        assert!(book.unlock_level(3).is_some());
        assert!(book.unlock_level(3).is_none());
        assert!(book.unlock_level(9).is_none());
        assert_eq!(book.switch_power().id, PowerId::Filter);
        assert_eq!(book.switch_power().id, PowerId::Reduce);
        assert!(!book.select(PowerId::Sort));

        let names: Vec<&str> = book.unlocked_powers().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Reduce", "Filter"]);
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(PowerId::from_name("foreach"), Some(PowerId::ForEach));
        assert_eq!(PowerId::from_name("SORT"), Some(PowerId::Sort));
        assert_eq!(PowerId::from_name("flatMap"), None);
    }
}
