//! Virus spawning and bookkeeping

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::enemy::Virus;
use super::magic::MagicSpell;
use crate::sim::collision::aabb_overlap;
use crate::sim::entities::Collidable;

pub const MAX_ENEMIES: usize = 5;
pub const SPAWN_DELAY_MS: f32 = 8000.0;

pub const SPAWN_POINTS: [Vec2; 4] = [
    Vec2::new(100.0, 400.0),
    Vec2::new(924.0, 400.0),
    Vec2::new(200.0, 300.0),
    Vec2::new(824.0, 300.0),
];

/// Outcome of one manager step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerReport {
    /// Damage each attacking virus landed on the hero, in update order
    pub hits: Vec<f32>,
    /// Ids removed because they died
    pub defeated: Vec<u32>,
    pub spawned: Vec<u32>,
}

pub struct EnemyManager {
    enemies: Vec<Virus>,
    spawn_points: Vec<Vec2>,
    spawn_timer_ms: f32,
    pub spawn_delay_ms: f32,
    pub max_enemies: usize,
    next_id: u32,
    rng: Pcg32,
}

impl EnemyManager {
    pub fn new(seed: u64) -> Self {
        Self {
            enemies: Vec::with_capacity(MAX_ENEMIES),
            spawn_points: SPAWN_POINTS.to_vec(),
            spawn_timer_ms: 0.0,
            spawn_delay_ms: SPAWN_DELAY_MS,
            max_enemies: MAX_ENEMIES,
            next_id: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn with_spawn_points(mut self, points: Vec<Vec2>) -> Self {
        self.spawn_points = points;
        self
    }

    /// Spawn a virus at `pos` unless the cap is reached
    pub fn spawn_enemy(&mut self, pos: Vec2) -> Option<u32> {
        if self.alive_count() >= self.max_enemies {
            log::debug!("Enemy cap reached ({}), spawn skipped", self.max_enemies);
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.enemies.push(Virus::new(id, pos, &mut self.rng));
        log::debug!("Spawned virus {} at ({:.0}, {:.0})", id, pos.x, pos.y);
        Some(id)
    }

    /// Spawn at a uniformly chosen spawn point
    pub fn spawn_random(&mut self) -> Option<u32> {
        if self.spawn_points.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..self.spawn_points.len());
        self.spawn_enemy(self.spawn_points[index])
    }

    pub fn update(
        &mut self,
        dt: f32,
        hero: Vec2,
        ground_y: f32,
        world_width: f32,
    ) -> ManagerReport {
        let mut report = ManagerReport::default();

        self.spawn_timer_ms += dt * 1000.0;
        if self.spawn_timer_ms >= self.spawn_delay_ms {
            self.spawn_timer_ms = 0.0;
            if let Some(id) = self.spawn_random() {
                report.spawned.push(id);
            }
        }

        for enemy in &mut self.enemies {
            if let Some(damage) = enemy.update(dt, hero, world_width) {
                report.hits.push(damage);
            }
            enemy.check_ground(ground_y);
        }

        report.defeated = self.remove_dead();
        report
    }

    /// Drop dead viruses, returning their ids in list order
    pub fn remove_dead(&mut self) -> Vec<u32> {
        let defeated: Vec<u32> = self
            .enemies
            .iter()
            .filter(|e| !e.is_alive())
            .map(|e| e.id)
            .collect();
        self.enemies.retain(|e| e.is_alive());
        defeated
    }

    /// Each active spell hits at most one living virus, then is destroyed.
    /// Returns the number of spells that connected.
    pub fn check_spell_collisions(&mut self, spells: &mut [MagicSpell]) -> usize {
        let mut connected = 0;
        for spell in spells.iter_mut().filter(|s| s.active) {
            let bounds = spell.bounds();
            if let Some(enemy) = self
                .enemies
                .iter_mut()
                .find(|e| e.is_alive() && aabb_overlap(&bounds, &e.bounds()))
            {
                enemy.take_damage(spell.damage);
                spell.destroy();
                connected += 1;
            }
        }
        connected
    }

    pub fn enemies(&self) -> &[Virus] {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut [Virus] {
        &mut self.enemies
    }

    pub fn get(&self, id: u32) -> Option<&Virus> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Virus> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn alive(&self) -> impl Iterator<Item = &Virus> {
        self.enemies.iter().filter(|e| e.is_alive())
    }

    pub fn alive_count(&self) -> usize {
        self.alive().count()
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn clear(&mut self) {
        self.enemies.clear();
        self.spawn_timer_ms = 0.0;
    }
}
