//! Virus enemy AI
//!
//! Patrol, chase and attack driven by distance to the hero. Dead is terminal;
//! the manager removes dead viruses on its next update.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chance;
use crate::sim::collision::Rect;
use crate::sim::entities::Collidable;

pub const VIRUS_HEALTH: f32 = 50.0;
pub const VIRUS_SPEED: f32 = 60.0;
pub const VIRUS_DAMAGE: f32 = 20.0;
pub const ATTACK_DELAY_MS: f32 = 2000.0;
pub const PATROL_DISTANCE: f32 = 150.0;
pub const VIRUS_GRAVITY: f32 = 800.0;
pub const ALERT_RANGE: f32 = 120.0;
pub const ATTACK_RANGE: f32 = 50.0;
/// Hitbox edge length (centred on the position)
pub const VIRUS_SIZE: f32 = 32.0;

/// Stop chasing once the hero is this close horizontally
const CHASE_DEADZONE: f32 = 10.0;
/// How close to the patrol end counts as arrived
const PATROL_TOLERANCE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    Patrol,
    Chase,
    Attack,
    Dead,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Virus {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub damage: f32,
    pub state: AiState,
    /// Milliseconds until the next attack may land
    pub attack_cooldown_ms: f32,
    pub attack_delay_ms: f32,
    /// +1 right, -1 left
    pub direction: f32,
    pub patrol_distance: f32,
    /// Patrol centre; `None` patrols between the world edges
    pub anchor_x: Option<f32>,
    pub grounded: bool,
    pub alert_range: f32,
    pub attack_range: f32,
}

impl Virus {
    pub fn new(id: u32, pos: Vec2, rng: &mut impl Rng) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            health: VIRUS_HEALTH,
            max_health: VIRUS_HEALTH,
            speed: VIRUS_SPEED,
            damage: VIRUS_DAMAGE,
            state: AiState::Patrol,
            attack_cooldown_ms: 0.0,
            attack_delay_ms: ATTACK_DELAY_MS,
            direction: if chance(rng, 0.5) { 1.0 } else { -1.0 },
            patrol_distance: PATROL_DISTANCE,
            anchor_x: Some(pos.x),
            grounded: false,
            alert_range: ALERT_RANGE,
            attack_range: ATTACK_RANGE,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state != AiState::Dead
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    /// Step the AI. Returns the damage dealt to the hero this frame, if any.
    pub fn update(&mut self, dt: f32, hero: Vec2, world_width: f32) -> Option<f32> {
        if !self.is_alive() {
            return None;
        }

        self.attack_cooldown_ms = (self.attack_cooldown_ms - dt * 1000.0).max(0.0);
        let distance = self.pos.distance(hero);
        let mut dealt = None;

        match self.state {
            AiState::Patrol => {
                self.patrol(world_width);
                if distance < self.alert_range {
                    self.state = AiState::Chase;
                }
            }
            AiState::Chase => {
                self.chase(hero);
                if distance > self.alert_range * 1.5 {
                    self.state = AiState::Patrol;
                } else if distance < self.attack_range {
                    self.state = AiState::Attack;
                }
            }
            AiState::Attack => {
                dealt = self.attack(hero);
                if distance > self.attack_range * 1.2 {
                    self.state = AiState::Chase;
                }
            }
            AiState::Dead => {}
        }

        self.integrate(dt, world_width);
        dealt
    }

    fn patrol(&mut self, world_width: f32) {
        match self.anchor_x {
            Some(anchor) => {
                let target = anchor + self.direction * self.patrol_distance;
                // Arrived, or already past the end (e.g. after a chase)
                if (self.pos.x - target) * self.direction >= -PATROL_TOLERANCE {
                    self.direction = -self.direction;
                }
            }
            None => {
                let half = VIRUS_SIZE / 2.0;
                if (self.direction < 0.0 && self.pos.x <= half)
                    || (self.direction > 0.0 && self.pos.x >= world_width - half)
                {
                    self.direction = -self.direction;
                }
            }
        }
        self.vel.x = self.direction * self.speed * 0.5;
    }

    fn chase(&mut self, hero: Vec2) {
        let dx = hero.x - self.pos.x;
        self.vel.x = if dx.abs() > CHASE_DEADZONE {
            dx.signum() * self.speed
        } else {
            0.0
        };
    }

    fn attack(&mut self, hero: Vec2) -> Option<f32> {
        self.vel.x = 0.0;
        if self.attack_cooldown_ms > 0.0 {
            return None;
        }
        self.attack_cooldown_ms = self.attack_delay_ms;
        // Re-check range at the moment the blow lands
        (self.pos.distance(hero) < self.attack_range).then_some(self.damage)
    }

    fn integrate(&mut self, dt: f32, world_width: f32) {
        if !self.grounded {
            self.vel.y += VIRUS_GRAVITY * dt;
        }
        self.pos += self.vel * dt;

        let half = VIRUS_SIZE / 2.0;
        if world_width > VIRUS_SIZE {
            self.pos.x = self.pos.x.clamp(half, world_width - half);
        }
    }

    /// Apply damage. Returns true if this blow killed the virus.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.state = AiState::Dead;
            self.vel = Vec2::ZERO;
            return true;
        }
        if self.state == AiState::Patrol {
            self.state = AiState::Chase;
        }
        false
    }

    /// Land on the ground line. Returns true when grounded.
    pub fn check_ground(&mut self, ground_y: f32) -> bool {
        let rest_y = ground_y - VIRUS_SIZE / 2.0;
        if self.pos.y >= rest_y && self.vel.y >= 0.0 {
            self.pos.y = rest_y;
            self.vel.y = 0.0;
            self.grounded = true;
            return true;
        }
        self.grounded = false;
        false
    }
}

impl Collidable for Virus {
    fn bounds(&self) -> Rect {
        Rect::centered(self.pos, VIRUS_SIZE, VIRUS_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn virus_at(x: f32, y: f32) -> Virus {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut v = Virus::new(1, Vec2::new(x, y), &mut rng);
        v.grounded = true;
        v
    }

    #[test]
    fn test_patrol_to_chase_to_attack() {
        let mut v = virus_at(500.0, 504.0);
        let far = Vec2::new(900.0, 504.0);
        v.update(0.016, far, 1024.0);
        assert_eq!(v.state, AiState::Patrol);

        v.update(0.016, Vec2::new(v.pos.x + 100.0, 504.0), 1024.0);
        assert_eq!(v.state, AiState::Chase);

        v.update(0.016, Vec2::new(v.pos.x + 40.0, 504.0), 1024.0);
        assert_eq!(v.state, AiState::Attack);
    }

    #[test]
    fn test_hysteresis_bands() {
        let mut v = virus_at(500.0, 504.0);
        v.state = AiState::Chase;
        // Beyond alert range but inside 1.5x: keep chasing
        v.update(0.016, Vec2::new(v.pos.x + 150.0, 504.0), 1024.0);
        assert_eq!(v.state, AiState::Chase);
        v.update(0.016, Vec2::new(v.pos.x + 200.0, 504.0), 1024.0);
        assert_eq!(v.state, AiState::Patrol);

        v.state = AiState::Attack;
        v.attack_cooldown_ms = 1000.0;
        v.update(0.016, Vec2::new(v.pos.x + 55.0, 504.0), 1024.0);
        assert_eq!(v.state, AiState::Attack);
        v.update(0.016, Vec2::new(v.pos.x + 61.0, 504.0), 1024.0);
        assert_eq!(v.state, AiState::Chase);
    }

    #[test]
    fn test_attack_cooldown_and_range_recheck() {
        let mut v = virus_at(500.0, 504.0);
        v.state = AiState::Attack;
        let hero = Vec2::new(520.0, 504.0);

        assert_eq!(v.update(0.016, hero, 1024.0), Some(VIRUS_DAMAGE));
        assert_eq!(v.vel.x, 0.0);
        // Cooling down: nothing for 1.6 s
        for _ in 0..100 {
            assert_eq!(v.update(0.016, hero, 1024.0), None);
        }
        // Exactly one more blow within the next 0.64 s
        let hits = (0..40)
            .filter_map(|_| v.update(0.016, hero, 1024.0))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_attack_whiffs_out_of_range() {
        let mut v = virus_at(500.0, 504.0);
        v.state = AiState::Attack;
        // In the hysteresis band: still attacking, but too far to connect
        let hero = Vec2::new(555.0, 504.0);
        assert_eq!(v.update(0.016, hero, 1024.0), None);
        assert_eq!(v.attack_cooldown_ms, ATTACK_DELAY_MS);
    }

    #[test]
    fn test_damage_alerts_only_from_patrol() {
        let mut v = virus_at(500.0, 504.0);
        assert!(!v.take_damage(10.0));
        assert_eq!(v.state, AiState::Chase);

        v.state = AiState::Attack;
        v.take_damage(10.0);
        assert_eq!(v.state, AiState::Attack);

        assert!(v.take_damage(100.0));
        assert_eq!(v.state, AiState::Dead);
        // Dead is terminal
        assert!(!v.take_damage(10.0));
        assert_eq!(v.update(0.016, v.pos, 1024.0), None);
        assert_eq!(v.state, AiState::Dead);
    }

    #[test]
    fn test_patrol_reverses_at_range() {
        let mut v = virus_at(500.0, 504.0);
        v.direction = 1.0;
        let far = Vec2::new(5000.0, -5000.0);
        for _ in 0..2000 {
            v.update(0.016, far, 1024.0);
            assert!(v.pos.x >= 500.0 - PATROL_DISTANCE - 1.0);
            assert!(v.pos.x <= 500.0 + PATROL_DISTANCE + 1.0);
        }
    }

    #[test]
    fn test_gravity_until_grounded() {
        let mut v = virus_at(100.0, 400.0);
        v.grounded = false;
        let far = Vec2::new(900.0, 0.0);
        for _ in 0..200 {
            v.update(0.016, far, 1024.0);
            v.check_ground(520.0);
        }
        assert!(v.grounded);
        assert_eq!(v.pos.y, 504.0);
        assert_eq!(v.vel.y, 0.0);
    }
}
