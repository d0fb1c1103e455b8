//! Deterministic climber simulation
//!
//! All climber gameplay lives here. This module must stay deterministic:
//! - Seeded RNG only
//! - Stable iteration order (active lists keep spawn order)
//! - No rendering or platform dependencies beyond the injected store

pub mod collision;
pub mod difficulty;
pub mod entities;
pub mod pool;
pub mod state;
pub mod tick;

pub use collision::{Circle, Rect, aabb_overlap, circle_overlap, circle_rect_overlap, is_landing};
pub use difficulty::{DifficultyParams, next_tier_score, tier_for_score};
pub use entities::{
    Bullet, Collidable, Enemy, EnemyKind, EntityRef, MoveIntent, Particle, Platform, PlatformKind,
    Player,
};
pub use pool::{Pool, Recyclable, SlotId};
pub use state::{EntityCounts, GameEvent, GamePhase, GameState};
pub use tick::{TickInput, game_over, generate_platforms, reset, tick};
