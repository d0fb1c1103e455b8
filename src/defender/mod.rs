//! Arena defender line
//!
//! A side-view arena where the hero fights viruses with spells and unlockable
//! powers. Like the climber simulation it is host-agnostic: the host supplies
//! dt and a [`LevelInput`] per frame and drains [`LevelEvent`]s afterwards.

pub mod enemy;
pub mod hero;
pub mod level;
pub mod magic;
pub mod manager;
pub mod powers;

pub use enemy::{AiState, Virus};
pub use hero::{CastOutcome, Hero, Pose};
pub use level::{GameOverReason, Level, LevelEvent, LevelInput, LevelPhase};
pub use magic::{CastMode, MagicSpell, MagicSystem};
pub use manager::{EnemyManager, ManagerReport};
pub use powers::{EffectKind, POWERS, Power, PowerBook, PowerId, Resolution, ScheduledHit};
