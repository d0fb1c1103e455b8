//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (host timestamps to clamped frame deltas)
//! - Input snapshots
//! - Storage (LocalStorage on web, in-memory elsewhere)

pub mod input;
pub mod storage;
pub mod time;

pub use input::InputState;
pub use storage::{KeyValueStore, MemoryStore};
pub use time::FrameClock;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStore;
