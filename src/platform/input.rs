//! Keyboard and pointer state
//!
//! The host forwards raw DOM events here; each frame it takes a snapshot for
//! whichever game line is running. Held keys persist across frames, presses
//! such as pause or a click are delivered to exactly one snapshot.

use std::collections::HashSet;

use glam::Vec2;

use crate::defender::LevelInput;
use crate::sim::TickInput;

const LEFT_KEYS: [&str; 2] = ["arrowleft", "a"];
const RIGHT_KEYS: [&str; 2] = ["arrowright", "d"];
const UP_KEYS: [&str; 2] = ["arrowup", "w"];
const DOWN_KEYS: [&str; 2] = ["arrowdown", "s"];
const JUMP_KEYS: [&str; 1] = [" "];
const PAUSE_KEYS: [&str; 2] = ["escape", "p"];
const TOGGLE_MODE_KEY: &str = "q";
const CYCLE_POWER_KEY: &str = "e";

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<String>,
    mouse: Vec2,
    mouse_down: bool,
    clicked: bool,
    pause: bool,
    toggle_mode: bool,
    cycle_power: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press (DOM `KeyboardEvent.key`). Returns true if the key is
    /// bound, so the host can suppress the browser default.
    pub fn key_down(&mut self, key: &str) -> bool {
        let key = key.to_lowercase();
        let bound = is_bound(&key);
        // Auto-repeat fires keydown again; only the first press counts
        if self.held.insert(key.clone()) {
            if PAUSE_KEYS.contains(&key.as_str()) {
                self.pause = true;
            } else if key == TOGGLE_MODE_KEY {
                self.toggle_mode = true;
            } else if key == CYCLE_POWER_KEY {
                self.cycle_power = true;
            }
        }
        bound
    }

    pub fn key_up(&mut self, key: &str) {
        self.held.remove(&key.to_lowercase());
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains(&key.to_lowercase())
    }

    fn any_held(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.held.contains(*k))
    }

    /// Pointer position in world coordinates
    pub fn mouse_move(&mut self, pos: Vec2) {
        if pos.is_finite() {
            self.mouse = pos;
        }
    }

    pub fn mouse_button(&mut self, down: bool) {
        if down && !self.mouse_down {
            self.clicked = true;
        }
        self.mouse_down = down;
    }

    pub fn mouse(&self) -> Vec2 {
        self.mouse
    }

    /// Forget everything held; used when the window loses focus
    pub fn release_all(&mut self) {
        self.held.clear();
        self.mouse_down = false;
    }

    /// Ask for a pause toggle on the next snapshot
    pub fn request_pause(&mut self) {
        self.pause = true;
    }

    /// Consume a pending pause request
    pub fn take_pause(&mut self) -> bool {
        std::mem::take(&mut self.pause)
    }

    /// Snapshot for the climber
    pub fn tick_input(&mut self) -> TickInput {
        TickInput {
            left: self.any_held(&LEFT_KEYS),
            right: self.any_held(&RIGHT_KEYS),
            pause: self.take_pause(),
        }
    }

    /// Snapshot for the arena level. Pause requests are left for
    /// [`InputState::take_pause`].
    pub fn level_input(&mut self) -> LevelInput {
        LevelInput {
            up: self.any_held(&UP_KEYS),
            left: self.any_held(&LEFT_KEYS),
            down: self.any_held(&DOWN_KEYS),
            right: self.any_held(&RIGHT_KEYS),
            jump: self.any_held(&JUMP_KEYS),
            cast_pressed: std::mem::take(&mut self.clicked),
            mouse: self.mouse,
            toggle_mode: std::mem::take(&mut self.toggle_mode),
            cycle_power: std::mem::take(&mut self.cycle_power),
        }
    }
}

fn is_bound(key: &str) -> bool {
    [
        &LEFT_KEYS[..],
        &RIGHT_KEYS[..],
        &UP_KEYS[..],
        &DOWN_KEYS[..],
        &JUMP_KEYS[..],
        &PAUSE_KEYS[..],
        &[TOGGLE_MODE_KEY, CYCLE_POWER_KEY][..],
    ]
    .iter()
    .any(|keys| keys.contains(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_keys_map_to_climber_intent() {
        let mut input = InputState::new();
        assert!(input.key_down("ArrowLeft"));
        let snap = input.tick_input();
        assert!(snap.left && !snap.right && !snap.pause);

        input.key_up("ArrowLeft");
        input.key_down("D");
        let snap = input.tick_input();
        assert!(!snap.left && snap.right);
    }

    #[test]
    fn test_pause_is_one_shot() {
        let mut input = InputState::new();
        input.key_down("Escape");
        // Auto-repeat
        input.key_down("Escape");
        assert!(input.tick_input().pause);
        assert!(!input.tick_input().pause);

        input.key_up("Escape");
        input.key_down("p");
        assert!(input.take_pause());
        assert!(!input.take_pause());
    }

    #[test]
    fn test_level_snapshot() {
        let mut input = InputState::new();
        input.key_down("w");
        input.key_down(" ");
        input.key_down("q");
        input.mouse_move(Vec2::new(300.0, 200.0));
        input.mouse_button(true);

        let snap = input.level_input();
        assert!(snap.up && snap.jump && snap.toggle_mode && snap.cast_pressed);
        assert_eq!(snap.mouse, Vec2::new(300.0, 200.0));

        // Holding the button does not cast again
        let snap = input.level_input();
        assert!(!snap.cast_pressed && !snap.toggle_mode);
        assert!(snap.up);
    }

    #[test]
    fn test_unbound_keys_and_bad_pointer() {
        let mut input = InputState::new();
        assert!(!input.key_down("F5"));
        input.mouse_move(Vec2::new(f32::NAN, 3.0));
        assert_eq!(input.mouse(), Vec2::ZERO);
    }

    #[test]
    fn test_release_all_on_blur() {
        let mut input = InputState::new();
        input.key_down("a");
        input.mouse_button(true);
        input.release_all();
        assert!(!input.is_held("a"));
        assert!(!input.tick_input().left);
    }
}
