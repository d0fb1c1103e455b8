//! Game settings and preferences
//!
//! Persisted as JSON through the key-value store, separately from scores.

use serde::{Deserialize, Serialize};

use crate::consts::{FALLBACK_HEIGHT, WORLD_WIDTH};
use crate::platform::KeyValueStore;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 16,
            QualityPreset::Medium => 40,
            QualityPreset::High => 64,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Viewport size in world units
    pub width: f32,
    pub height: f32,
    /// Fixed RNG seed; `None` seeds from the clock
    pub seed: Option<u64>,

    pub quality: QualityPreset,
    /// Particle effects (explosions, damage sparks)
    pub particles: bool,

    // === HUD ===
    pub show_debug: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (no blinking, no particles)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: FALLBACK_HEIGHT,
            seed: None,
            quality: QualityPreset::Medium,
            particles: true,
            show_debug: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    pub const STORAGE_KEY: &'static str = "climb_defender_settings";

    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle cap (respects the particle toggle and reduced motion)
    pub fn max_particles(&self) -> usize {
        if !self.particles || self.reduced_motion {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Gain applied to sound effects, 0 when muted
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        log::info!("Audio {}", if self.muted { "muted" } else { "unmuted" });
        self.muted
    }

    /// Replace out-of-range values with defaults
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.width.is_finite() && self.width > 0.0) {
            self.width = defaults.width;
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            self.height = defaults.height;
        }
        self.master_volume = finite_unit(self.master_volume, defaults.master_volume);
        self.sfx_volume = finite_unit(self.sfx_volume, defaults.sfx_volume);
        self
    }

    /// Load settings; missing or corrupt data yields defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(json) = store.get(Self::STORAGE_KEY) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match serde_json::from_str::<Settings>(&json) {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            Err(e) => {
                log::warn!("Discarding unreadable settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> bool {
        match serde_json::to_string(self) {
            Ok(json) => {
                let saved = store.set(Self::STORAGE_KEY, &json);
                if saved {
                    log::info!("Settings saved");
                }
                saved
            }
            Err(e) => {
                log::warn!("Failed to serialize settings: {}", e);
                false
            }
        }
    }
}

fn finite_unit(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}
