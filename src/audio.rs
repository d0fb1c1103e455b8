//! Sound cues
//!
//! Procedurally generated sound effects, no external files needed. Game and
//! level events map to a [`SoundEffect`]; each effect is a short list of
//! oscillator voices that a host [`AudioSink`] plays. On wasm32 the sink is
//! backed by the Web Audio API, elsewhere it stays silent.

use crate::defender::LevelEvent;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Auto-bounce off a platform
    Jump,
    /// Score or health lost to a hit
    Hurt,
    /// Explosive platform went off
    Explosion,
    /// Shooter fired
    Shot,
    /// Difficulty tier went up
    TierUp,
    /// Basic spell cast
    Spell,
    /// Power cast
    Power,
    /// Virus destroyed
    EnemyDefeated,
    /// New power available
    Unlock,
    /// Level won
    Victory,
    GameOver,
    /// Run ended on a new best
    HighScore,
}

/// Oscillator shape, mirrors the Web Audio types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator: a frequency sweep under an exponential gain decay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub wave: Waveform,
    pub start_hz: f32,
    pub end_hz: f32,
    /// Seconds after the trigger
    pub delay: f32,
    pub duration: f32,
    /// Peak gain before the master volume is applied
    pub gain: f32,
}

const fn voice(
    wave: Waveform,
    start_hz: f32,
    end_hz: f32,
    delay: f32,
    duration: f32,
    gain: f32,
) -> Voice {
    Voice {
        wave,
        start_hz,
        end_hz,
        delay,
        duration,
        gain,
    }
}

const JUMP: &[Voice] = &[voice(Waveform::Square, 220.0, 440.0, 0.0, 0.1, 0.15)];
const HURT: &[Voice] = &[
    voice(Waveform::Sawtooth, 300.0, 80.0, 0.0, 0.2, 0.35),
    voice(Waveform::Sine, 90.0, 60.0, 0.0, 0.15, 0.3),
];
const EXPLOSION: &[Voice] = &[
    voice(Waveform::Sawtooth, 120.0, 30.0, 0.0, 0.45, 0.5),
    voice(Waveform::Square, 60.0, 40.0, 0.0, 0.3, 0.3),
];
const SHOT: &[Voice] = &[voice(Waveform::Square, 900.0, 300.0, 0.0, 0.08, 0.12)];
const TIER_UP: &[Voice] = &[
    voice(Waveform::Triangle, 523.0, 523.0, 0.0, 0.1, 0.25),
    voice(Waveform::Triangle, 659.0, 659.0, 0.08, 0.1, 0.25),
    voice(Waveform::Triangle, 784.0, 784.0, 0.16, 0.15, 0.25),
];
const SPELL: &[Voice] = &[voice(Waveform::Sine, 600.0, 1200.0, 0.0, 0.12, 0.2)];
const POWER: &[Voice] = &[
    voice(Waveform::Sawtooth, 200.0, 800.0, 0.0, 0.3, 0.3),
    voice(Waveform::Sine, 400.0, 1600.0, 0.05, 0.25, 0.2),
];
const ENEMY_DEFEATED: &[Voice] = &[
    voice(Waveform::Square, 800.0, 100.0, 0.0, 0.2, 0.25),
    voice(Waveform::Sine, 1200.0, 600.0, 0.05, 0.1, 0.15),
];
const UNLOCK: &[Voice] = &[
    voice(Waveform::Triangle, 440.0, 440.0, 0.0, 0.1, 0.25),
    voice(Waveform::Triangle, 880.0, 880.0, 0.1, 0.2, 0.25),
];
const VICTORY: &[Voice] = &[
    voice(Waveform::Triangle, 523.0, 523.0, 0.0, 0.15, 0.3),
    voice(Waveform::Triangle, 659.0, 659.0, 0.15, 0.15, 0.3),
    voice(Waveform::Triangle, 784.0, 784.0, 0.3, 0.15, 0.3),
    voice(Waveform::Triangle, 1047.0, 1047.0, 0.45, 0.4, 0.3),
];
const GAME_OVER: &[Voice] = &[
    voice(Waveform::Sawtooth, 400.0, 100.0, 0.0, 0.6, 0.35),
    voice(Waveform::Sine, 200.0, 50.0, 0.2, 0.6, 0.3),
];
const HIGH_SCORE: &[Voice] = &[
    voice(Waveform::Sine, 784.0, 784.0, 0.0, 0.12, 0.3),
    voice(Waveform::Sine, 988.0, 988.0, 0.12, 0.12, 0.3),
    voice(Waveform::Sine, 1175.0, 1175.0, 0.24, 0.3, 0.3),
];

impl SoundEffect {
    pub fn voices(self) -> &'static [Voice] {
        match self {
            SoundEffect::Jump => JUMP,
            SoundEffect::Hurt => HURT,
            SoundEffect::Explosion => EXPLOSION,
            SoundEffect::Shot => SHOT,
            SoundEffect::TierUp => TIER_UP,
            SoundEffect::Spell => SPELL,
            SoundEffect::Power => POWER,
            SoundEffect::EnemyDefeated => ENEMY_DEFEATED,
            SoundEffect::Unlock => UNLOCK,
            SoundEffect::Victory => VICTORY,
            SoundEffect::GameOver => GAME_OVER,
            SoundEffect::HighScore => HIGH_SCORE,
        }
    }

    /// Total length in seconds
    pub fn duration(self) -> f32 {
        self.voices()
            .iter()
            .map(|v| v.delay + v.duration)
            .fold(0.0, f32::max)
    }

    /// Cue for a climber event, if it has one
    pub fn for_game_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Jumped => Some(SoundEffect::Jump),
            GameEvent::PlayerDamaged(_) => Some(SoundEffect::Hurt),
            GameEvent::PlatformExploded { .. } => Some(SoundEffect::Explosion),
            GameEvent::EnemyShot { .. } => Some(SoundEffect::Shot),
            GameEvent::TierChanged(_) => Some(SoundEffect::TierUp),
            GameEvent::GameOver { score, best } if *score > 0.0 && score >= best => {
                Some(SoundEffect::HighScore)
            }
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            GameEvent::ScoreChanged(_) => None,
        }
    }

    /// Cue for an arena event, if it has one
    pub fn for_level_event(event: &LevelEvent) -> Option<Self> {
        match event {
            LevelEvent::PlayerDamaged(_) => Some(SoundEffect::Hurt),
            LevelEvent::SpellCast => Some(SoundEffect::Spell),
            LevelEvent::PowerCast(_) => Some(SoundEffect::Power),
            LevelEvent::EnemyDefeated { .. } => Some(SoundEffect::EnemyDefeated),
            LevelEvent::PowerUnlocked(_) => Some(SoundEffect::Unlock),
            LevelEvent::LevelComplete { .. } => Some(SoundEffect::Victory),
            LevelEvent::GameOver(_) => Some(SoundEffect::GameOver),
            LevelEvent::HealthChanged(_) | LevelEvent::ScoreChanged(_) => None,
        }
    }
}

/// Something that can play sound effects
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
    /// Effective gain, already combining master, sfx and mute
    fn set_volume(&mut self, volume: f32);
}

/// Silent sink; remembers what it was asked to play
#[derive(Debug, Default)]
pub struct NullAudio {
    pub played: Vec<SoundEffect>,
    pub volume: f32,
}

impl AudioSink for NullAudio {
    fn play(&mut self, effect: SoundEffect) {
        self.played.push(effect);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}

/// Play the cues for a batch of climber events
pub fn play_game_events(sink: &mut dyn AudioSink, events: &[GameEvent]) {
    for effect in events.iter().filter_map(SoundEffect::for_game_event) {
        sink.play(effect);
    }
}

/// Play the cues for a batch of arena events
pub fn play_level_events(sink: &mut dyn AudioSink, events: &[LevelEvent]) {
    for effect in events.iter().filter_map(SoundEffect::for_level_event) {
        sink.play(effect);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect, Voice, Waveform};

    /// Web Audio backed sink
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl WebAudio {
        pub fn new(volume: f32) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: volume.clamp(0.0, 1.0),
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_voice(ctx: &AudioContext, voice: &Voice, vol: f32) {
            let osc_type = match voice.wave {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Triangle => OscillatorType::Triangle,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
            };
            let Some((osc, gain)) = Self::create_osc(ctx, voice.start_hz, osc_type) else {
                return;
            };
            let t = ctx.current_time() + voice.delay as f64;
            let end = t + voice.duration as f64;

            gain.gain().set_value_at_time(vol * voice.gain, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok();
            if voice.end_hz != voice.start_hz {
                osc.frequency().set_value_at_time(voice.start_hz, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(voice.end_hz, end)
                    .ok();
            }

            osc.start_with_when(t).ok();
            osc.stop_with_when(end + 0.02).ok();
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, effect: SoundEffect) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Browsers start the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            for voice in effect.voices() {
                Self::play_voice(ctx, voice, self.volume);
            }
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defender::{GameOverReason, PowerId};
    use glam::Vec2;

    #[test]
    fn test_game_events_map_to_cues() {
        let mut sink = NullAudio::default();
        let events = [
            GameEvent::Jumped,
            GameEvent::ScoreChanged(140.0),
            GameEvent::PlatformExploded { pos: Vec2::ZERO },
            GameEvent::GameOver {
                score: 50.0,
                best: 120.0,
            },
        ];
        play_game_events(&mut sink, &events);
        assert_eq!(
            sink.played,
            vec![SoundEffect::Jump, SoundEffect::Explosion, SoundEffect::GameOver]
        );
    }

    #[test]
    fn test_new_best_gets_fanfare() {
        let event = GameEvent::GameOver {
            score: 130.0,
            best: 130.0,
        };
        assert_eq!(SoundEffect::for_game_event(&event), Some(SoundEffect::HighScore));
        let zero = GameEvent::GameOver { score: 0.0, best: 0.0 };
        assert_eq!(SoundEffect::for_game_event(&zero), Some(SoundEffect::GameOver));
    }

    #[test]
    fn test_level_events_map_to_cues() {
        let mut sink = NullAudio::default();
        let events = [
            LevelEvent::PowerCast(PowerId::Reduce),
            LevelEvent::HealthChanged(80.0),
            LevelEvent::EnemyDefeated { id: 3 },
            LevelEvent::GameOver(GameOverReason::TimeUp),
        ];
        play_level_events(&mut sink, &events);
        assert_eq!(
            sink.played,
            vec![SoundEffect::Power, SoundEffect::EnemyDefeated, SoundEffect::GameOver]
        );
    }

    #[test]
    fn test_voices_are_playable() {
        let all = [
            SoundEffect::Jump,
            SoundEffect::Hurt,
            SoundEffect::Explosion,
            SoundEffect::Shot,
            SoundEffect::TierUp,
            SoundEffect::Spell,
            SoundEffect::Power,
            SoundEffect::EnemyDefeated,
            SoundEffect::Unlock,
            SoundEffect::Victory,
            SoundEffect::GameOver,
            SoundEffect::HighScore,
        ];
        for effect in all {
            assert!(!effect.voices().is_empty());
            // Exponential ramps need positive targets
            assert!(effect.voices().iter().all(|v| v.start_hz > 0.0 && v.end_hz > 0.0));
            assert!(effect.duration() < 1.0);
        }
        assert!((SoundEffect::Victory.duration() - 0.85).abs() < 1e-5);
    }
}
