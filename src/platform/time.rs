//! Frame timing
//!
//! Hosts hand us millisecond timestamps (`requestAnimationFrame` on the web,
//! a monotonic clock natively); the simulations want clamped seconds plus a
//! logical millisecond clock for cooldowns.

use crate::clamp_dt;

/// Converts host timestamps into simulation deltas
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
    /// Logical time advanced only by clamped deltas (ms)
    logical_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the host timestamp for this frame, returning the clamped dt in seconds
    ///
    /// The first frame, a timestamp that goes backwards, or a non-finite one
    /// yields 0.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        if !now_ms.is_finite() {
            log::warn!("Non-finite frame timestamp ignored");
            return 0.0;
        }
        let dt = match self.last_ms {
            Some(last) => clamp_dt(((now_ms - last) / 1000.0) as f32),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        self.logical_ms += f64::from(dt) * 1000.0;
        dt
    }

    /// Logical milliseconds since the clock started
    pub fn now_ms(&self) -> f64 {
        self.logical_ms
    }

    /// Forget the last timestamp (e.g. after the tab was hidden)
    pub fn resync(&mut self) {
        self.last_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MAX_DT;

    #[test]
    fn test_first_frame_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(1000.0), 0.0);
        let dt = clock.advance(1016.0);
        assert!((dt - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_long_gap_is_clamped() {
        let mut clock = FrameClock::new();
        clock.advance(0.0);
        assert_eq!(clock.advance(5000.0), MAX_DT);
        assert!((clock.now_ms() - 33.0).abs() < 1e-3);
    }

    #[test]
    fn test_backwards_and_nan() {
        let mut clock = FrameClock::new();
        clock.advance(500.0);
        assert_eq!(clock.advance(400.0), 0.0);
        assert_eq!(clock.advance(f64::NAN), 0.0);

        clock.resync();
        assert_eq!(clock.advance(10_000.0), 0.0);
    }
}
