//! Controller-side input normalizer
//!
//! Accepts orientation samples at whatever rate the device produces them,
//! applies the calibration offset, and emits at most one control sample per
//! [`EMIT_INTERVAL`]. Emission is plain decimation: the newest raw sample at
//! emission time wins, older ones are dropped.

use std::time::Duration;

use tokio::time::Instant;

use super::{ControlSignal, GyroSample};

/// Horizontal sign convention
pub const DIR_X: f64 = 1.0;
/// Vertical sign convention (tilting towards the user moves up)
pub const DIR_Y: f64 = -1.0;
/// Minimum spacing between two emissions
pub const EMIT_INTERVAL: Duration = Duration::from_millis(50);

/// Calibration offset in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub beta0: f64,
    pub gamma0: f64,
}

impl Default for Offset {
    fn default() -> Self {
        // Comfortable resting angle for a phone held in landscape
        Self {
            beta0: 0.0,
            gamma0: -24.0,
        }
    }
}

/// Per-controller normalizer state
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    offset: Offset,
    last_beta: f64,
    last_gamma: f64,
    last_alpha: Option<f64>,
    last_emit: Option<Instant>,
    last_signal: ControlSignal,
    emit_interval: Duration,
}

impl InputNormalizer {
    pub fn new() -> Self {
        Self::with_interval(EMIT_INTERVAL)
    }

    pub fn with_interval(emit_interval: Duration) -> Self {
        Self {
            offset: Offset::default(),
            last_beta: 0.0,
            last_gamma: 0.0,
            last_alpha: None,
            last_emit: None,
            last_signal: ControlSignal::NEUTRAL,
            emit_interval,
        }
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Last signal handed out by [`sample`](Self::sample)
    pub fn last_signal(&self) -> ControlSignal {
        self.last_signal
    }

    /// Signal for the current raw state, ignoring the emission throttle
    pub fn signal(&self) -> ControlSignal {
        ControlSignal {
            x: (self.last_gamma - self.offset.gamma0) * DIR_X,
            y: (self.last_beta - self.offset.beta0) * DIR_Y,
        }
    }

    /// Record a raw sample and return a wire sample if one is due.
    ///
    /// Unavailable axes leave the previous raw value in place.
    pub fn sample(&mut self, raw: GyroSample, now: Instant) -> Option<GyroSample> {
        if let Some(beta) = raw.beta.filter(|v| v.is_finite()) {
            self.last_beta = beta;
        }
        if let Some(gamma) = raw.gamma.filter(|v| v.is_finite()) {
            self.last_gamma = gamma;
        }
        self.last_alpha = raw.alpha;

        if let Some(last) = self.last_emit {
            if now.saturating_duration_since(last) < self.emit_interval {
                return None;
            }
        }
        self.last_emit = Some(now);

        let signal = self.signal();
        self.last_signal = signal;

        Some(GyroSample {
            alpha: self.last_alpha,
            beta: Some(signal.y),
            gamma: Some(signal.x),
        })
    }

    /// Use the latest raw sample as the new neutral position
    pub fn calibrate(&mut self) -> Offset {
        self.offset = Offset {
            beta0: self.last_beta,
            gamma0: self.last_gamma,
        };
        self.offset
    }

    /// Human-readable summary of the last raw and derived values
    pub fn debug_line(&self) -> String {
        format!(
            "X: {} | Y: {} | R_B:{} R_G:{}",
            self.last_signal.x.round(),
            self.last_signal.y.round(),
            self.last_beta.round(),
            self.last_gamma.round()
        )
    }
}

impl Default for InputNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(beta: f64, gamma: f64) -> GyroSample {
        GyroSample::new(Some(0.0), Some(beta), Some(gamma))
    }

    #[test]
    fn test_default_offset_applied() {
        let mut normalizer = InputNormalizer::new();
        let out = normalizer.sample(raw(10.0, -14.0), Instant::now()).unwrap();

        // x = (-14 - -24) * 1, y = (10 - 0) * -1
        assert_eq!(out.gamma, Some(10.0));
        assert_eq!(out.beta, Some(-10.0));
    }

    #[test]
    fn test_emissions_are_throttled_to_latest() {
        let mut normalizer = InputNormalizer::new();
        let start = Instant::now();

        assert!(normalizer.sample(raw(0.0, 0.0), start).is_some());
        assert!(normalizer
            .sample(raw(1.0, 0.0), start + Duration::from_millis(10))
            .is_none());
        assert!(normalizer
            .sample(raw(2.0, 0.0), start + Duration::from_millis(49))
            .is_none());

        let out = normalizer
            .sample(raw(3.0, 0.0), start + Duration::from_millis(50))
            .unwrap();
        assert_eq!(out.beta, Some(-3.0));
    }

    #[test]
    fn test_missing_axis_keeps_last_raw() {
        let mut normalizer = InputNormalizer::with_interval(Duration::ZERO);
        let now = Instant::now();

        normalizer.sample(raw(5.0, 6.0), now);
        let out = normalizer
            .sample(GyroSample::new(None, None, Some(8.0)), now)
            .unwrap();

        assert_eq!(out.beta, Some(-5.0));
        assert_eq!(out.gamma, Some(8.0 + 24.0));
        assert!(out.beta.unwrap().is_finite());
    }

    #[test]
    fn test_calibrate_twice_keeps_second() {
        let mut normalizer = InputNormalizer::with_interval(Duration::ZERO);
        let now = Instant::now();

        normalizer.sample(raw(11.0, 12.0), now);
        normalizer.calibrate();
        normalizer.sample(raw(-3.0, 7.0), now);
        let offset = normalizer.calibrate();

        assert_eq!(offset, Offset { beta0: -3.0, gamma0: 7.0 });
        assert_eq!(normalizer.signal(), ControlSignal::NEUTRAL);
    }

    #[test]
    fn test_debug_line_rounds() {
        let mut normalizer = InputNormalizer::new();
        normalizer.sample(raw(1.4, -20.6), Instant::now());

        assert_eq!(normalizer.debug_line(), "X: 3 | Y: -1 | R_B:1 R_G:-21");
    }

    proptest! {
        #[test]
        fn prop_signal_matches_offset_formula(
            beta in -180.0f64..180.0,
            gamma in -90.0f64..90.0,
            beta0 in -45.0f64..45.0,
            gamma0 in -45.0f64..45.0,
        ) {
            let mut normalizer = InputNormalizer::with_interval(Duration::ZERO);
            let now = Instant::now();
            normalizer.sample(raw(beta0, gamma0), now);
            normalizer.calibrate();

            let out = normalizer.sample(raw(beta, gamma), now).unwrap();
            prop_assert_eq!(out.gamma, Some((gamma - gamma0) * DIR_X));
            prop_assert_eq!(out.beta, Some((beta - beta0) * DIR_Y));
        }

        #[test]
        fn prop_no_two_emissions_closer_than_interval(
            gaps in proptest::collection::vec(0u64..120, 1..60),
        ) {
            let mut normalizer = InputNormalizer::new();
            let mut now = Instant::now();
            let mut emitted: Vec<Instant> = Vec::new();

            for gap in gaps {
                now += Duration::from_millis(gap);
                if normalizer.sample(raw(1.0, 1.0), now).is_some() {
                    emitted.push(now);
                }
            }

            for pair in emitted.windows(2) {
                prop_assert!(pair[1] - pair[0] >= EMIT_INTERVAL);
            }
        }
    }
}
