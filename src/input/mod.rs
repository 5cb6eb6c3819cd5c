//! Tilt input: raw orientation samples and the normalizer that turns them
//! into the calibrated 2-axis control signal

pub mod normalizer;

pub use normalizer::{InputNormalizer, Offset, DIR_X, DIR_Y, EMIT_INTERVAL};

use serde::{Deserialize, Serialize};

/// Raw device angles in degrees; any axis may be unavailable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GyroSample {
    /// Z-axis rotation
    pub alpha: Option<f64>,
    /// X-axis rotation (front/back)
    pub beta: Option<f64>,
    /// Y-axis rotation (left/right)
    pub gamma: Option<f64>,
}

impl GyroSample {
    pub fn new(alpha: Option<f64>, beta: Option<f64>, gamma: Option<f64>) -> Self {
        Self { alpha, beta, gamma }
    }
}

/// Calibrated 2-axis control value consumed by the simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSignal {
    pub x: f64,
    pub y: f64,
}

impl ControlSignal {
    pub const NEUTRAL: ControlSignal = ControlSignal { x: 0.0, y: 0.0 };

    /// Merge a relayed wire sample into this signal.
    ///
    /// On the wire the normalizer puts `x` in `gamma` and `y` in `beta`.
    /// Missing or non-finite axes keep the previous component.
    pub fn apply(&mut self, sample: &GyroSample) {
        if let Some(gamma) = sample.gamma.filter(|v| v.is_finite()) {
            self.x = gamma;
        }
        if let Some(beta) = sample.beta.filter(|v| v.is_finite()) {
            self.y = beta;
        }
    }
}
