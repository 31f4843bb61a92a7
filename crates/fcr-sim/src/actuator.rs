//! First-order lag between the droop set-point and delivered FCR power.

use crate::error::{SimError, SimResult};

/// First-order low-pass actuator.
///
/// Dynamics: dP/dt = (target - P) / tau.
#[derive(Clone, Debug, PartialEq)]
pub struct FirstOrderLag {
    /// Time constant (seconds)
    pub tau: f64,
}

impl FirstOrderLag {
    pub fn new(tau: f64) -> SimResult<Self> {
        if !(tau.is_finite() && tau > 0.0) {
            return Err(SimError::InvalidArg {
                what: "lag time constant must be finite and positive",
            });
        }
        Ok(Self { tau })
    }

    /// Rate of change of the output given its current value and the target.
    pub fn derivative(&self, output: f64, target: f64) -> f64 {
        (target - output) / self.tau
    }
}
