//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered during transient simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("Non-physical condition at t = {t}: {what}")]
    NonPhysical { t: f64, what: &'static str },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Step size underflow at t = {t}: h = {h:e}")]
    StepSizeUnderflow { t: f64, h: f64 },

    #[error("Step limit of {max_steps} reached at t = {t}")]
    TooManySteps { t: f64, max_steps: usize },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<fcr_core::CoreError> for SimError {
    fn from(e: fcr_core::CoreError) -> Self {
        match e {
            fcr_core::CoreError::InvalidParameter { field, reason } => {
                SimError::InvalidParameter { field, reason }
            }
            fcr_core::CoreError::NonFinite { what, value } => SimError::InvalidParameter {
                field: what,
                reason: format!("non-finite value {value}"),
            },
        }
    }
}

impl From<fcr_solver::SolverError> for SimError {
    fn from(e: fcr_solver::SolverError) -> Self {
        SimError::ConvergenceFailed {
            what: e.to_string(),
        }
    }
}
