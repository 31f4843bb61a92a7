//! Error types for solver operations.

use thiserror::Error;

/// Errors that can occur while solving an implicit stage.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Invalid state: {what}")]
    InvalidState { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;
