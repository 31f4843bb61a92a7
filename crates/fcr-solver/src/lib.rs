//! Nonlinear algebraic solver used by the implicit time integrator.
//!
//! Each implicit stage of a step is a small system `G(z) = 0` in the state
//! unknowns. This crate solves it with a damped Newton iteration on a
//! finite-difference Jacobian.

pub mod error;
pub mod jacobian;
pub mod newton;

pub use error::{SolverError, SolverResult};
pub use jacobian::finite_difference_jacobian;
pub use newton::{NewtonConfig, NewtonResult, newton_solve};
