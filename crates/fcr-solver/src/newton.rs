//! Damped Newton solver.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use tracing::trace;

/// Newton solver configuration.
#[derive(Clone, Debug)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm (relative to the initial residual)
    pub rel_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            abs_tol: 1e-10,
            rel_tol: 1e-12,
            line_search_beta: 0.5,
            max_line_search_iters: 10,
        }
    }
}

/// Newton iteration result.
#[derive(Clone, Debug)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Solve `residual(x) = 0` starting from `x0`.
///
/// Each iteration solves `J dx = -r` by LU and backtracks along `dx` until the
/// residual norm decreases and stays finite.
pub fn newton_solve<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>, &DVector<f64>) -> SolverResult<DMatrix<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    if !r_norm.is_finite() {
        return Err(SolverError::InvalidState {
            what: "non-finite residual at initial guess".to_string(),
        });
    }
    let r0_norm = r_norm;

    for iter in 0..config.max_iterations {
        if r_norm <= config.abs_tol || r_norm <= config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        let jac = jacobian_fn(&x, &r)?;
        let dx = jac.lu().solve(&(-&r)).ok_or_else(|| SolverError::Numeric {
            what: "singular Jacobian".to_string(),
        })?;

        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..=config.max_line_search_iters {
            let x_try = &x + alpha * &dx;
            // A trial point outside the residual's domain only shortens the step.
            if let Ok(r_try) = residual_fn(&x_try) {
                let n_try = r_try.norm();
                if n_try.is_finite() && n_try < r_norm {
                    accepted = Some((x_try, r_try, n_try));
                    break;
                }
            }
            alpha *= config.line_search_beta;
        }

        let Some((x_new, r_new, n_new)) = accepted else {
            trace!(iter, residual = r_norm, "line search stagnated");
            return Err(SolverError::ConvergenceFailed {
                what: format!("line search stagnated at iteration {iter}, residual = {r_norm:e}"),
            });
        };
        trace!(iter, residual = n_new, alpha, "newton step");
        x = x_new;
        r = r_new;
        r_norm = n_new;
    }

    if r_norm <= config.abs_tol || r_norm <= config.rel_tol * r0_norm {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
        });
    }

    Err(SolverError::ConvergenceFailed {
        what: format!(
            "maximum iterations {} reached, residual = {:e}",
            config.max_iterations, r_norm
        ),
    })
}
