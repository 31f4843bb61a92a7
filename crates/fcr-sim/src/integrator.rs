//! Implicit one-step integrators.

use std::cell::Cell;

use fcr_core::{Tolerances, weighted_rms};
use fcr_solver::{
    NewtonConfig, SolverError, SolverResult, finite_difference_jacobian, newton_solve,
};
use nalgebra::{DMatrix, DVector, SVector};

use crate::error::SimResult;
use crate::model::TransientModel;

/// One attempted step from `(t, x)` with size `h`.
#[derive(Clone, Debug)]
pub struct StepOutcome<const N: usize> {
    /// State at `t + h`
    pub x: SVector<f64, N>,
    /// Derivative at `(t + h, x)`, reusable as the start derivative of the next step
    pub dxdt: SVector<f64, N>,
    /// Weighted RMS of the local error estimate; the step is acceptable when <= 1
    pub error_norm: f64,
    /// Model evaluations spent on this attempt
    pub rhs_evals: usize,
    /// Newton iterations spent on this attempt
    pub newton_iters: usize,
}

/// Trait for adaptive one-step integrators.
pub trait Integrator {
    /// Convergence order of the method, used by the step-size controller.
    fn order(&self) -> u32;

    /// Attempt one step. `dxdt` is f(t, x).
    ///
    /// An `Err` means the implicit stages could not be solved at this step size;
    /// the caller should retry with a smaller `h`.
    fn step<M: TransientModel<N>, const N: usize>(
        &self,
        model: &M,
        t: f64,
        x: &SVector<f64, N>,
        dxdt: &SVector<f64, N>,
        h: f64,
        tol: &Tolerances,
    ) -> SimResult<StepOutcome<N>>;
}

/// TR-BDF2: a trapezoidal stage to `t + γh` followed by a BDF2 stage to `t + h`.
///
/// L-stable, second order, with an embedded error estimate built from the
/// second divided difference of the three stage derivatives.
#[derive(Clone, Debug)]
pub struct TrBdf2 {
    pub newton: NewtonConfig,
    /// Relative perturbation for the finite-difference Jacobian
    pub jacobian_epsilon: f64,
}

impl Default for TrBdf2 {
    fn default() -> Self {
        Self {
            newton: NewtonConfig::default(),
            jacobian_epsilon: 1e-8,
        }
    }
}

const GAMMA: f64 = 2.0 - std::f64::consts::SQRT_2;
/// Implicit weight of both stages, γ/2.
const D: f64 = GAMMA / 2.0;
/// BDF2 stage weight of the intermediate point, 1 / (γ (2 - γ)).
const W: f64 = (1.0 + std::f64::consts::SQRT_2) / 2.0;

impl TrBdf2 {
    /// Local truncation error constant (-3γ² + 4γ - 2) / (12 (2 - γ)).
    fn error_constant() -> f64 {
        (-3.0 * GAMMA * GAMMA + 4.0 * GAMMA - 2.0) / (12.0 * (2.0 - GAMMA))
    }

    /// Solve `z - dh f(t, z) = base` for `z`, starting from `guess`.
    fn solve_stage<M: TransientModel<N>, const N: usize>(
        &self,
        model: &M,
        t: f64,
        dh: f64,
        base: &SVector<f64, N>,
        guess: &SVector<f64, N>,
        rhs_evals: &Cell<usize>,
    ) -> SolverResult<(SVector<f64, N>, usize)> {
        let residual = |z: &DVector<f64>| -> SolverResult<DVector<f64>> {
            let zs = SVector::<f64, N>::from_column_slice(z.as_slice());
            rhs_evals.set(rhs_evals.get() + 1);
            let fz = model.rhs(t, &zs).map_err(|e| SolverError::InvalidState {
                what: e.to_string(),
            })?;
            let g = zs - fz * dh - base;
            Ok(DVector::from_column_slice(g.as_slice()))
        };
        let jacobian = |z: &DVector<f64>, r: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            finite_difference_jacobian(z, r, residual, self.jacobian_epsilon)
        };

        let solution = newton_solve(
            DVector::from_column_slice(guess.as_slice()),
            residual,
            jacobian,
            &self.newton,
        )?;
        Ok((
            SVector::<f64, N>::from_column_slice(solution.x.as_slice()),
            solution.iterations,
        ))
    }
}

impl Integrator for TrBdf2 {
    fn order(&self) -> u32 {
        2
    }

    fn step<M: TransientModel<N>, const N: usize>(
        &self,
        model: &M,
        t: f64,
        x: &SVector<f64, N>,
        dxdt: &SVector<f64, N>,
        h: f64,
        tol: &Tolerances,
    ) -> SimResult<StepOutcome<N>> {
        let rhs_evals = Cell::new(0usize);
        let dh = D * h;

        // Trapezoidal stage to t + γh
        let t_gamma = t + GAMMA * h;
        let base = x + dxdt * dh;
        let guess = x + dxdt * (GAMMA * h);
        let (z, iters_1) = self.solve_stage(model, t_gamma, dh, &base, &guess, &rhs_evals)?;
        let f_gamma = model.rhs(t_gamma, &z)?;

        // BDF2 stage to t + h
        let t_next = t + h;
        let base = z * W - x * (W - 1.0);
        let guess = z + f_gamma * ((1.0 - GAMMA) * h);
        let (x_next, iters_2) = self.solve_stage(model, t_next, dh, &base, &guess, &rhs_evals)?;
        let f_next = model.rhs(t_next, &x_next)?;

        let scale = 2.0 * Self::error_constant() * h;
        let estimate = (dxdt / GAMMA - f_gamma / (GAMMA * (1.0 - GAMMA)) + f_next / (1.0 - GAMMA))
            * scale;
        let error_norm = weighted_rms(
            (0..N).map(|i| (estimate[i], tol.scale(x[i], x_next[i]))),
        );

        Ok(StepOutcome {
            x: x_next,
            dxdt: f_next,
            error_norm,
            rhs_evals: rhs_evals.get() + 2,
            newton_iters: iters_1 + iters_2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector1, Vector2};

    struct Decay {
        rate: f64,
    }

    impl TransientModel<1> for Decay {
        fn initial_state(&self) -> Vector1<f64> {
            Vector1::new(1.0)
        }

        fn rhs(&self, _t: f64, x: &Vector1<f64>) -> SimResult<Vector1<f64>> {
            Ok(Vector1::new(-self.rate * x[0]))
        }
    }

    struct Oscillator;

    impl TransientModel<2> for Oscillator {
        fn initial_state(&self) -> Vector2<f64> {
            Vector2::new(1.0, 0.0)
        }

        fn rhs(&self, _t: f64, x: &Vector2<f64>) -> SimResult<Vector2<f64>> {
            Ok(Vector2::new(x[1], -x[0]))
        }
    }

    #[test]
    fn two_dimensional_step_tracks_rotation() {
        let model = Oscillator;
        let x0 = model.initial_state();
        let f0 = model.rhs(0.0, &x0).unwrap();
        let h: f64 = 0.05;
        let out = TrBdf2::default()
            .step(&model, 0.0, &x0, &f0, h, &Tolerances::default())
            .unwrap();
        assert!((out.x[0] - h.cos()).abs() < 1e-5);
        assert!((out.x[1] + h.sin()).abs() < 1e-5);
    }

    #[test]
    fn stage_coefficients() {
        assert!((W - 1.0 / (GAMMA * (2.0 - GAMMA))).abs() < 1e-14);
        assert!((D - (1.0 - GAMMA) / (2.0 - GAMMA)).abs() < 1e-14);
    }

    #[test]
    fn small_step_on_decay_is_accurate() {
        let model = Decay { rate: 1.0 };
        let x0 = model.initial_state();
        let f0 = model.rhs(0.0, &x0).unwrap();
        let out = TrBdf2::default()
            .step(&model, 0.0, &x0, &f0, 0.01, &Tolerances::default())
            .unwrap();

        assert!((out.x[0] - (-0.01f64).exp()).abs() < 1e-7);
        assert!(out.error_norm < 1.0);
        assert!((out.dxdt[0] + out.x[0]).abs() < 1e-12);
    }

    #[test]
    fn stiff_decay_stays_bounded_with_large_step() {
        // h * rate = 1e4: an explicit method would blow up
        let model = Decay { rate: 1e4 };
        let x0 = model.initial_state();
        let f0 = model.rhs(0.0, &x0).unwrap();
        let out = TrBdf2::default()
            .step(&model, 0.0, &x0, &f0, 1.0, &Tolerances::default())
            .unwrap();
        assert!(out.x[0].abs() < 1e-2);
    }

    #[test]
    fn error_estimate_shrinks_with_step() {
        let model = Decay { rate: 1.0 };
        let x0 = model.initial_state();
        let f0 = model.rhs(0.0, &x0).unwrap();
        let tol = Tolerances::default();
        let integrator = TrBdf2::default();

        let coarse = integrator.step(&model, 0.0, &x0, &f0, 0.2, &tol).unwrap();
        let fine = integrator.step(&model, 0.0, &x0, &f0, 0.1, &tol).unwrap();
        // Third-order local error: halving h divides the estimate by ~8
        let ratio = coarse.error_norm / fine.error_norm;
        assert!(ratio > 6.0 && ratio < 10.0, "ratio = {ratio}");
    }

    #[test]
    fn constant_state_has_zero_error() {
        let model = Decay { rate: 1.0 };
        let x0 = Vector1::new(0.0);
        let f0 = model.rhs(0.0, &x0).unwrap();
        let out = TrBdf2::default()
            .step(&model, 0.0, &x0, &f0, 0.5, &Tolerances::default())
            .unwrap();
        assert_eq!(out.x[0], 0.0);
        assert_eq!(out.error_norm, 0.0);
        assert_eq!(out.newton_iters, 0);
    }
}
