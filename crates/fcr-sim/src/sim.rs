//! Adaptive simulation runner and result recording.

use fcr_core::{SimulationWindow, Tolerances, weighted_rms};
use nalgebra::SVector;
use tracing::{debug, trace};

use crate::error::{SimError, SimResult};
use crate::integrator::{Integrator, TrBdf2};
use crate::model::TransientModel;

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Integration interval
    pub window: SimulationWindow,
    /// Local error tolerances
    pub tolerances: Tolerances,
    /// Largest allowed step (seconds)
    pub max_step: f64,
    /// Smallest allowed step before the run is declared failed (seconds)
    pub min_step: f64,
    /// First step size; estimated from the initial derivative when `None`
    pub initial_step: Option<f64>,
    /// Maximum number of accepted steps (safety limit)
    pub max_steps: usize,
    /// Step-size controller safety factor
    pub safety: f64,
    /// Smallest step-size change factor
    pub min_factor: f64,
    /// Largest step-size change factor
    pub max_factor: f64,
    /// Implicit stepper
    pub integrator: TrBdf2,
}

impl SimOptions {
    /// Defaults for a window: max step is a hundredth of its length.
    pub fn for_window(window: SimulationWindow) -> Self {
        Self {
            window,
            tolerances: Tolerances::default(),
            max_step: window.max_step(),
            min_step: 1e-10,
            initial_step: None,
            max_steps: 100_000,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
            integrator: TrBdf2::default(),
        }
    }

    fn validate(&self) -> SimResult<()> {
        if !(self.window.t_fin > self.window.t_ini) {
            return Err(SimError::InvalidArg {
                what: "t_fin must be greater than t_ini",
            });
        }
        if !(self.max_step > 0.0) || !(self.min_step > 0.0) || self.min_step > self.max_step {
            return Err(SimError::InvalidArg {
                what: "step bounds must satisfy 0 < min_step <= max_step",
            });
        }
        if !(self.tolerances.rel > 0.0 && self.tolerances.abs > 0.0) {
            return Err(SimError::InvalidArg {
                what: "tolerances must be positive",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if let Some(h) = self.initial_step {
            if !(h > 0.0) {
                return Err(SimError::InvalidArg {
                    what: "initial_step must be positive",
                });
            }
        }
        Ok(())
    }
}

impl Default for SimOptions {
    fn default() -> Self {
        Self::for_window(SimulationWindow::default())
    }
}

/// Work counters of one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverStats {
    pub accepted_steps: usize,
    /// Steps rejected by the error test
    pub rejected_steps: usize,
    /// Steps whose implicit stages could not be solved
    pub failed_stage_solves: usize,
    pub rhs_evals: usize,
    pub newton_iters: usize,
}

/// Record of simulation results: one entry per accepted step.
#[derive(Clone, Debug)]
pub struct SimRecord<const N: usize> {
    /// Time points (seconds), strictly increasing from `t_ini`
    pub t: Vec<f64>,
    /// State snapshots
    pub x: Vec<SVector<f64, N>>,
    pub stats: SolverStats,
    /// True when the terminal event stopped the run before `t_fin`
    pub terminated_by_event: bool,
}

/// Integrate `model` over `opts.window` with adaptive step control.
///
/// `terminal_event` is checked after every accepted step; when it returns
/// true the run stops and the triggering sample is the last one recorded.
pub fn run_sim<M, E, const N: usize>(
    model: &M,
    opts: &SimOptions,
    terminal_event: E,
) -> SimResult<SimRecord<N>>
where
    M: TransientModel<N>,
    E: Fn(f64, &SVector<f64, N>) -> bool,
{
    opts.validate()?;

    let integrator = &opts.integrator;
    let tol = &opts.tolerances;
    let t_end = opts.window.t_fin;
    let exponent = -1.0 / (integrator.order() as f64 + 1.0);

    let mut stats = SolverStats::default();
    let mut t = opts.window.t_ini;
    let mut x = model.initial_state();
    let mut dxdt = model.rhs(t, &x)?;
    stats.rhs_evals += 1;

    let mut t_record = vec![t];
    let mut x_record = vec![x];
    let mut terminated_by_event = false;

    let mut h = opts
        .initial_step
        .unwrap_or_else(|| initial_step(&x, &dxdt, tol))
        .min(opts.max_step);
    let mut rejected_last = false;

    while t < t_end {
        if stats.accepted_steps >= opts.max_steps {
            return Err(SimError::TooManySteps {
                t,
                max_steps: opts.max_steps,
            });
        }

        let remaining = t_end - t;
        let mut h_try = h.min(opts.max_step);
        if h_try >= remaining || remaining - h_try < opts.min_step {
            h_try = remaining;
        }
        if (h_try < opts.min_step && h_try < remaining) || t + h_try <= t {
            return Err(SimError::StepSizeUnderflow { t, h: h_try });
        }

        let outcome = match integrator.step(model, t, &x, &dxdt, h_try, tol) {
            Ok(outcome) if outcome.error_norm.is_finite() => outcome,
            Ok(_) | Err(_) => {
                stats.failed_stage_solves += 1;
                trace!(t, h = h_try, "implicit stage failed, halving step");
                h = h_try * 0.5;
                rejected_last = true;
                if h < opts.min_step {
                    return Err(SimError::ConvergenceFailed {
                        what: format!("implicit stages unsolvable at t = {t} down to h = {h:e}"),
                    });
                }
                continue;
            }
        };
        stats.rhs_evals += outcome.rhs_evals;
        stats.newton_iters += outcome.newton_iters;

        if outcome.error_norm > 1.0 {
            stats.rejected_steps += 1;
            let factor = (opts.safety * outcome.error_norm.powf(exponent)).max(opts.min_factor);
            trace!(t, h = h_try, error = outcome.error_norm, "step rejected");
            h = h_try * factor;
            rejected_last = true;
            continue;
        }

        t = if h_try == remaining { t_end } else { t + h_try };
        x = outcome.x;
        dxdt = outcome.dxdt;
        t_record.push(t);
        x_record.push(x);
        stats.accepted_steps += 1;

        if terminal_event(t, &x) {
            terminated_by_event = true;
            break;
        }

        let mut factor = if outcome.error_norm == 0.0 {
            opts.max_factor
        } else {
            (opts.safety * outcome.error_norm.powf(exponent)).clamp(opts.min_factor, opts.max_factor)
        };
        if rejected_last {
            factor = factor.min(1.0);
            rejected_last = false;
        }
        h = h_try * factor;
    }

    debug!(
        accepted = stats.accepted_steps,
        rejected = stats.rejected_steps,
        stage_failures = stats.failed_stage_solves,
        rhs_evals = stats.rhs_evals,
        t_last = t,
        terminated_by_event,
        "integration finished"
    );

    Ok(SimRecord {
        t: t_record,
        x: x_record,
        stats,
        terminated_by_event,
    })
}

/// Starting step `0.01 * |x| / |f|` in the weighted norm, or 1e-6 when either is negligible.
fn initial_step<const N: usize>(
    x: &SVector<f64, N>,
    dxdt: &SVector<f64, N>,
    tol: &Tolerances,
) -> f64 {
    let d0 = weighted_rms(x.iter().map(|&xi| (xi, tol.scale(xi, xi))));
    let d1 = weighted_rms(
        x.iter()
            .zip(dxdt.iter())
            .map(|(&xi, &fi)| (fi, tol.scale(xi, xi))),
    );
    if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector1, Vector2};

    struct Decay;

    impl TransientModel<1> for Decay {
        fn initial_state(&self) -> Vector1<f64> {
            Vector1::new(1.0)
        }

        fn rhs(&self, _t: f64, x: &Vector1<f64>) -> SimResult<Vector1<f64>> {
            Ok(Vector1::new(-x[0]))
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

    fn options(t_ini: f64, t_fin: f64) -> SimOptions {
        SimOptions::for_window(SimulationWindow::new(t_ini, t_fin).unwrap())
    }

    #[test]
    fn sim_options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.window.t_ini, -1.0);
        assert_eq!(opts.window.t_fin, 10.0);
        assert!((opts.max_step - 0.11).abs() < 1e-12);
        assert_eq!(opts.tolerances.rel, 1e-4);
    }

    #[test]
    fn decay_matches_exponential() {
        let record = run_sim(&Decay, &options(0.0, 2.0), |_, _| false).unwrap();
        let last = *record.t.last().unwrap();
        assert_eq!(last, 2.0);
        let x_end = record.x.last().unwrap()[0];
        assert!((x_end - (-2.0f64).exp()).abs() < 1e-3);
        assert!(!record.terminated_by_event);
    }

    #[test]
    fn time_grid_is_strictly_increasing_and_bounded() {
        let opts = options(-1.0, 10.0);
        let record = run_sim(&Oscillator, &opts, |_, _| false).unwrap();
        assert_eq!(record.t.len(), record.x.len());
        assert_eq!(record.t[0], -1.0);
        for pair in record.t.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] <= opts.max_step + 1e-9);
        }
        assert_eq!(*record.t.last().unwrap(), 10.0);
    }

    #[test]
    fn oscillator_phase_is_tracked() {
        let record = run_sim(&Oscillator, &options(0.0, 3.0), |_, _| false).unwrap();
        let x_end = record.x.last().unwrap();
        assert!((x_end[0] - 3.0f64.cos()).abs() < 1e-2);
        assert!((x_end[1] + 3.0f64.sin()).abs() < 1e-2);
    }

    #[test]
    fn terminal_event_stops_the_run() {
        let record = run_sim(&Decay, &options(0.0, 10.0), |_, x| x[0] < 0.5).unwrap();
        assert!(record.terminated_by_event);
        let last = record.x.last().unwrap()[0];
        assert!(last < 0.5);
        assert!(*record.t.last().unwrap() < 10.0);
        // Only the triggering sample is below the threshold
        assert!(record.x[..record.x.len() - 1].iter().all(|x| x[0] >= 0.5));
    }

    #[test]
    fn step_limit_is_reported() {
        let mut opts = options(0.0, 10.0);
        opts.max_steps = 3;
        let err = run_sim(&Decay, &opts, |_, _| false).unwrap_err();
        assert!(matches!(err, SimError::TooManySteps { max_steps: 3, .. }));
    }

    #[test]
    fn invalid_step_bounds_rejected() {
        let mut opts = options(0.0, 1.0);
        opts.min_step = 1.0;
        opts.max_step = 0.1;
        assert!(matches!(
            run_sim(&Decay, &opts, |_, _| false),
            Err(SimError::InvalidArg { .. })
        ));
    }

    #[test]
    fn model_failure_surfaces_as_error() {
        struct AlwaysFails;
        impl TransientModel<1> for AlwaysFails {
            fn initial_state(&self) -> Vector1<f64> {
                Vector1::new(1.0)
            }
            fn rhs(&self, t: f64, _x: &Vector1<f64>) -> SimResult<Vector1<f64>> {
                if t > 0.5 {
                    Err(SimError::NonPhysical {
                        t,
                        what: "test failure",
                    })
                } else {
                    Ok(Vector1::new(0.0))
                }
            }
        }

        let err = run_sim(&AlwaysFails, &options(0.0, 1.0), |_, _| false).unwrap_err();
        assert!(matches!(
            err,
            SimError::ConvergenceFailed { .. } | SimError::StepSizeUnderflow { .. }
        ));
    }
}
