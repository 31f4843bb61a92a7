//! Frequency response of the grid to a load step.

use fcr_core::{BLACKOUT_THRESHOLD_HZ, SimulationParameters};
use nalgebra::SVector;
use tracing::{debug, warn};

use crate::error::SimResult;
use crate::model::{DynamicsModel, SwingEquation, TransientModel};
use crate::sim::{SimOptions, SimRecord, SolverStats, run_sim};

/// Output of one simulation run. All series are aligned with `time`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationResult {
    /// Sample times (s), strictly increasing within the window
    pub time: Vec<f64>,
    /// Grid frequency (Hz)
    pub frequency: Vec<f64>,
    /// FCR power output (pu)
    pub regulation_power: Vec<f64>,
    /// Frequency FCR alone settles to; 0 Hz (blackout) when FCR is disabled
    pub steady_state_frequency_floor: f64,
    /// Droop gain K used for the run (pu/Hz)
    pub droop_gain: f64,
    /// Frequency fell below the blackout threshold and integration stopped there
    pub terminated_by_blackout: bool,
    pub stats: SolverStats,
}

impl SimulationResult {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn final_frequency(&self) -> Option<f64> {
        self.frequency.last().copied()
    }
}

/// Run one simulation with the default window and tolerances.
pub fn simulate(params: &SimulationParameters) -> SimResult<SimulationResult> {
    simulate_with(params, &SimOptions::default())
}

/// Run one simulation.
///
/// Parameters are validated before anything is integrated. Integration stops
/// early if the frequency collapses below the blackout threshold; any other
/// integrator failure is returned as an error without a partial trajectory.
pub fn simulate_with(
    params: &SimulationParameters,
    opts: &SimOptions,
) -> SimResult<SimulationResult> {
    params.validate()?;

    let dynamics = DynamicsModel::select(params)?;
    let swing = dynamics.swing().clone();
    debug!(
        lag = params.regulation_lag_enabled,
        regulation = params.regulation_enabled,
        droop_gain = swing.droop_gain(),
        floor_hz = swing.steady_state_floor_hz(),
        state_dim = dynamics.state_dimension(),
        "starting frequency response run"
    );

    let (time, frequency, regulation_power, stats, terminated_by_blackout): (
        Vec<f64>,
        Vec<f64>,
        Vec<f64>,
        SolverStats,
        bool,
    ) = match &dynamics {
        DynamicsModel::Droop(model) => {
            let record = integrate(model, opts)?;
            let frequency: Vec<f64> = record.x.iter().map(|x| x[0]).collect();
            // Algebraic droop law reapplied to the integrated frequency.
            let regulation_power = frequency.iter().map(|&f| swing.droop_power(f)).collect();
            (
                record.t,
                frequency,
                regulation_power,
                record.stats,
                record.terminated_by_event,
            )
        }
        DynamicsModel::Lagged(model) => {
            let record = integrate(model, opts)?;
            let frequency = record.x.iter().map(|x| x[0]).collect();
            let regulation_power = record.x.iter().map(|x| x[1]).collect();
            (
                record.t,
                frequency,
                regulation_power,
                record.stats,
                record.terminated_by_event,
            )
        }
    };

    if terminated_by_blackout {
        warn!(
            t = time.last().copied().unwrap_or(opts.window.t_ini),
            "frequency collapsed below {BLACKOUT_THRESHOLD_HZ} Hz, blackout"
        );
    }

    Ok(SimulationResult {
        time,
        frequency,
        regulation_power,
        steady_state_frequency_floor: swing.steady_state_floor_hz(),
        droop_gain: swing.droop_gain(),
        terminated_by_blackout,
        stats,
    })
}

fn integrate<M, const N: usize>(model: &M, opts: &SimOptions) -> SimResult<SimRecord<N>>
where
    M: TransientModel<N>,
{
    run_sim(model, opts, |_t, x: &SVector<f64, N>| {
        x[0] < BLACKOUT_THRESHOLD_HZ
    })
}

/// Gain and floor a run with `params` would use, without integrating.
pub fn steady_state(params: &SimulationParameters) -> SimResult<(f64, f64)> {
    params.validate()?;
    let swing = SwingEquation::new(params);
    Ok((swing.droop_gain(), swing.steady_state_floor_hz()))
}
