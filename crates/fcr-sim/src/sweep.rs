//! Parameter sweeps: many independent runs over one varied parameter.
//!
//! Each point is a full simulation with its own result; points run in
//! parallel and a failed point does not affect the others.

use std::fmt;
use std::str::FromStr;

use fcr_core::SimulationParameters;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::response::{SimulationResult, simulate_with};
use crate::sim::SimOptions;

/// Parameter varied across a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepParameter {
    InertiaConstant,
    Droop,
    RegulationTimeConstant,
    LoadStep,
}

impl SweepParameter {
    /// Copy of `base` with this parameter set to `value`.
    pub fn apply(self, base: &SimulationParameters, value: f64) -> SimulationParameters {
        let mut params = base.clone();
        match self {
            SweepParameter::InertiaConstant => params.inertia_constant_s = value,
            SweepParameter::Droop => params.droop = value,
            SweepParameter::RegulationTimeConstant => params.regulation_time_constant_s = value,
            SweepParameter::LoadStep => params.load_step_pu = value,
        }
        params
    }
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SweepParameter::InertiaConstant => "inertia",
            SweepParameter::Droop => "droop",
            SweepParameter::RegulationTimeConstant => "lag",
            SweepParameter::LoadStep => "load-step",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SweepParameter {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inertia" | "H" => Ok(SweepParameter::InertiaConstant),
            "droop" | "s" => Ok(SweepParameter::Droop),
            "lag" | "T_fcr" => Ok(SweepParameter::RegulationTimeConstant),
            "load-step" | "load" => Ok(SweepParameter::LoadStep),
            _ => Err(SimError::InvalidArg {
                what: "sweep parameter must be one of inertia, droop, lag, load-step",
            }),
        }
    }
}

/// Type of sweep progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepType {
    /// Uniformly spaced points
    #[default]
    Linear,
    /// Logarithmically spaced points
    Logarithmic,
}

/// Definition of a single parameter sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepDefinition {
    pub parameter: SweepParameter,
    pub start: f64,
    pub end: f64,
    pub num_points: usize,
    pub sweep_type: SweepType,
}

impl SweepDefinition {
    pub fn new(
        parameter: SweepParameter,
        start: f64,
        end: f64,
        num_points: usize,
        sweep_type: SweepType,
    ) -> SimResult<Self> {
        if num_points < 2 {
            return Err(SimError::InvalidArg {
                what: "sweep must have at least 2 points",
            });
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(SimError::InvalidArg {
                what: "sweep bounds must be finite",
            });
        }
        if (start - end).abs() < 1e-12 {
            return Err(SimError::InvalidArg {
                what: "sweep start and end must differ",
            });
        }
        if sweep_type == SweepType::Logarithmic && (start <= 0.0 || end <= 0.0) {
            return Err(SimError::InvalidArg {
                what: "logarithmic sweep bounds must be positive",
            });
        }
        Ok(Self {
            parameter,
            start,
            end,
            num_points,
            sweep_type,
        })
    }

    /// All sweep values, endpoints included exactly.
    pub fn generate_points(&self) -> Vec<f64> {
        let last = (self.num_points - 1) as f64;
        let mut points: Vec<f64> = match self.sweep_type {
            SweepType::Linear => {
                let delta = (self.end - self.start) / last;
                (0..self.num_points)
                    .map(|i| self.start + i as f64 * delta)
                    .collect()
            }
            SweepType::Logarithmic => {
                let (a, b) = (self.start.ln(), self.end.ln());
                let delta = (b - a) / last;
                (0..self.num_points)
                    .map(|i| (a + i as f64 * delta).exp())
                    .collect()
            }
        };
        points[0] = self.start;
        points[self.num_points - 1] = self.end;
        points
    }
}

impl fmt::Display for SweepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sweep {} from {} to {} ({} points, {:?})",
            self.parameter, self.start, self.end, self.num_points, self.sweep_type
        )
    }
}

/// One evaluated sweep point.
#[derive(Debug, Clone)]
pub struct SweepPoint {
    pub value: f64,
    pub params: SimulationParameters,
    pub outcome: SimResult<SimulationResult>,
}

/// Run every point of `sweep` on top of `base`, in parallel.
///
/// Points come back in sweep order.
pub fn run_sweep(
    base: &SimulationParameters,
    sweep: &SweepDefinition,
    opts: &SimOptions,
) -> Vec<SweepPoint> {
    debug!(%sweep, "running parameter sweep");
    sweep
        .generate_points()
        .into_par_iter()
        .map(|value| {
            let params = sweep.parameter.apply(base, value);
            let outcome = simulate_with(&params, opts);
            SweepPoint {
                value,
                params,
                outcome,
            }
        })
        .collect()
}
