//! Simulation parameter set and parameter-source options.

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::numeric::ensure_finite;
use crate::units::{Ratio, Time, s, unitless};

/// Fixed simulation window `[t_ini, t_fin]` in seconds.
///
/// The load step is applied at `t = 0`; the negative start shows the grid at
/// rest before the event.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct SimulationWindow {
    pub t_ini: f64,
    pub t_fin: f64,
}

impl SimulationWindow {
    pub fn new(t_ini: f64, t_fin: f64) -> CoreResult<Self> {
        if !t_ini.is_finite() || !t_fin.is_finite() {
            return Err(CoreError::invalid("window", "bounds must be finite"));
        }
        if t_fin <= t_ini {
            return Err(CoreError::invalid(
                "window",
                format!("t_fin ({t_fin}) must be greater than t_ini ({t_ini})"),
            ));
        }
        Ok(Self { t_ini, t_fin })
    }

    pub fn span(&self) -> f64 {
        self.t_fin - self.t_ini
    }

    /// Largest step the integrator may take: one hundredth of the window.
    pub fn max_step(&self) -> f64 {
        self.span() / 100.0
    }
}

impl Default for SimulationWindow {
    fn default() -> Self {
        Self {
            t_ini: -1.0,
            t_fin: 10.0,
        }
    }
}

/// Discrete load-step durations offered by the interactive front end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadStepDuration {
    /// Step lasts until the end of the window.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "permanent"))]
    Permanent,
    /// Step reverts to zero after 4 s.
    #[cfg_attr(feature = "serde", serde(rename = "4 s", alias = "4s"))]
    FourSeconds,
}

impl LoadStepDuration {
    /// Duration in seconds; `Permanent` maps to the window's final time.
    pub fn resolve(self, window: &SimulationWindow) -> f64 {
        match self {
            LoadStepDuration::Permanent => window.t_fin,
            LoadStepDuration::FourSeconds => 4.0,
        }
    }
}

impl FromStr for LoadStepDuration {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "permanent" => Ok(LoadStepDuration::Permanent),
            "4 s" | "4s" => Ok(LoadStepDuration::FourSeconds),
            other => Err(CoreError::invalid(
                "load_step_duration",
                format!("expected 'permanent' or '4 s', got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for LoadStepDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStepDuration::Permanent => write!(f, "permanent"),
            LoadStepDuration::FourSeconds => write!(f, "4 s"),
        }
    }
}

/// Inputs of one frequency-response run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct SimulationParameters {
    /// Excess of consumption in per-unit (positive = more load than generation).
    pub load_step_pu: f64,
    /// How long the excess lasts (s). May be `f64::INFINITY`.
    pub load_step_duration_s: f64,
    /// Aggregated inertia constant H (s), > 0.
    pub inertia_constant_s: f64,
    /// Droop (inverse regulation gain) as a fraction, > 0.
    pub droop: f64,
    /// First-order lag time constant of FCR actuation (s), > 0.
    pub regulation_time_constant_s: f64,
    /// Whether FCR acts at all.
    pub regulation_enabled: bool,
    /// Whether FCR power goes through the first-order lag.
    pub regulation_lag_enabled: bool,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            load_step_pu: 0.1,
            load_step_duration_s: LoadStepDuration::Permanent
                .resolve(&SimulationWindow::default()),
            inertia_constant_s: 1.0,
            droop: 0.10,
            regulation_time_constant_s: 1.0,
            regulation_enabled: false,
            regulation_lag_enabled: false,
        }
    }
}

impl SimulationParameters {
    /// Reject out-of-range values, naming the offending field.
    pub fn validate(&self) -> CoreResult<()> {
        ensure_finite(self.load_step_pu, "load_step_pu")?;
        if self.load_step_duration_s.is_nan() || self.load_step_duration_s <= 0.0 {
            return Err(CoreError::invalid(
                "load_step_duration_s",
                format!("must be positive, got {}", self.load_step_duration_s),
            ));
        }
        strictly_positive("inertia_constant_s", self.inertia_constant_s)?;
        strictly_positive("droop", self.droop)?;
        strictly_positive(
            "regulation_time_constant_s",
            self.regulation_time_constant_s,
        )?;
        Ok(())
    }

    /// Instantaneous load excess: the step applies on `0 <= t < duration`.
    pub fn load_excess(&self, t: f64) -> f64 {
        if t >= 0.0 && t < self.load_step_duration_s {
            self.load_step_pu
        } else {
            0.0
        }
    }

    pub fn inertia_constant(&self) -> Time {
        s(self.inertia_constant_s)
    }

    pub fn regulation_time_constant(&self) -> Time {
        s(self.regulation_time_constant_s)
    }

    pub fn droop_ratio(&self) -> Ratio {
        unitless(self.droop)
    }
}

fn strictly_positive(field: &'static str, value: f64) -> CoreResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CoreError::invalid(
            field,
            format!("must be finite and > 0, got {value}"),
        ))
    }
}
