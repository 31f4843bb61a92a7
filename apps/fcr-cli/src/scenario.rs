//! Scenario files and command-line parameter overrides.

use std::path::Path;

use clap::Args;
use fcr_core::{LoadStepDuration, SimulationParameters, SimulationWindow};
use serde::Deserialize;

use crate::error::CliResult;

/// A run described in YAML. Every key is optional; missing ones take the
/// defaults of [`SimulationParameters`]. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub load_step_pu: Option<f64>,
    pub load_step_duration_s: Option<f64>,
    /// Takes precedence over `load_step_duration_s` when present
    pub load_step_duration: Option<LoadStepDuration>,
    pub inertia_constant_s: Option<f64>,
    pub droop: Option<f64>,
    pub regulation_time_constant_s: Option<f64>,
    pub regulation_enabled: Option<bool>,
    pub regulation_lag_enabled: Option<bool>,
    pub window: Option<SimulationWindow>,
}

impl Scenario {
    pub fn from_yaml(text: &str) -> CliResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Validated window; the default window when none is given.
    pub fn window(&self) -> CliResult<SimulationWindow> {
        match self.window {
            Some(w) => Ok(SimulationWindow::new(w.t_ini, w.t_fin)?),
            None => Ok(SimulationWindow::default()),
        }
    }

    /// Final, validated parameters for `window`. Without any duration the
    /// step is permanent, i.e. lasts until `window.t_fin`.
    pub fn resolve(&self, window: &SimulationWindow) -> CliResult<SimulationParameters> {
        let defaults = SimulationParameters::default();
        let load_step_duration_s = match (self.load_step_duration, self.load_step_duration_s) {
            (Some(named), _) => named.resolve(window),
            (None, Some(seconds)) => seconds,
            (None, None) => LoadStepDuration::default().resolve(window),
        };
        let params = SimulationParameters {
            load_step_pu: self.load_step_pu.unwrap_or(defaults.load_step_pu),
            load_step_duration_s,
            inertia_constant_s: self.inertia_constant_s.unwrap_or(defaults.inertia_constant_s),
            droop: self.droop.unwrap_or(defaults.droop),
            regulation_time_constant_s: self
                .regulation_time_constant_s
                .unwrap_or(defaults.regulation_time_constant_s),
            regulation_enabled: self.regulation_enabled.unwrap_or(defaults.regulation_enabled),
            regulation_lag_enabled: self
                .regulation_lag_enabled
                .unwrap_or(defaults.regulation_lag_enabled),
        };
        params.validate()?;
        Ok(params)
    }
}

/// Parameter flags shared by `run` and `sweep`. Each flag overrides the
/// scenario file (or the defaults).
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// YAML scenario file
    #[arg(long)]
    pub scenario: Option<std::path::PathBuf>,
    /// Load step ΔP in per-unit, positive = excess consumption
    #[arg(long, allow_hyphen_values = true)]
    pub load_step: Option<f64>,
    /// Load step duration: "permanent" or "4 s"
    #[arg(long)]
    pub duration: Option<LoadStepDuration>,
    /// Inertia constant H (s)
    #[arg(long)]
    pub inertia: Option<f64>,
    /// Droop s (fraction, e.g. 0.1 for 10 %)
    #[arg(long)]
    pub droop: Option<f64>,
    /// FCR lag time constant T_fcr (s)
    #[arg(long)]
    pub lag_time: Option<f64>,
    /// Frequency containment reserve on or off (`--fcr` alone means on)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub fcr: Option<bool>,
    /// First-order FCR response lag on or off (`--fcr-lag` alone means on)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub fcr_lag: Option<bool>,
}

impl ParamArgs {
    /// Scenario from the file (if any) with the flags applied on top.
    pub fn scenario(&self) -> CliResult<Scenario> {
        let scenario = match &self.scenario {
            Some(path) => Scenario::load(path)?,
            None => Scenario::default(),
        };
        Ok(self.apply(scenario))
    }

    /// Overwrite every key of `scenario` that has a flag set.
    pub fn apply(&self, mut scenario: Scenario) -> Scenario {
        scenario.load_step_pu = self.load_step.or(scenario.load_step_pu);
        scenario.inertia_constant_s = self.inertia.or(scenario.inertia_constant_s);
        scenario.droop = self.droop.or(scenario.droop);
        scenario.regulation_time_constant_s =
            self.lag_time.or(scenario.regulation_time_constant_s);
        scenario.regulation_enabled = self.fcr.or(scenario.regulation_enabled);
        scenario.regulation_lag_enabled = self.fcr_lag.or(scenario.regulation_lag_enabled);
        scenario.load_step_duration = self.duration.or(scenario.load_step_duration);
        scenario
    }
}
