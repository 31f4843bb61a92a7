//! Annotation values for a frequency-response plot or report.

use fcr_core::{BLACKOUT_THRESHOLD_HZ, F0_HZ, SimulationParameters, SimulationWindow};
use fcr_sim::SimulationResult;
use serde::{Deserialize, Serialize};
use uom::si::ratio::percent;
use uom::si::time::second;

use crate::nadir::NadirFeature;

/// True when the trajectory ends at (numerically) 0 Hz.
pub fn is_blackout(frequency: &[f64]) -> bool {
    frequency
        .last()
        .is_some_and(|&f| f < BLACKOUT_THRESHOLD_HZ)
}

/// Everything a rendering sink needs to annotate one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    /// Frequency FCR alone settles to (Hz); 0 Hz when FCR is disabled
    pub steady_state_frequency_floor: f64,
    /// Whether the floor is worth drawing (only with FCR active)
    pub regulation_enabled: bool,
    pub nadir: Option<NadirFeature>,
    /// Initial RoCoF slope `-f0 / (2H) * dP` (Hz/s), drawn from `(0, f0)`
    pub rocof_hz_per_s: f64,
    pub blackout: bool,
    /// From the last sample to the end of the window, when blacked out
    pub blackout_span: Option<(f64, f64)>,
    /// `[0, T_fcr]`, when the FCR lag is enabled
    pub lag_span: Option<(f64, f64)>,
    /// Load excess (pu) at each sample of `time`
    pub load_profile: Vec<f64>,
}

impl Annotations {
    pub fn from_run(
        params: &SimulationParameters,
        result: &SimulationResult,
        window: &SimulationWindow,
    ) -> Self {
        let blackout = is_blackout(&result.frequency);
        let blackout_span = if blackout {
            result.time.last().map(|&t| (t, window.t_fin))
        } else {
            None
        };

        Self {
            steady_state_frequency_floor: result.steady_state_frequency_floor,
            regulation_enabled: params.regulation_enabled,
            nadir: NadirFeature::from_series(&result.time, &result.frequency),
            rocof_hz_per_s: initial_rocof(params),
            blackout,
            blackout_span,
            lag_span: params
                .regulation_lag_enabled
                .then_some((0.0, params.regulation_time_constant_s)),
            load_profile: result.time.iter().map(|&t| params.load_excess(t)).collect(),
        }
    }

    /// Value on the RoCoF trend line at time `t`.
    pub fn rocof_line(&self, t: f64) -> f64 {
        F0_HZ + self.rocof_hz_per_s * t
    }

    pub fn rocof_label(&self) -> String {
        format!("RoCoF {:.0} mHz/s", self.rocof_hz_per_s * 1000.0)
    }

    /// Label of the floor marker, `None` when FCR is disabled.
    pub fn floor_label(&self) -> Option<String> {
        self.regulation_enabled
            .then(|| format!("f final {:.2} Hz", self.steady_state_frequency_floor))
    }
}

/// Initial rate of change of frequency right after the step (Hz/s).
pub fn initial_rocof(params: &SimulationParameters) -> f64 {
    -F0_HZ / (2.0 * params.inertia_constant_s) * params.load_step_pu
}

/// Title of the frequency panel.
pub fn frequency_title(params: &SimulationParameters) -> String {
    let fcr = if params.regulation_enabled {
        " with FCR"
    } else {
        " *without* FCR"
    };
    format!(
        "Frequency response (H={:.0} s){fcr}",
        params.inertia_constant().get::<second>()
    )
}

/// Title of the FCR power panel.
pub fn power_title(params: &SimulationParameters) -> String {
    let mut title = String::from("FCR power response");
    if params.regulation_enabled {
        title.push_str(&format!(
            " (s={:.0}%)",
            params.droop_ratio().get::<percent>()
        ));
        if params.regulation_lag_enabled {
            title.push_str(&format!(
                " with lag τ={:.1} s",
                params.regulation_time_constant().get::<second>()
            ));
        }
    } else {
        title.push_str(" (inactive)");
    }
    title
}
