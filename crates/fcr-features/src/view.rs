//! Axis ranges for plotting a run.

use fcr_core::{F0_HZ, SimulationParameters, SimulationWindow};
use fcr_sim::SimulationResult;
use serde::{Deserialize, Serialize};

/// Relative margin added around the data on each axis.
const MARGIN: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRanges {
    pub time: AxisRange,
    pub frequency: AxisRange,
    /// Only set when a power limit is given
    pub power: Option<AxisRange>,
}

impl DisplayRanges {
    /// Axis ranges for one run.
    ///
    /// The frequency axis starts at `f_min` (or the trajectory minimum) and
    /// ends at f0 for a consumption excess; for a generation excess it is
    /// mirrored above f0 to show the overspeed.
    pub fn compute(
        params: &SimulationParameters,
        result: &SimulationResult,
        window: &SimulationWindow,
        f_min: Option<f64>,
        p_max: Option<f64>,
    ) -> Self {
        let f_min = f_min.unwrap_or_else(|| trajectory_min(&result.frequency));
        let f_max = if params.load_step_pu >= 0.0 {
            F0_HZ
        } else {
            F0_HZ + (F0_HZ - f_min)
        };
        let delta_f = (F0_HZ - f_min) * MARGIN;

        let power = p_max.map(|p_max| {
            let delta_p = p_max * MARGIN;
            let p_min = if params.load_step_pu >= 0.0 { 0.0 } else { -p_max };
            AxisRange {
                min: p_min - delta_p,
                max: p_max + delta_p,
            }
        });

        Self {
            time: AxisRange {
                min: window.t_ini,
                max: window.t_fin,
            },
            frequency: AxisRange {
                min: f_min - delta_f,
                max: f_max + delta_f,
            },
            power,
        }
    }

    pub fn from_preset(
        preset: ViewPreset,
        params: &SimulationParameters,
        result: &SimulationResult,
        window: &SimulationWindow,
    ) -> Self {
        Self::compute(
            params,
            result,
            window,
            Some(preset.f_min_hz()),
            Some(ViewPreset::P_MAX_PU),
        )
    }
}

fn trajectory_min(frequency: &[f64]) -> f64 {
    let min = frequency.iter().copied().fold(f64::INFINITY, f64::min);
    if min.is_finite() { min } else { F0_HZ }
}

/// The two frequency views of the interactive explorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPreset {
    /// Full 0 Hz to f0 range, blackouts visible
    #[default]
    Full,
    /// Zoom on the 49 Hz to f0 band
    Zoom,
}

impl ViewPreset {
    pub const P_MAX_PU: f64 = 0.14;

    pub fn from_zoom(zoom: bool) -> Self {
        if zoom { ViewPreset::Zoom } else { ViewPreset::Full }
    }

    pub fn f_min_hz(self) -> f64 {
        match self {
            ViewPreset::Full => 0.0,
            ViewPreset::Zoom => 49.0,
        }
    }
}
