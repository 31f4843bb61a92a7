//! CSV and JSON renderings of a run.

use fcr_core::{SimulationParameters, SimulationWindow};
use fcr_features::{Annotations, DisplayRanges};
use fcr_sim::{SimulationResult, SolverStats};
use serde::Serialize;

pub const CSV_HEADER: &str = "time_s,frequency_hz,regulation_power_pu,load_pu";

/// One row per sample: time, frequency, FCR power and load excess.
pub fn to_csv(result: &SimulationResult, annotations: &Annotations) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for i in 0..result.len() {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            result.time[i], result.frequency[i], result.regulation_power[i], annotations.load_profile[i]
        ));
    }
    csv
}

/// Everything derived from a run except the sample series.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub parameters: &'a SimulationParameters,
    pub window: SimulationWindow,
    pub samples: usize,
    pub droop_gain: f64,
    pub final_frequency_hz: Option<f64>,
    pub min_frequency_hz: Option<f64>,
    pub annotations: AnnotationSummary<'a>,
    pub display_ranges: DisplayRanges,
    pub stats: &'a SolverStats,
}

/// [`Annotations`] without the per-sample load profile.
#[derive(Debug, Serialize)]
pub struct AnnotationSummary<'a> {
    pub steady_state_frequency_floor: f64,
    pub nadir: &'a Option<fcr_features::NadirFeature>,
    pub rocof_hz_per_s: f64,
    pub blackout: bool,
    pub blackout_span: Option<(f64, f64)>,
    pub lag_span: Option<(f64, f64)>,
}

impl<'a> RunSummary<'a> {
    pub fn new(
        parameters: &'a SimulationParameters,
        window: SimulationWindow,
        result: &'a SimulationResult,
        annotations: &'a Annotations,
        display_ranges: DisplayRanges,
    ) -> Self {
        let min_frequency_hz = result.frequency.iter().copied().reduce(f64::min);
        Self {
            parameters,
            window,
            samples: result.len(),
            droop_gain: result.droop_gain,
            final_frequency_hz: result.final_frequency(),
            min_frequency_hz,
            annotations: AnnotationSummary {
                steady_state_frequency_floor: annotations.steady_state_frequency_floor,
                nadir: &annotations.nadir,
                rocof_hz_per_s: annotations.rocof_hz_per_s,
                blackout: annotations.blackout,
                blackout_span: annotations.blackout_span,
                lag_span: annotations.lag_span,
            },
            display_ranges,
            stats: &result.stats,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
