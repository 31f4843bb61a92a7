//! Features extracted from full simulation runs.

use fcr_core::{LoadStepDuration, SimulationParameters, SimulationWindow};
use fcr_features::{Annotations, DisplayRanges, NadirFeature, ViewPreset, find_nadir};
use fcr_sim::simulate;

fn regulated(lag: bool) -> SimulationParameters {
    SimulationParameters {
        load_step_pu: 0.1,
        inertia_constant_s: 1.0,
        droop: 0.10,
        regulation_time_constant_s: 1.0,
        regulation_enabled: true,
        regulation_lag_enabled: lag,
        ..Default::default()
    }
}

#[test]
fn no_regulation_has_no_nadir_and_blacks_out() {
    let params = SimulationParameters {
        load_step_pu: 0.2,
        inertia_constant_s: 0.5,
        regulation_enabled: false,
        ..Default::default()
    };
    let window = SimulationWindow::default();
    let result = simulate(&params).unwrap();
    let ann = Annotations::from_run(&params, &result, &window);

    assert_eq!(ann.nadir, None);
    assert!(ann.blackout);
    assert_eq!(ann.blackout, result.terminated_by_blackout);
    let (start, end) = ann.blackout_span.unwrap();
    assert!(start < end && end == window.t_fin);
    assert!((ann.rocof_hz_per_s + 10.0).abs() < 1e-12);
}

#[test]
fn droop_without_lag_declines_monotonically_without_nadir() {
    let params = regulated(false);
    let result = simulate(&params).unwrap();
    assert_eq!(find_nadir(&result.frequency), None);

    let ann = Annotations::from_run(&params, &result, &SimulationWindow::default());
    assert!(!ann.blackout);
    assert_eq!(ann.floor_label().as_deref(), Some("f final 49.50 Hz"));
}

#[test]
fn lagged_droop_has_nadir_below_floor() {
    let params = regulated(true);
    let result = simulate(&params).unwrap();
    let nadir = NadirFeature::from_series(&result.time, &result.frequency).unwrap();

    assert!(nadir.frequency < result.steady_state_frequency_floor);
    assert!(nadir.time > 0.0 && nadir.time < 10.0);
    assert_eq!(result.frequency[nadir.index], nadir.frequency);

    let ann = Annotations::from_run(&params, &result, &SimulationWindow::default());
    assert_eq!(ann.nadir, Some(nadir));
    assert_eq!(ann.lag_span, Some((0.0, 1.0)));
}

#[test]
fn temporary_step_produces_nadir_before_recovery() {
    let window = SimulationWindow::default();
    let params = SimulationParameters {
        load_step_duration_s: LoadStepDuration::FourSeconds.resolve(&window),
        ..regulated(false)
    };
    let result = simulate(&params).unwrap();
    let nadir = NadirFeature::from_series(&result.time, &result.frequency).unwrap();

    assert!(nadir.time > 3.0 && nadir.time < 4.2, "nadir at {}", nadir.time);

    let ann = Annotations::from_run(&params, &result, &window);
    let after_step: Vec<f64> = result
        .time
        .iter()
        .zip(&ann.load_profile)
        .filter(|(t, _)| **t >= 4.0)
        .map(|(_, p)| *p)
        .collect();
    assert!(!after_step.is_empty());
    assert!(after_step.iter().all(|&p| p == 0.0));
}

#[test]
fn zoomed_view_brackets_the_trajectory() {
    let params = regulated(true);
    let window = SimulationWindow::default();
    let result = simulate(&params).unwrap();
    let ranges = DisplayRanges::from_preset(ViewPreset::Zoom, &params, &result, &window);

    assert!(result.frequency.iter().all(|&f| ranges.frequency.contains(f)));
    let power = ranges.power.unwrap();
    assert!(power.contains(0.0));
    assert!(power.contains(*result.regulation_power.last().unwrap()));
}

#[test]
fn annotations_serialize_to_json() {
    let params = regulated(true);
    let result = simulate(&params).unwrap();
    let ann = Annotations::from_run(&params, &result, &SimulationWindow::default());

    let json = serde_json::to_value(&ann).unwrap();
    assert!(json["nadir"]["frequency"].is_number());
    assert_eq!(json["blackout"], false);
}
