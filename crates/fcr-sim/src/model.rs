//! Swing-equation dynamics of a single-area grid with droop FCR.

use std::f64::consts::PI;

use fcr_core::{BASE_POWER_PU, F0_HZ, OMEGA0_RAD_PER_S, SimulationParameters};
use nalgebra::{SVector, Vector1, Vector2};

use crate::actuator::FirstOrderLag;
use crate::error::{SimError, SimResult};

/// Trait for transient (dynamic) system models with an `N`-dimensional state.
pub trait TransientModel<const N: usize> {
    /// State at the start of the simulation window.
    fn initial_state(&self) -> SVector<f64, N>;

    /// Compute state derivative dx/dt = f(t, x).
    fn rhs(&self, t: f64, x: &SVector<f64, N>) -> SimResult<SVector<f64, N>>;
}

/// Constants shared by both dynamics variants, derived once per run.
#[derive(Clone, Debug, PartialEq)]
pub struct SwingEquation {
    /// Rotational inertia J = 2 H S / Ω0²
    rotational_inertia: f64,
    /// Droop gain K (pu/Hz); 0 when regulation is disabled
    droop_gain: f64,
    steady_state_floor_hz: f64,
    params: SimulationParameters,
}

impl SwingEquation {
    pub fn new(params: &SimulationParameters) -> Self {
        let (droop_gain, steady_state_floor_hz) = if params.regulation_enabled {
            let k = BASE_POWER_PU / (F0_HZ * params.droop);
            (k, F0_HZ - params.load_step_pu / k)
        } else {
            // No containment at all: any sustained imbalance collapses the grid.
            (0.0, 0.0)
        };

        Self {
            rotational_inertia: 2.0 * params.inertia_constant_s * BASE_POWER_PU
                / (OMEGA0_RAD_PER_S * OMEGA0_RAD_PER_S),
            droop_gain,
            steady_state_floor_hz,
            params: params.clone(),
        }
    }

    pub fn droop_gain(&self) -> f64 {
        self.droop_gain
    }

    /// Frequency FCR alone would hold indefinitely; 0 Hz (blackout) without FCR.
    pub fn steady_state_floor_hz(&self) -> f64 {
        self.steady_state_floor_hz
    }

    /// Proportional droop response `-K (f - f0)`.
    pub fn droop_power(&self, frequency: f64) -> f64 {
        -self.droop_gain * (frequency - F0_HZ)
    }

    /// df/dt from the swing equation given the mechanical power supplied by FCR.
    ///
    /// The equation divides by ω, so only positive frequencies are physical.
    pub fn frequency_derivative(&self, t: f64, frequency: f64, regulation_power: f64) -> SimResult<f64> {
        if frequency.is_nan() || frequency <= 0.0 {
            return Err(SimError::NonPhysical {
                t,
                what: "frequency is not positive",
            });
        }
        let omega = 2.0 * PI * frequency;
        let net_power = regulation_power - self.params.load_excess(t);
        let omega_dot = net_power / (self.rotational_inertia * omega);
        let f_dot = omega_dot / (2.0 * PI);

        if f_dot.is_finite() {
            Ok(f_dot)
        } else {
            Err(SimError::NonPhysical {
                t,
                what: "frequency derivative is not finite",
            })
        }
    }
}

/// FCR power follows the droop law instantaneously. State: `[f]`.
#[derive(Clone, Debug, PartialEq)]
pub struct DroopDynamics {
    pub swing: SwingEquation,
}

impl TransientModel<1> for DroopDynamics {
    fn initial_state(&self) -> Vector1<f64> {
        Vector1::new(F0_HZ)
    }

    fn rhs(&self, t: f64, x: &Vector1<f64>) -> SimResult<Vector1<f64>> {
        let f = x[0];
        let p_fcr = self.swing.droop_power(f);
        Ok(Vector1::new(self.swing.frequency_derivative(t, f, p_fcr)?))
    }
}

/// FCR power tracks the droop target through a first-order lag. State: `[f, P_fcr]`.
#[derive(Clone, Debug, PartialEq)]
pub struct LaggedDroopDynamics {
    pub swing: SwingEquation,
    pub lag: FirstOrderLag,
}

impl TransientModel<2> for LaggedDroopDynamics {
    fn initial_state(&self) -> Vector2<f64> {
        Vector2::new(F0_HZ, 0.0)
    }

    fn rhs(&self, t: f64, x: &Vector2<f64>) -> SimResult<Vector2<f64>> {
        let (f, p_fcr) = (x[0], x[1]);
        let f_dot = self.swing.frequency_derivative(t, f, p_fcr)?;
        let p_dot = self.lag.derivative(p_fcr, self.swing.droop_power(f));
        Ok(Vector2::new(f_dot, p_dot))
    }
}

/// The dynamics variant of one run, chosen once from the lag flag.
#[derive(Clone, Debug, PartialEq)]
pub enum DynamicsModel {
    Droop(DroopDynamics),
    Lagged(LaggedDroopDynamics),
}

impl DynamicsModel {
    pub fn select(params: &SimulationParameters) -> SimResult<Self> {
        let swing = SwingEquation::new(params);
        if params.regulation_lag_enabled {
            Ok(DynamicsModel::Lagged(LaggedDroopDynamics {
                swing,
                lag: FirstOrderLag::new(params.regulation_time_constant_s)?,
            }))
        } else {
            Ok(DynamicsModel::Droop(DroopDynamics { swing }))
        }
    }

    pub fn swing(&self) -> &SwingEquation {
        match self {
            DynamicsModel::Droop(m) => &m.swing,
            DynamicsModel::Lagged(m) => &m.swing,
        }
    }

    pub fn state_dimension(&self) -> usize {
        match self {
            DynamicsModel::Droop(_) => 1,
            DynamicsModel::Lagged(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn gain_and_floor_with_regulation() {
        let swing = SwingEquation::new(&regulated(false));
        assert!((swing.droop_gain() - 0.2).abs() < 1e-12);
        assert!((swing.steady_state_floor_hz() - 49.5).abs() < 1e-12);
    }

    #[test]
    fn no_regulation_means_zero_gain_and_blackout_floor() {
        let swing = SwingEquation::new(&SimulationParameters::default());
        assert_eq!(swing.droop_gain(), 0.0);
        assert_eq!(swing.steady_state_floor_hz(), 0.0);
        assert_eq!(swing.droop_power(49.0), 0.0);
    }

    #[test]
    fn initial_rocof_matches_closed_form() {
        // At f = f0 right after the step: df/dt = -f0 / (2 H) * dP
        let model = DroopDynamics {
            swing: SwingEquation::new(&regulated(false)),
        };
        let dx = model.rhs(0.0, &model.initial_state()).unwrap();
        assert!((dx[0] - (-50.0 / 2.0 * 0.1)).abs() < 1e-9);
    }

    #[test]
    fn grid_at_rest_before_the_event() {
        let model = DroopDynamics {
            swing: SwingEquation::new(&regulated(false)),
        };
        let dx = model.rhs(-0.5, &model.initial_state()).unwrap();
        assert_eq!(dx[0], 0.0);
    }

    #[test]
    fn lagged_power_relaxes_toward_droop_target() {
        let model = match DynamicsModel::select(&regulated(true)).unwrap() {
            DynamicsModel::Lagged(m) => m,
            other => panic!("expected lagged variant, got {other:?}"),
        };
        assert_eq!(model.initial_state(), Vector2::new(50.0, 0.0));

        // f = 49.9 Hz => target = 0.2 * 0.1 = 0.02 pu, tau = 1 s
        let dx = model.rhs(1.0, &Vector2::new(49.9, 0.0)).unwrap();
        assert!((dx[1] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn variant_follows_lag_flag() {
        let droop = DynamicsModel::select(&regulated(false)).unwrap();
        let lagged = DynamicsModel::select(&regulated(true)).unwrap();
        assert_eq!(droop.state_dimension(), 1);
        assert_eq!(lagged.state_dimension(), 2);
    }

    #[test]
    fn zero_frequency_is_non_physical() {
        let swing = SwingEquation::new(&SimulationParameters::default());
        let err = swing.frequency_derivative(1.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, SimError::NonPhysical { .. }));
    }

    #[test]
    fn negative_frequency_is_non_physical() {
        // Regulated with a 0 Hz floor: the droop power still leaves a deficit.
        let params = SimulationParameters {
            load_step_pu: 1.0,
            inertia_constant_s: 0.2,
            droop: 1.0,
            regulation_enabled: true,
            ..Default::default()
        };
        let model = DroopDynamics {
            swing: SwingEquation::new(&params),
        };
        assert!(model.rhs(0.5, &Vector1::new(1e-3)).is_ok());
        for f in [-1e-9, -9.776, f64::NAN] {
            let err = model.rhs(0.5, &Vector1::new(f)).unwrap_err();
            assert!(matches!(err, SimError::NonPhysical { .. }), "f = {f}");
        }
    }

    #[test]
    fn load_excess_matches_parameters_at_step_boundaries() {
        let params = SimulationParameters {
            load_step_pu: 0.3,
            load_step_duration_s: 4.0,
            ..Default::default()
        };
        let model = DroopDynamics {
            swing: SwingEquation::new(&params),
        };
        for t in [-1e-9, 0.0, 2.0, 4.0 - 1e-9, 4.0, 9.0] {
            // Without FCR at f0: df/dt = -f0 / (2 H) * load_excess(t)
            let dx = model.rhs(t, &model.initial_state()).unwrap();
            let expected = -F0_HZ / 2.0 * params.load_excess(t);
            assert!((dx[0] - expected).abs() < 1e-9, "t = {t}");
        }
    }
}
