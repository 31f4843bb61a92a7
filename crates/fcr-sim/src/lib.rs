//! Transient simulation of grid frequency after a load step.
//!
//! Provides:
//! - Swing-equation dynamics with proportional (droop) FCR, with or without
//!   a first-order actuation lag
//! - Adaptive implicit TR-BDF2 integrator with terminal events
//! - Frequency-response simulator producing aligned time/frequency/power series
//! - Parallel parameter sweeps

pub mod actuator;
pub mod error;
pub mod integrator;
pub mod model;
pub mod response;
pub mod sim;
pub mod sweep;

// Re-exports for public API
pub use actuator::FirstOrderLag;
pub use error::{SimError, SimResult};
pub use integrator::{Integrator, StepOutcome, TrBdf2};
pub use model::{DroopDynamics, DynamicsModel, LaggedDroopDynamics, SwingEquation, TransientModel};
pub use response::{SimulationResult, simulate, simulate_with, steady_state};
pub use sim::{SimOptions, SimRecord, SolverStats, run_sim};
pub use sweep::{SweepDefinition, SweepParameter, SweepPoint, SweepType, run_sweep};
