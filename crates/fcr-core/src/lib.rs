//! fcr-core: shared foundation for the frequency-response simulator.
//!
//! Contains:
//! - units (uom SI types + constructors, grid constants)
//! - numeric (Real + tolerances + float helpers)
//! - params (simulation parameter set and load-step options)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod params;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use params::{LoadStepDuration, SimulationParameters, SimulationWindow};
pub use units::constants::{BASE_POWER_PU, BLACKOUT_THRESHOLD_HZ, F0_HZ, OMEGA0_RAD_PER_S};
