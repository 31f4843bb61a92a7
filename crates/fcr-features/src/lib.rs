//! fcr-features: quantities derived from a finished frequency-response run.
//!
//! Nothing here integrates or renders. The functions take a
//! [`fcr_sim::SimulationResult`] and the parameters that produced it and
//! return the values a plot or report needs: the nadir, the steady-state
//! floor, the initial RoCoF slope, the blackout flag and axis ranges.

pub mod annotations;
pub mod nadir;
pub mod view;

pub use annotations::{Annotations, frequency_title, initial_rocof, is_blackout, power_title};
pub use nadir::{NADIR_RECOVERY_MARGIN_HZ, NadirFeature, find_nadir, find_nadir_index};
pub use view::{AxisRange, DisplayRanges, ViewPreset};
