// fcr-core/src/units.rs

use uom::si::f64::{Ratio as UomRatio, Time as UomTime};

// Public canonical unit types (SI, f64)
pub type Ratio = UomRatio;
pub type Time = UomTime;

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

pub mod constants {
    /// Nominal grid frequency.
    pub const F0_HZ: f64 = 50.0;

    /// Nominal angular frequency, 2π·f0.
    pub const OMEGA0_RAD_PER_S: f64 = 2.0 * std::f64::consts::PI * F0_HZ;

    /// Rated power of the aggregated generation; powers are expressed in per-unit of it.
    pub const BASE_POWER_PU: f64 = 1.0;

    /// Frequencies below this are treated as a collapsed grid (blackout).
    pub const BLACKOUT_THRESHOLD_HZ: f64 = F0_HZ * 1e-3;
}
