//! Nadir detection on a frequency trajectory.

use serde::{Deserialize, Serialize};

/// How far (Hz) the final sample must sit above the minimum for the minimum
/// to count as a dip rather than a monotone tail.
pub const NADIR_RECOVERY_MARGIN_HZ: f64 = 0.001;

/// Lowest point of a transient dip that the trajectory recovers from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NadirFeature {
    /// Sample index into the run's series
    pub index: usize,
    /// Time of the nadir (s)
    pub time: f64,
    /// Frequency at the nadir (Hz)
    pub frequency: f64,
}

impl NadirFeature {
    /// Nadir of `frequency`, with its time looked up in the aligned `time` series.
    ///
    /// Returns `None` when there is no nadir or when `time` is too short to
    /// hold the nadir's index.
    pub fn from_series(time: &[f64], frequency: &[f64]) -> Option<Self> {
        let (index, value) = find_nadir(frequency)?;
        let t = *time.get(index)?;
        Some(Self {
            index,
            time: t,
            frequency: value,
        })
    }
}

/// Index and value of the nadir, if the trajectory has one.
///
/// The global minimum (first occurrence) is a nadir only when it lies
/// strictly inside the series and the final sample is at least
/// [`NADIR_RECOVERY_MARGIN_HZ`] above it.
pub fn find_nadir(frequency: &[f64]) -> Option<(usize, f64)> {
    let (index, &min) = frequency
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let last_index = frequency.len() - 1;
    let last = frequency[last_index];

    let interior = index > 0 && index < last_index;
    if interior && min <= last - NADIR_RECOVERY_MARGIN_HZ {
        Some((index, min))
    } else {
        None
    }
}

/// Like [`find_nadir`], index only.
pub fn find_nadir_index(frequency: &[f64]) -> Option<usize> {
    find_nadir(frequency).map(|(i, _)| i)
}
