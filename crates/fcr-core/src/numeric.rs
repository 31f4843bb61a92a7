use crate::CoreError;

/// Floating point type used throughout the simulator
pub type Real = f64;

/// Absolute and relative tolerance pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Tolerances {
    /// Error weight for one component: `abs + rel * max(|a|, |b|)`.
    pub fn scale(&self, a: Real, b: Real) -> Real {
        self.abs + self.rel * a.abs().max(b.abs())
    }
}

impl Default for Tolerances {
    /// Integration tolerances of a single frequency-response run.
    fn default() -> Self {
        Self {
            abs: 1e-6,
            rel: 1e-4,
        }
    }
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Root-mean-square of `err[i] / scale[i]`.
///
/// Returns 0 for empty input.
pub fn weighted_rms(err: impl IntoIterator<Item = (Real, Real)>) -> Real {
    let (sum, n) = err
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), (e, w)| (sum + (e / w).powi(2), n + 1));
    if n == 0 { 0.0 } else { (sum / n as Real).sqrt() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn tolerance_scale_uses_larger_magnitude() {
        let tol = Tolerances::default();
        let w = tol.scale(50.0, -49.0);
        assert!((w - (1e-6 + 1e-4 * 50.0)).abs() < 1e-15);
    }

    #[test]
    fn weighted_rms_of_unit_ratios() {
        let rms = weighted_rms([(2.0, 2.0), (-3.0, 3.0)]);
        assert!((rms - 1.0).abs() < 1e-12);
        assert_eq!(weighted_rms(std::iter::empty()), 0.0);
    }
}
