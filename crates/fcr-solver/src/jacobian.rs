//! Finite difference Jacobian computation.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};

/// Forward-difference Jacobian of `f` at `x`.
///
/// Column `j` is `(f(x + dx_j e_j) - f(x)) / dx_j` with
/// `dx_j = epsilon * max(|x_j|, 1)`. `f_x` is the already-evaluated `f(x)`.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    if epsilon <= 0.0 {
        return Err(SolverError::Numeric {
            what: format!("finite difference epsilon must be positive, got {epsilon}"),
        });
    }

    let mut jac = DMatrix::zeros(f_x.len(), x.len());
    for j in 0..x.len() {
        let dx = epsilon * x[j].abs().max(1.0);
        let mut shifted = x.clone();
        shifted[j] += dx;

        let column = (f(&shifted)? - f_x) / dx;
        jac.set_column(j, &column);
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_of_linear_map_is_its_matrix() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, -1.0, 0.5, 3.0]);
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> { Ok(&a * x) };

        let x = DVector::from_vec(vec![1.0, -2.0]);
        let fx = f(&x).unwrap();
        let jac = finite_difference_jacobian(&x, &fx, f, 1e-7).unwrap();

        for i in 0..2 {
            for j in 0..2 {
                assert!((jac[(i, j)] - a[(i, j)]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn jacobian_of_reciprocal() {
        // d/dx (1/x) = -1/x^2
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, 1.0 / x[0]))
        };
        let x = DVector::from_element(1, 50.0);
        let fx = f(&x).unwrap();
        let jac = finite_difference_jacobian(&x, &fx, f, 1e-8).unwrap();
        assert!((jac[(0, 0)] + 1.0 / 2500.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_positive_epsilon() {
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> { Ok(x.clone()) };
        let x = DVector::from_element(1, 1.0);
        assert!(finite_difference_jacobian(&x, &x, f, 0.0).is_err());
    }
}
