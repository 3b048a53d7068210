//! Dense least-squares helpers for the damped Gauss–Newton step.
//!
//! Each Levenberg–Marquardt trial step solves
//!
//! ```text
//! minimize ‖J δ + r‖² + λ ‖D δ‖²
//! ```
//!
//! which is the ordinary least-squares problem on the stacked system
//! `[J; √λ D] δ = [-r; 0]`. Solving the stacked system directly avoids forming
//! `JᵀJ`, which squares the condition number.
//!
//! - We solve with SVD so tall (more rows than columns) systems work.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The parameter dimension is 3, so SVD cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-14, 1e-10, 1e-6] {
        if let Ok(sol) = svd.solve(y, tol) {
            if sol.iter().all(|v| v.is_finite()) {
                return Some(sol);
            }
        }
    }

    None
}

/// Solve the Levenberg–Marquardt subproblem for a step `δ`.
///
/// `scale` holds the diagonal of `D` (one entry per column of `jac`).
pub fn damped_step(
    jac: &DMatrix<f64>,
    residuals: &DVector<f64>,
    lambda: f64,
    scale: &[f64],
) -> Option<DVector<f64>> {
    let n = jac.nrows();
    let p = jac.ncols();
    debug_assert_eq!(scale.len(), p);

    let mut a = DMatrix::<f64>::zeros(n + p, p);
    let mut b = DVector::<f64>::zeros(n + p);

    a.rows_mut(0, n).copy_from(jac);
    for i in 0..n {
        b[i] = -residuals[i];
    }

    let root = lambda.max(0.0).sqrt();
    for j in 0..p {
        a[(n + j, j)] = root * scale[j];
    }

    solve_least_squares(&a, &b)
}

/// Parameter covariance estimate `s² (JᵀJ)⁻¹` with `s² = SSE / (n - p)`.
///
/// Returns `None` with no spare degrees of freedom or a singular `JᵀJ`.
pub fn covariance(jac: &DMatrix<f64>, sse: f64) -> Option<DMatrix<f64>> {
    let n = jac.nrows();
    let p = jac.ncols();
    if n <= p || !sse.is_finite() {
        return None;
    }

    let jtj = jac.transpose() * jac;
    let inv = jtj.try_inverse()?;
    let s2 = sse / (n - p) as f64;
    let cov = inv * s2;

    if cov.iter().all(|v| v.is_finite()) {
        Some(cov)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn zero_damping_is_a_gauss_newton_step() {
        // Linear residual r(p) = X p - y evaluated at p = 0 gives r = -y;
        // the undamped step lands on the OLS solution.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[-2.0, -5.0, -8.0]);

        let step = damped_step(&x, &r, 0.0, &[1.0, 1.0]).unwrap();
        assert!((step[0] - 2.0).abs() < 1e-10);
        assert!((step[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn heavy_damping_shrinks_the_step() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[-2.0, -5.0, -8.0]);

        let free = damped_step(&x, &r, 0.0, &[1.0, 1.0]).unwrap();
        let damped = damped_step(&x, &r, 1e6, &[1.0, 1.0]).unwrap();
        assert!(damped.norm() < free.norm() * 1e-3);
    }

    #[test]
    fn covariance_needs_spare_degrees_of_freedom() {
        let square = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        assert!(covariance(&square, 1.0).is_none());

        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let cov = covariance(&x, 2.0).unwrap();
        assert!(cov[(0, 0)] > 0.0 && cov[(1, 1)] > 0.0);
    }
}
