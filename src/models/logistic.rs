//! Logistic model evaluation.
//!
//! The fitter relies on two primitive operations:
//! - predict `f(h)` for given parameters (residuals, sampling, plots)
//! - the analytic Jacobian row `∂f/∂(L, x0, k)` at a height (for the damped solve)
//!
//! With `s = σ(k (h - x0))` and `σ(z) = 1 / (1 + e^{-z})`:
//!
//! - `∂f/∂L  = s`
//! - `∂f/∂x0 = -L k s (1 - s)`
//! - `∂f/∂k  =  L (h - x0) s (1 - s)`

use crate::domain::LogisticParams;

/// Numerically stable logistic sigmoid.
///
/// Never evaluates `exp` of a large positive argument, so it stays finite for
/// any finite `z`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

/// Evaluate `L / (1 + exp(-k (h - x0)))`.
pub fn predict(params: &LogisticParams, h: f64) -> f64 {
    params.l * sigmoid(params.k * (h - params.x0))
}

/// Partial derivatives of `predict` with respect to `(L, x0, k)`.
pub fn jacobian_row(params: &LogisticParams, h: f64) -> [f64; 3] {
    let dx = h - params.x0;
    let s = sigmoid(params.k * dx);
    let ds = s * (1.0 - s);
    [s, -params.l * params.k * ds, params.l * dx * ds]
}
