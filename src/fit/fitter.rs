//! Bounded nonlinear least squares for a single logistic series.
//!
//! Given:
//! - heights `h_i`
//! - observed probabilities `y_i`
//! - an initial guess and box bounds on `(L, x0, k)`
//!
//! we minimize `Σ (f(h_i) - y_i)²` with a projected Levenberg–Marquardt loop:
//!
//! - solve the damped subproblem `[J; √λ D] δ = [-r; 0]` (SVD)
//! - clamp `p + δ` onto the box; the objective is never evaluated outside it
//! - accept the trial point if the SSE drops (λ ÷ 10), otherwise retry (λ × 10)
//!
//! The loop is deterministic: identical inputs always produce identical
//! parameters. There is no convexity guarantee, so a different starting point
//! may land in a different local optimum.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

use crate::domain::{
    DEFAULT_MAX_EVALS, LogisticFit, LogisticParams, ParamBounds, Series, Termination,
};
use crate::error::AppError;
use crate::math::{covariance, damped_step};
use crate::models::{jacobian_row, predict};

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;
const LAMBDA_FACTOR: f64 = 10.0;

/// Lower bound on a column scale entry so flat directions still get damped.
const SCALE_FLOOR: f64 = 1e-6;

/// Optimizer settings.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub bounds: ParamBounds,
    /// Maximum number of objective evaluations (including the initial guess).
    pub max_evals: usize,
    /// Relative SSE reduction tolerance.
    pub ftol: f64,
    /// Relative step size tolerance.
    pub xtol: f64,
    /// Projected gradient tolerance (∞-norm).
    pub gtol: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            bounds: ParamBounds::DEFAULT,
            max_evals: DEFAULT_MAX_EVALS,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
        }
    }
}

impl FitOptions {
    pub fn with_max_evals(max_evals: usize) -> Self {
        Self {
            max_evals,
            ..Self::default()
        }
    }
}

/// Fit `L / (1 + exp(-k (h - x0)))` to one series.
pub fn fit_logistic(
    series: Series,
    heights: &[f64],
    observed: &[f64],
    initial: LogisticParams,
    opts: &FitOptions,
) -> Result<LogisticFit, AppError> {
    let name = series.display_name();

    if heights.is_empty() {
        return Err(AppError::input(format!("No reference points to fit for series '{name}'.")));
    }
    if heights.len() != observed.len() {
        return Err(AppError::input(format!(
            "Series '{name}': {} heights but {} observations.",
            heights.len(),
            observed.len()
        )));
    }
    if !opts.bounds.is_valid() {
        return Err(AppError::input(format!("Invalid parameter bounds: {:?}", opts.bounds)));
    }
    if opts.max_evals == 0 {
        return Err(AppError::input("Evaluation budget must be >= 1."));
    }
    if !opts.bounds.contains(&initial) {
        return Err(AppError::fit(format!(
            "Fit for series '{name}' failed: initial guess {:?} is outside the parameter bounds.",
            initial.to_array()
        )));
    }

    let n = heights.len();
    let mut p = initial.to_array();
    let mut r = residuals(&p, heights, observed);
    let mut sse = r.norm_squared();
    let mut evaluations = 1usize;
    if !sse.is_finite() {
        return Err(AppError::fit(format!(
            "Fit for series '{name}' failed: non-finite residuals at the initial guess."
        )));
    }

    let mut lambda = LAMBDA_INIT;
    let mut iterations = 0usize;

    let termination = 'outer: loop {
        iterations += 1;

        let jac = jacobian(&p, heights);
        let grad = jac.transpose() * &r;
        if projected_gradient_norm(&p, &grad, &opts.bounds) <= opts.gtol {
            break Termination::GradientTolerance;
        }

        let scale = column_scale(&jac);
        let p_norm = p.iter().map(|v| v * v).sum::<f64>().sqrt();

        loop {
            let Some(delta) = damped_step(&jac, &r, lambda, &scale) else {
                return Err(AppError::fit(format!(
                    "Fit for series '{name}' failed: damped step could not be solved \
                     (lambda={lambda:e})."
                )));
            };

            let trial = opts
                .bounds
                .clamp([p[0] + delta[0], p[1] + delta[1], p[2] + delta[2]]);
            let step_norm = trial
                .iter()
                .zip(p.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt();
            if step_norm <= opts.xtol * (opts.xtol + p_norm) {
                break 'outer Termination::StepTolerance;
            }

            if evaluations >= opts.max_evals {
                return Err(AppError::fit(format!(
                    "Fit for series '{name}' did not converge within {} function \
                     evaluations (sse={sse:.6e}).",
                    opts.max_evals
                )));
            }

            let r_trial = residuals(&trial, heights, observed);
            let sse_trial = r_trial.norm_squared();
            evaluations += 1;

            if sse_trial.is_finite() && sse_trial < sse {
                let converged = sse - sse_trial <= opts.ftol * sse;
                p = trial;
                r = r_trial;
                sse = sse_trial;
                lambda = (lambda / LAMBDA_FACTOR).max(LAMBDA_MIN);
                debug!(series = name, iterations, evaluations, sse, lambda, "accepted step");
                if converged {
                    break 'outer Termination::CostTolerance;
                }
                break;
            }

            lambda = (lambda * LAMBDA_FACTOR).min(LAMBDA_MAX);
        }
    };

    let params = LogisticParams::from_array(p);
    let std_errors = covariance(&jacobian(&p, heights), sse)
        .map(|cov| [cov[(0, 0)].sqrt(), cov[(1, 1)].sqrt(), cov[(2, 2)].sqrt()]);

    info!(
        series = name,
        l = params.l,
        x0 = params.x0,
        k = params.k,
        sse,
        evaluations,
        termination = termination.describe(),
        "fitted logistic curve"
    );

    Ok(LogisticFit {
        series,
        params,
        sse,
        rmse: (sse / n as f64).sqrt(),
        std_errors,
        evaluations,
        iterations,
        termination,
    })
}

fn residuals(p: &[f64; 3], heights: &[f64], observed: &[f64]) -> DVector<f64> {
    let params = LogisticParams::from_array(*p);
    DVector::from_iterator(
        heights.len(),
        heights
            .iter()
            .zip(observed.iter())
            .map(|(&h, &y)| predict(&params, h) - y),
    )
}

fn jacobian(p: &[f64; 3], heights: &[f64]) -> DMatrix<f64> {
    let params = LogisticParams::from_array(*p);
    let mut jac = DMatrix::<f64>::zeros(heights.len(), 3);
    for (i, &h) in heights.iter().enumerate() {
        let row = jacobian_row(&params, h);
        for j in 0..3 {
            jac[(i, j)] = row[j];
        }
    }
    jac
}

fn column_scale(jac: &DMatrix<f64>) -> [f64; 3] {
    let mut out = [SCALE_FLOOR; 3];
    for (j, v) in out.iter_mut().enumerate() {
        *v = jac.column(j).norm().max(SCALE_FLOOR);
    }
    out
}

/// ∞-norm of the gradient with components that would push out of the box removed.
fn projected_gradient_norm(p: &[f64; 3], grad: &DVector<f64>, bounds: &ParamBounds) -> f64 {
    let lo = bounds.lower.to_array();
    let hi = bounds.upper.to_array();
    let mut norm = 0.0_f64;
    for j in 0..3 {
        let g = grad[j];
        let blocked = (p[j] <= lo[j] && g > 0.0) || (p[j] >= hi[j] && g < 0.0);
        if !blocked {
            norm = norm.max(g.abs());
        }
    }
    norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EXIT_FIT, EXIT_INPUT};

    fn synthetic(params: LogisticParams, heights: &[f64]) -> Vec<f64> {
        heights.iter().map(|&h| predict(&params, h)).collect()
    }

    #[test]
    fn recovers_parameters_from_exact_data() {
        let truth = LogisticParams::new(0.9, 10.0, 0.4);
        let heights: Vec<f64> = (0..16).map(|i| 0.5 + i as f64 * 1.5).collect();
        let y = synthetic(truth, &heights);

        let fit = fit_logistic(
            Series::SeriousInjury,
            &heights,
            &y,
            LogisticParams::new(1.0, 8.0, 0.5),
            &FitOptions::default(),
        )
        .unwrap();

        assert!((fit.params.l - 0.9).abs() < 1e-5, "{:?}", fit.params);
        assert!((fit.params.x0 - 10.0).abs() < 1e-4, "{:?}", fit.params);
        assert!((fit.params.k - 0.4).abs() < 1e-5, "{:?}", fit.params);
        assert!(fit.sse < 1e-12);
        assert!(fit.evaluations <= DEFAULT_MAX_EVALS);
    }

    #[test]
    fn asymptote_is_held_at_its_upper_bound() {
        // Data from a curve that saturates at 1.4; L may not exceed 1.0.
        let heights: Vec<f64> = (0..21).map(|i| i as f64).collect();
        let y = synthetic(LogisticParams::new(1.4, 5.0, 1.0), &heights);

        let opts = FitOptions::default();
        let fit = fit_logistic(
            Series::Death,
            &heights,
            &y,
            LogisticParams::new(1.0, 8.0, 0.5),
            &opts,
        )
        .unwrap();

        assert!(opts.bounds.contains(&fit.params), "{:?}", fit.params);
        assert!(fit.params.l > 0.95, "{:?}", fit.params);
    }

    #[test]
    fn infeasible_initial_guess_is_fatal() {
        let heights = [1.0, 2.0, 3.0, 4.0];
        let y = [0.1, 0.2, 0.3, 0.4];

        let err = fit_logistic(
            Series::Death,
            &heights,
            &y,
            LogisticParams::new(1.5, 8.0, 0.5),
            &FitOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), EXIT_FIT);
        assert!(err.message().contains("death"), "{err}");
        assert!(err.message().contains("outside the parameter bounds"), "{err}");
    }

    #[test]
    fn exhausted_budget_names_the_series() {
        let heights = crate::data::heights();
        let y = crate::data::probabilities(Series::Death);

        let err = fit_logistic(
            Series::Death,
            &heights,
            &y,
            Series::Death.initial_guess(),
            &FitOptions::with_max_evals(3),
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), EXIT_FIT);
        assert!(err.message().contains("'death'"), "{err}");
        assert!(err.message().contains("3 function evaluations"), "{err}");
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let err = fit_logistic(
            Series::SeriousInjury,
            &[1.0, 2.0],
            &[0.1],
            Series::SeriousInjury.initial_guess(),
            &FitOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
    }

    #[test]
    fn projected_gradient_ignores_blocked_components() {
        let bounds = ParamBounds::DEFAULT;
        // L at its upper bound with a gradient asking to increase it.
        let p = [1.0, 8.0, 0.5];
        let grad = DVector::from_row_slice(&[-3.0, 0.0, 1e-3]);
        assert!((projected_gradient_norm(&p, &grad, &bounds) - 1e-3).abs() < 1e-15);
    }
}
