//! Reporting utilities: per-point residuals and formatted terminal output.

pub mod format;

pub use format::*;

use crate::data::REFERENCE_POINTS;
use crate::domain::LogisticFit;
use crate::error::AppError;
use crate::models::predict;

/// Fitted value and residual at one reference height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointResidual {
    pub height: f64,
    pub observed: f64,
    pub fitted: f64,
    pub residual: f64,
}

/// Compute fitted values and residuals at each reference point.
pub fn compute_residuals(fit: &LogisticFit) -> Result<Vec<PointResidual>, AppError> {
    let mut out = Vec::with_capacity(REFERENCE_POINTS.len());
    for p in &REFERENCE_POINTS {
        let observed = p.probability(fit.series);
        let fitted = predict(&fit.params, p.height);
        if !fitted.is_finite() {
            return Err(AppError::fit(format!(
                "Non-finite prediction for series '{}' at height {}.",
                fit.series.display_name(),
                p.height
            )));
        }
        out.push(PointResidual {
            height: p.height,
            observed,
            fitted,
            residual: observed - fitted,
        });
    }
    Ok(out)
}
