//! Dense evaluation of fitted curves for plotting and export.

use crate::domain::{CurveSample, GRID_END, GRID_POINTS, GRID_START, LogisticParams, Series};
use crate::error::AppError;
use crate::fit::grid::linspace;
use crate::models::predict;

/// Evaluate `params` at every height in `grid`.
pub fn sample_on(series: Series, params: &LogisticParams, grid: &[f64]) -> CurveSample {
    CurveSample {
        series,
        points: grid.iter().map(|&h| (h, predict(params, h))).collect(),
    }
}

/// Evaluate `params` on the standard plotting grid (0–30 m, 601 points).
pub fn sample_curve(series: Series, params: &LogisticParams) -> Result<CurveSample, AppError> {
    let grid = linspace(GRID_START, GRID_END, GRID_POINTS)?;
    Ok(sample_on(series, params, &grid))
}
