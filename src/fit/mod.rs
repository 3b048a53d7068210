//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - build evenly spaced height grids (`grid`)
//! - fit one logistic series with bounded least squares (`fitter`)
//! - fit both reference series independently, one attempt each

pub mod fitter;
pub mod grid;

pub use fitter::*;
pub use grid::*;

use crate::data;
use crate::domain::{FitPair, LogisticFit, Series};
use crate::error::AppError;

/// Fit one series of the reference table from its configured initial guess.
pub fn fit_series(series: Series, opts: &FitOptions) -> Result<LogisticFit, AppError> {
    let heights = data::heights();
    let observed = data::probabilities(series);
    fit_logistic(series, &heights, &observed, series.initial_guess(), opts)
}

/// Fit the serious-injury and death curves.
pub fn fit_reference(opts: &FitOptions) -> Result<FitPair, AppError> {
    Ok(FitPair {
        serious: fit_series(Series::SeriousInjury, opts)?,
        death: fit_series(Series::Death, opts)?,
    })
}
