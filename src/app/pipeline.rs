//! Shared "fit pipeline" logic used by the CLI and the terminal preview.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! reference data -> bounded fit (per series) -> sampled curves
//!
//! Front-ends can then focus on presentation (PNG, terminal, stdout).

use tracing::debug;

use crate::domain::{CurveSample, FitPair, RunConfig, Series};
use crate::error::AppError;
use crate::fit::{FitOptions, fit_reference};
use crate::models::sample_curve;

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub fits: FitPair,
    /// Sampled curves, serious injury first.
    pub samples: Vec<CurveSample>,
}

impl RunOutput {
    pub fn sample(&self, series: Series) -> Option<&CurveSample> {
        self.samples.iter().find(|s| s.series == series)
    }
}

/// Optimizer options for a run configuration.
pub fn fit_options(config: &RunConfig) -> FitOptions {
    FitOptions::with_max_evals(config.max_evals)
}

/// Execute the fitting pipeline and return the computed outputs.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    // 1) Fit both series independently.
    let fits = fit_reference(&fit_options(config))?;

    // 2) Sample the fitted curves for plotting.
    let samples = Series::ALL
        .iter()
        .map(|&series| sample_curve(series, &fits.get(series).params))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(points = samples[0].points.len(), "sampled fitted curves");

    Ok(RunOutput { fits, samples })
}
