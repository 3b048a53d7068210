//! Read/write fit JSON files.
//!
//! The JSON file is the portable representation of a run:
//! - both fitted curves (parameters + diagnostics)
//! - the bounds they were fitted under and the reference table
//! - the sampled grid for quick re-plotting elsewhere
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::data::REFERENCE_POINTS;
use crate::domain::{CurveEntry, CurveFile, CurveGrid, CurveSample, FitPair, ParamBounds, Series};
use crate::error::AppError;

/// Assemble the export document for a run.
pub fn build_curve_file(fits: &FitPair, samples: &[CurveSample], bounds: ParamBounds) -> CurveFile {
    let curves = Series::ALL
        .iter()
        .map(|&series| {
            let grid = samples
                .iter()
                .find(|s| s.series == series)
                .map(|s| CurveGrid {
                    height_m: s.heights().collect(),
                    probability: s.probabilities().collect(),
                })
                .unwrap_or(CurveGrid {
                    height_m: Vec::new(),
                    probability: Vec::new(),
                });
            CurveEntry {
                fit: fits.get(series).clone(),
                grid,
            }
        })
        .collect();

    CurveFile {
        tool: env!("CARGO_PKG_NAME").to_string(),
        generated_at: Utc::now(),
        bounds,
        reference: REFERENCE_POINTS.to_vec(),
        curves,
    }
}

/// Write a fit JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create curve JSON '{}': {e}", path.display()))
    })?;

    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::io(format!("Failed to write curve JSON: {e}")))?;

    info!(path = %path.display(), "wrote curve JSON");
    Ok(())
}

/// Read a fit JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile = serde_json::from_reader(file)
        .map_err(|e| AppError::input(format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}
