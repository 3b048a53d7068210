//! Height grid generation.

use crate::error::AppError;

/// Generate `steps` evenly spaced points between `start` and `end` (inclusive).
///
/// The last point is set to `end` exactly so accumulated rounding never pushes
/// the grid past the plotted range.
pub fn linspace(start: f64, end: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(start.is_finite() && end.is_finite() && end > start) {
        return Err(AppError::input(format!(
            "Invalid grid range: start={start}, end={end} (must be finite and end>start)."
        )));
    }
    if steps < 2 {
        return Err(AppError::input("Grid steps must be >= 2."));
    }

    let step = (end - start) / (steps as f64 - 1.0);
    let mut out: Vec<f64> = (0..steps).map(|i| start + step * i as f64).collect();
    out[steps - 1] = end;
    Ok(out)
}
