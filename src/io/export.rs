//! Export the sampled curves to CSV.
//!
//! One row per grid height, meant to be easy to consume in spreadsheets or
//! downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::domain::{CurveSample, Series};
use crate::error::AppError;

/// Write `height_m,p_serious,p_death` rows for the sampled grid.
pub fn write_samples_csv(path: &Path, samples: &[CurveSample]) -> Result<(), AppError> {
    let find = |series: Series| {
        samples
            .iter()
            .find(|s| s.series == series)
            .ok_or_else(|| {
                let name = series.display_name();
                AppError::input(format!("Missing sampled curve for '{name}'."))
            })
    };
    let serious = find(Series::SeriousInjury)?;
    let death = find(Series::Death)?;
    if serious.points.len() != death.points.len() {
        return Err(AppError::input("Sampled curves have different grid lengths."));
    }

    let file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create samples CSV '{}': {e}", path.display()))
    })?;
    let mut out = BufWriter::new(file);

    writeln!(out, "height_m,p_serious,p_death")
        .map_err(|e| AppError::io(format!("Failed to write samples CSV header: {e}")))?;

    for (&(h, ps), &(_, pd)) in serious.points.iter().zip(death.points.iter()) {
        writeln!(out, "{h:.2},{ps:.10},{pd:.10}")
            .map_err(|e| AppError::io(format!("Failed to write samples CSV row: {e}")))?;
    }
    out.flush()
        .map_err(|e| AppError::io(format!("Failed to flush samples CSV: {e}")))?;

    info!(path = %path.display(), rows = serious.points.len(), "wrote samples CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LogisticParams;
    use crate::models::sample_curve;

    #[test]
    fn csv_has_header_and_one_row_per_height() {
        let samples = vec![
            sample_curve(Series::SeriousInjury, &LogisticParams::new(0.95, 9.0, 0.35)).unwrap(),
            sample_curve(Series::Death, &LogisticParams::new(0.99, 13.5, 0.3)).unwrap(),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        write_samples_csv(&path, &samples).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "height_m,p_serious,p_death");
        assert_eq!(lines.len(), 602);
        assert!(lines[1].starts_with("0.00,"));
        assert!(lines[601].starts_with("30.00,"));
    }

    #[test]
    fn missing_series_is_rejected() {
        let params = LogisticParams::new(0.99, 13.5, 0.3);
        let samples = vec![sample_curve(Series::Death, &params).unwrap()];
        let dir = tempfile::tempdir().unwrap();
        let err = write_samples_csv(&dir.path().join("x.csv"), &samples).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
