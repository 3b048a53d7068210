//! Fixed reference table.
//!
//! Nine illustrative (height, P(serious injury), P(death)) rows following trends
//! reported in the fall-injury literature. They are hand-chosen calibration
//! points for an explanatory chart, not a measured dataset.
//!
//! Heights are expected to be strictly increasing; this is not checked at runtime.

use crate::domain::{ReferencePoint, Series};

const fn row(height: f64, p_serious: f64, p_death: f64) -> ReferencePoint {
    ReferencePoint {
        height,
        p_serious,
        p_death,
    }
}

pub const REFERENCE_POINTS: [ReferencePoint; 9] = [
    row(0.5, 0.01, 0.001),
    row(1.5, 0.02, 0.002),
    row(3.0, 0.08, 0.01),
    row(5.0, 0.20, 0.05),
    row(7.0, 0.35, 0.12),
    row(10.0, 0.55, 0.30),
    row(15.0, 0.80, 0.60),
    row(20.0, 0.92, 0.85),
    row(25.0, 0.98, 0.98),
];

/// Height column (m).
pub fn heights() -> Vec<f64> {
    REFERENCE_POINTS.iter().map(|p| p.height).collect()
}

/// Probability column for one series.
pub fn probabilities(series: Series) -> Vec<f64> {
    REFERENCE_POINTS.iter().map(|p| p.probability(series)).collect()
}

/// `(height, probability)` pairs for one series, as drawn on the chart.
pub fn scatter(series: Series) -> Vec<(f64, f64)> {
    REFERENCE_POINTS
        .iter()
        .map(|p| (p.height, p.probability(series)))
        .collect()
}
