//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and sampling
//! - exported to JSON/CSV
//! - reloaded later for inspection

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default evaluation budget for a single series fit.
pub const DEFAULT_MAX_EVALS: usize = 20_000;

/// Default chart path (relative to the working directory).
pub const DEFAULT_OUTPUT: &str = "not_a_liar.png";

/// Default chart title.
pub const DEFAULT_TITLE: &str = "Drago mi je so ti sum dokazaf da ne mamim! A i da ne mi je muka";

/// Sampling grid used for the smooth curves: `[0, 30]` m, 601 points (0.05 m step).
pub const GRID_START: f64 = 0.0;
pub const GRID_END: f64 = 30.0;
pub const GRID_POINTS: usize = 601;

/// Heights (m) marked with vertical reference lines on the chart.
pub const REFERENCE_HEIGHTS: [f64; 5] = [1.0, 5.0, 10.0, 15.0, 20.0];

/// Which outcome probability a curve describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    SeriousInjury,
    Death,
}

impl Series {
    pub const ALL: [Series; 2] = [Series::SeriousInjury, Series::Death];

    /// Short label used in terminal output and error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Series::SeriousInjury => "serious injury",
            Series::Death => "death",
        }
    }

    /// Legend entry for the fitted curve.
    pub fn curve_label(self) -> &'static str {
        match self {
            Series::SeriousInjury => "Prob. of serious injury (ISS high)",
            Series::Death => "Prob. of death",
        }
    }

    /// Legend entry for the reference-point overlay.
    pub fn points_label(self) -> &'static str {
        match self {
            Series::SeriousInjury => "Reference points: serious injury",
            Series::Death => "Reference points: death",
        }
    }

    /// Starting point for the optimizer.
    ///
    /// Chosen empirically for the illustrative table: the serious-injury curve
    /// inflects earlier than the death curve.
    pub fn initial_guess(self) -> LogisticParams {
        match self {
            Series::SeriousInjury => LogisticParams::new(1.0, 8.0, 0.5),
            Series::Death => LogisticParams::new(1.0, 15.0, 0.5),
        }
    }
}

/// One calibration row: fall height and the two outcome probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// Fall height in meters.
    pub height: f64,
    pub p_serious: f64,
    pub p_death: f64,
}

impl ReferencePoint {
    pub fn probability(&self, series: Series) -> f64 {
        match series {
            Series::SeriousInjury => self.p_serious,
            Series::Death => self.p_death,
        }
    }
}

/// Parameters of `f(h) = L / (1 + exp(-k (h - x0)))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Upper asymptote.
    pub l: f64,
    /// Inflection height (m).
    pub x0: f64,
    /// Steepness.
    pub k: f64,
}

impl LogisticParams {
    pub const fn new(l: f64, x0: f64, k: f64) -> Self {
        Self { l, x0, k }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.l, self.x0, self.k]
    }

    pub fn from_array(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Box constraints on the logistic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamBounds {
    pub lower: LogisticParams,
    pub upper: LogisticParams,
}

impl ParamBounds {
    /// `L ∈ [0.5, 1]`, `x0 ∈ [0, 100]`, `k ∈ [0.01, 5]`.
    pub const DEFAULT: ParamBounds = ParamBounds {
        lower: LogisticParams::new(0.5, 0.0, 0.01),
        upper: LogisticParams::new(1.0, 100.0, 5.0),
    };

    /// Inclusive membership test.
    pub fn contains(&self, p: &LogisticParams) -> bool {
        let lo = self.lower.to_array();
        let hi = self.upper.to_array();
        p.to_array()
            .iter()
            .enumerate()
            .all(|(i, &v)| v.is_finite() && v >= lo[i] && v <= hi[i])
    }

    /// Project each component onto its interval.
    pub fn clamp(&self, p: [f64; 3]) -> [f64; 3] {
        let lo = self.lower.to_array();
        let hi = self.upper.to_array();
        [
            p[0].clamp(lo[0], hi[0]),
            p[1].clamp(lo[1], hi[1]),
            p[2].clamp(lo[2], hi[2]),
        ]
    }

    /// True when the bounds describe a non-empty box.
    pub fn is_valid(&self) -> bool {
        let lo = self.lower.to_array();
        let hi = self.upper.to_array();
        lo.iter()
            .zip(hi.iter())
            .all(|(a, b)| a.is_finite() && b.is_finite() && a <= b)
    }
}

impl Default for ParamBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Relative reduction of the sum of squares fell below `ftol`.
    CostTolerance,
    /// The accepted/proposed step fell below `xtol`.
    StepTolerance,
    /// Projected gradient fell below `gtol`.
    GradientTolerance,
}

impl Termination {
    pub fn describe(self) -> &'static str {
        match self {
            Termination::CostTolerance => "cost reduction below ftol",
            Termination::StepTolerance => "step size below xtol",
            Termination::GradientTolerance => "projected gradient below gtol",
        }
    }
}

/// Fitted parameters plus diagnostics for one series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticFit {
    pub series: Series,
    pub params: LogisticParams,
    pub sse: f64,
    pub rmse: f64,
    /// One-sigma standard errors from `s² (JᵀJ)⁻¹`; `None` when the Jacobian is
    /// rank deficient or there are no spare degrees of freedom.
    pub std_errors: Option<[f64; 3]>,
    pub evaluations: usize,
    pub iterations: usize,
    pub termination: Termination,
}

/// Both fitted curves of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitPair {
    pub serious: LogisticFit,
    pub death: LogisticFit,
}

impl FitPair {
    pub fn get(&self, series: Series) -> &LogisticFit {
        match series {
            Series::SeriousInjury => &self.serious,
            Series::Death => &self.death,
        }
    }
}

/// A fitted curve evaluated on the plotting grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSample {
    pub series: Series,
    pub points: Vec<(f64, f64)>,
}

impl CurveSample {
    pub fn heights(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(h, _)| h)
    }

    pub fn probabilities(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(_, p)| p)
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output: PathBuf,
    pub dpi: u32,
    /// Figure size in inches (width, height).
    pub fig_size: (f64, f64),
    pub title: String,
    pub max_evals: usize,
    pub show: bool,
    pub summary: bool,
    pub export_curve: Option<PathBuf>,
    pub export_samples: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            dpi: 300,
            fig_size: (10.0, 6.0),
            title: DEFAULT_TITLE.to_string(),
            max_evals: DEFAULT_MAX_EVALS,
            show: true,
            summary: false,
            export_curve: None,
            export_samples: None,
        }
    }
}

impl RunConfig {
    /// Bitmap size in pixels for the configured figure size and DPI.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.fig_size.0 * dpi).round().max(1.0) as u32,
            (self.fig_size.1 * dpi).round().max(1.0) as u32,
        )
    }
}

/// A saved fit file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub bounds: ParamBounds,
    pub reference: Vec<ReferencePoint>,
    pub curves: Vec<CurveEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveEntry {
    pub fit: LogisticFit,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub height_m: Vec<f64>,
    pub probability: Vec<f64>,
}
