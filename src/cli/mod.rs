//! Command-line parsing for the fall-risk chart.
//!
//! Every flag has a default, so running the binary with no arguments produces
//! the standard chart. Parsing stays separate from the fitting and rendering code.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::{DEFAULT_MAX_EVALS, DEFAULT_OUTPUT, DEFAULT_TITLE};

/// Top-level CLI.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "fallrisk",
    version,
    about = "Fit logistic fall-risk curves and render an illustrative chart"
)]
pub struct Cli {
    /// PNG file to write (overwritten if it exists).
    #[arg(short, long, value_name = "PNG", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Output resolution (dots per inch).
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u32).range(10..=1200))]
    pub dpi: u32,

    /// Figure width in inches.
    #[arg(long, default_value_t = 10.0)]
    pub fig_width: f64,

    /// Figure height in inches.
    #[arg(long, default_value_t = 6.0)]
    pub fig_height: f64,

    /// Chart title.
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Maximum objective evaluations per fitted series.
    #[arg(long, default_value_t = DEFAULT_MAX_EVALS)]
    pub max_evals: usize,

    /// Skip the interactive terminal preview.
    #[arg(long)]
    pub no_show: bool,

    /// Print fit diagnostics and residuals after the parameter lines.
    #[arg(long)]
    pub summary: bool,

    /// Export both fits and their sampled grids to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,

    /// Export the sampled grid to CSV.
    #[arg(long = "export-samples", value_name = "CSV")]
    pub export_samples: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_gives_the_standard_run() {
        let cli = Cli::parse_from(["fallrisk"]);
        assert_eq!(cli.output, PathBuf::from("not_a_liar.png"));
        assert!(cli.title.starts_with("Drago mi je"));
        assert_eq!(cli.dpi, 300);
        assert_eq!(cli.fig_width, 10.0);
        assert_eq!(cli.fig_height, 6.0);
        assert_eq!(cli.max_evals, 20_000);
        assert!(!cli.no_show);
        assert!(cli.export_curve.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "fallrisk",
            "-o",
            "out/chart.png",
            "--dpi",
            "100",
            "--no-show",
            "--summary",
            "--export-samples",
            "grid.csv",
        ]);
        assert_eq!(cli.output, PathBuf::from("out/chart.png"));
        assert_eq!(cli.dpi, 100);
        assert!(cli.no_show && cli.summary);
        assert_eq!(cli.export_samples, Some(PathBuf::from("grid.csv")));
    }

    #[test]
    fn dpi_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["fallrisk", "--dpi", "0"]).is_err());
    }
}
