//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - fits both curves and samples them
//! - renders the PNG chart
//! - shows the terminal preview when possible
//! - prints the fitted parameters
//! - writes optional exports

use std::io::IsTerminal;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::data::REFERENCE_POINTS;
use crate::domain::{ParamBounds, RunConfig};
use crate::error::AppError;
use crate::plot::ChartData;

pub mod pipeline;

/// Entry point for the `fallrisk` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();

    let cli = Cli::parse();
    let config = run_config_from_args(&cli)?;
    execute(&config)
}

/// Run the full pipeline for an already-resolved configuration.
pub fn execute(config: &RunConfig) -> Result<(), AppError> {
    let run = pipeline::run_fit(config)?;

    let chart = ChartData {
        samples: &run.samples,
        reference: &REFERENCE_POINTS,
        title: &config.title,
    };
    crate::plot::render_png(&chart, config)?;

    if config.show {
        show_preview(&run, config);
    }

    println!("{}", crate::report::format_params(&run.fits));
    if config.summary {
        println!("{}", crate::report::format_fit_summary(&run.fits)?);
    }

    // Optional exports.
    if let Some(path) = &config.export_curve {
        let doc = crate::io::build_curve_file(&run.fits, &run.samples, ParamBounds::DEFAULT);
        crate::io::write_curve_json(path, &doc)?;
    }
    if let Some(path) = &config.export_samples {
        crate::io::write_samples_csv(path, &run.samples)?;
    }

    Ok(())
}

/// Best-effort interactive display; never fails the run.
fn show_preview(run: &pipeline::RunOutput, config: &RunConfig) {
    if !std::io::stdout().is_terminal() {
        info!("stdout is not a terminal; skipping interactive preview");
        return;
    }
    if let Err(err) = crate::tui::run(run, config) {
        warn!(error = %err, "interactive preview failed");
    }
}

pub fn run_config_from_args(args: &Cli) -> Result<RunConfig, AppError> {
    let valid_size = |v: f64| v.is_finite() && v > 0.0 && v <= 100.0;
    if !(valid_size(args.fig_width) && valid_size(args.fig_height)) {
        return Err(AppError::input(format!(
            "Invalid figure size {}x{} in (must be in (0, 100]).",
            args.fig_width, args.fig_height
        )));
    }
    if args.max_evals == 0 {
        return Err(AppError::input("--max-evals must be >= 1."));
    }

    let config = RunConfig {
        output: args.output.clone(),
        dpi: args.dpi,
        fig_size: (args.fig_width, args.fig_height),
        title: args.title.clone(),
        max_evals: args.max_evals,
        show: !args.no_show,
        summary: args.summary,
        export_curve: args.export_curve.clone(),
        export_samples: args.export_samples.clone(),
    };
    crate::plot::check_canvas_size(config.pixel_size())?;
    Ok(config)
}

/// Log to stderr so stdout carries only the report. `RUST_LOG` overrides the
/// default `warn` level.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
