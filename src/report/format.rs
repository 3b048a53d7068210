//! Formatted terminal output.
//!
//! Formatting lives in one place so the fitting code stays free of presentation
//! details and output changes stay localized.

use crate::domain::{FitPair, LogisticFit, Series};
use crate::error::AppError;
use crate::report::compute_residuals;

/// One audit line: `Fitted logistic params (<series>): L,x0,k = [<L> <x0> <k>]`.
pub fn format_params_line(fit: &LogisticFit) -> String {
    let p = fit.params;
    format!(
        "Fitted logistic params ({}): L,x0,k = [{:.8} {:.8} {:.8}]",
        fit.series.display_name(),
        p.l,
        p.x0,
        p.k
    )
}

/// Both audit lines, serious injury first.
pub fn format_params(fits: &FitPair) -> String {
    Series::ALL
        .iter()
        .map(|&s| format_params_line(fits.get(s)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Diagnostics block: fit quality per series plus a residual table.
pub fn format_fit_summary(fits: &FitPair) -> Result<String, AppError> {
    let mut out = String::new();

    out.push_str("\nFit diagnostics:\n");
    for series in Series::ALL {
        let fit = fits.get(series);
        out.push_str(&format!(
            "  {:<15} SSE={:.6} RMSE={:.4} evals={} iters={} ({})\n",
            series.display_name(),
            fit.sse,
            fit.rmse,
            fit.evaluations,
            fit.iterations,
            fit.termination.describe(),
        ));
        let std_errors = fmt_std_errors(fit.std_errors);
        out.push_str(&format!("  {:<15} std err L,x0,k = {std_errors}\n", ""));
    }

    out.push_str("\nResiduals at reference heights:\n");
    out.push_str(format!(
        "{:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
        "height", "ser_obs", "ser_fit", "ser_res", "dea_obs", "dea_fit", "dea_res"
    )
    .trim_end());
    out.push('\n');
    out.push_str(
        format!(
            "{:-<8} {:-<10} {:-<10} {:-<10} {:-<10} {:-<10} {:-<10}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    let serious = compute_residuals(&fits.serious)?;
    let death = compute_residuals(&fits.death)?;
    for (s, d) in serious.iter().zip(death.iter()) {
        out.push_str(&format!(
            "{:>8.2} {:>10.4} {:>10.4} {:>+10.4} {:>10.4} {:>10.4} {:>+10.4}\n",
            s.height, s.observed, s.fitted, s.residual, d.observed, d.fitted, d.residual
        ));
    }

    Ok(out)
}

fn fmt_std_errors(v: Option<[f64; 3]>) -> String {
    match v {
        Some(se) => format!("[{:.4} {:.4} {:.4}]", se[0], se[1], se[2]),
        None => "-".to_string(),
    }
}
