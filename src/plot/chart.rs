//! Static PNG chart of the fitted fall-risk curves.
//!
//! Sizes are specified in typographic points and converted to pixels for the
//! configured DPI, so a 10×6 in figure at 300 DPI keeps the proportions of the
//! same figure at 100 DPI.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use tracing::info;

use crate::domain::{CurveSample, REFERENCE_HEIGHTS, ReferencePoint, RunConfig, Series};
use crate::error::AppError;

pub const X_RANGE: (f64, f64) = (0.0, 30.0);
pub const Y_RANGE: (f64, f64) = (-0.02, 1.02);
pub const X_LABEL: &str = "Fall height (meters)";
pub const Y_LABEL: &str = "Probability";

const GRID_X: [f64; 7] = [0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0];
const GRID_Y: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

const FONT: &str = "sans-serif";

/// Everything the chart draws; computed by the pipeline before rendering.
pub struct ChartData<'a> {
    pub samples: &'a [CurveSample],
    pub reference: &'a [ReferencePoint],
    pub title: &'a str,
}

/// Point-to-pixel conversion for one DPI setting.
#[derive(Debug, Clone, Copy)]
pub struct Scale {
    dpi: f64,
}

impl Scale {
    pub fn new(dpi: u32) -> Self {
        Self { dpi: dpi.max(1) as f64 }
    }

    /// Length in points → whole pixels (at least 1).
    pub fn px(&self, pt: f64) -> u32 {
        (pt * self.dpi / 72.0).round().max(1.0) as u32
    }

    /// Font size in points → pixel height.
    pub fn font(&self, pt: f64) -> f64 {
        pt * self.dpi / 72.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Circle,
    Square,
}

/// Line and marker colors follow the classic tab10 cycle: two curves, then two
/// scatter overlays.
fn curve_color(series: Series) -> RGBColor {
    match series {
        Series::SeriousInjury => RGBColor(31, 119, 180),
        Series::Death => RGBColor(255, 127, 14),
    }
}

fn points_style(series: Series) -> (RGBColor, Marker) {
    match series {
        Series::SeriousInjury => (RGBColor(44, 160, 44), Marker::Circle),
        Series::Death => (RGBColor(214, 39, 40), Marker::Square),
    }
}

/// Largest bitmap side (px) the renderer accepts.
pub const MAX_CANVAS_SIDE: u32 = 20_000;
/// Largest bitmap area (px) the renderer accepts.
pub const MAX_CANVAS_PIXELS: u64 = 100_000_000;

/// Render the chart to `config.output`, overwriting any existing file.
///
/// The image is drawn into a sibling staging file and renamed over the target
/// once complete, so a failed render leaves an existing chart untouched.
pub fn render_png(data: &ChartData<'_>, config: &RunConfig) -> Result<(), AppError> {
    let path = config.output.as_path();
    check_output_path(path)?;

    let size = config.pixel_size();
    check_canvas_size(size)?;
    let scale = Scale::new(config.dpi);

    let staging = staging_path(path);
    if let Err(err) = draw_to_file(&staging, data, size, scale) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(AppError::io(format!("Failed to write chart '{}': {e}", path.display())));
    }

    info!(path = %path.display(), width = size.0, height = size.1, dpi = config.dpi, "wrote chart");
    Ok(())
}

/// Reject bitmaps the backend cannot allocate.
pub fn check_canvas_size((width, height): (u32, u32)) -> Result<(), AppError> {
    let too_big = width > MAX_CANVAS_SIDE
        || height > MAX_CANVAS_SIDE
        || u64::from(width) * u64::from(height) > MAX_CANVAS_PIXELS;
    if too_big {
        return Err(AppError::input(format!(
            "Chart size {width}x{height} px exceeds the limit of {MAX_CANVAS_SIDE} px per side \
             and {MAX_CANVAS_PIXELS} px in total; lower --dpi or the figure size."
        )));
    }
    Ok(())
}

/// `chart.png` -> `chart.tmp.png`, next to the target so the rename stays on one filesystem.
fn staging_path(path: &Path) -> PathBuf {
    path.with_extension("tmp.png")
}

fn draw_to_file(
    staging: &Path,
    data: &ChartData<'_>,
    size: (u32, u32),
    scale: Scale,
) -> Result<(), AppError> {
    // The backend also flushes on drop, so the staging file may hold a partial
    // image after an error; the caller removes it.
    let root = BitMapBackend::new(staging, size).into_drawing_area();
    draw_chart(&root, data, scale).map_err(|e| {
        AppError::render(format!("Failed to draw chart '{}': {e}", staging.display()))
    })?;
    root.present()
        .map_err(|e| AppError::io(format!("Failed to write chart '{}': {e}", staging.display())))?;
    Ok(())
}

/// Fail early (with the path in the message) when the chart cannot be written.
///
/// Never modifies an existing file.
fn check_output_path(path: &Path) -> Result<(), AppError> {
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if !is_png {
        return Err(AppError::input(format!(
            "Chart output '{}' must have a .png extension.",
            path.display()
        )));
    }

    if path.exists() {
        OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| AppError::io(format!("Cannot write chart '{}': {e}", path.display())))?;
        return Ok(());
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(AppError::io(format!(
            "Cannot write chart '{}': directory '{}' does not exist.",
            path.display(),
            parent.display()
        )));
    }
    Ok(())
}

/// Draw the full chart onto any Plotters drawing area.
pub fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &ChartData<'_>,
    scale: Scale,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let label_font = (FONT, scale.font(10.0)).into_font();

    let mut chart = ChartBuilder::on(root)
        .caption(data.title, (FONT, scale.font(12.0)).into_font())
        .margin(scale.px(10.0))
        .x_label_area_size(scale.px(34.0))
        .y_label_area_size(scale.px(44.0))
        .build_cartesian_2d(X_RANGE.0..X_RANGE.1, Y_RANGE.0..Y_RANGE.1)?;

    // Mesh lines are drawn below as dashed series, so only axes and labels here.
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(X_LABEL)
        .y_desc(Y_LABEL)
        .x_labels(GRID_X.len())
        .y_labels(GRID_Y.len())
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.1}"))
        .label_style(label_font.clone())
        .axis_desc_style(label_font.clone())
        .axis_style(BLACK.stroke_width(scale.px(0.8)))
        .draw()?;

    // Grid (dashed, alpha 0.4).
    let grid_style = RGBColor(176, 176, 176).mix(0.4).stroke_width(scale.px(0.8));
    let (dash, gap) = dash_pattern(scale, 0.8);
    for &x in &GRID_X {
        chart.draw_series(DashedLineSeries::new(
            vec![(x, Y_RANGE.0), (x, Y_RANGE.1)],
            dash,
            gap,
            grid_style,
        ))?;
    }
    for &y in &GRID_Y {
        chart.draw_series(DashedLineSeries::new(
            vec![(X_RANGE.0, y), (X_RANGE.1, y)],
            dash,
            gap,
            grid_style,
        ))?;
    }

    // Reference heights: gray, dashed, low opacity, no legend entry.
    let ref_style = RGBColor(128, 128, 128).mix(0.25).stroke_width(scale.px(1.5));
    let (dash, gap) = dash_pattern(scale, 1.5);
    for &h in &REFERENCE_HEIGHTS {
        chart.draw_series(DashedLineSeries::new(
            vec![(h, Y_RANGE.0), (h, Y_RANGE.1)],
            dash,
            gap,
            ref_style,
        ))?;
    }

    // Fitted curves.
    let line_width = scale.px(2.0);
    let legend_len = scale.px(20.0) as i32;
    for sample in data.samples {
        let color = curve_color(sample.series);
        chart
            .draw_series(LineSeries::new(
                sample.points.iter().copied(),
                color.stroke_width(line_width),
            ))?
            .label(sample.series.curve_label())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + legend_len, y)], color.stroke_width(line_width))
            });
    }

    // Reference points (marker area 60 pt² → radius ≈ 3.9 pt).
    let radius = scale.px(60f64.sqrt() / 2.0) as i32;
    let legend_mid = legend_len / 2;
    for series in Series::ALL {
        let (color, marker) = points_style(series);
        let points: Vec<(f64, f64)> = data
            .reference
            .iter()
            .map(|p| (p.height, p.probability(series)))
            .collect();

        match marker {
            Marker::Circle => {
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|&(x, y)| Circle::new((x, y), radius, color.filled())),
                    )?
                    .label(series.points_label())
                    .legend(move |(x, y)| Circle::new((x + legend_mid, y), radius, color.filled()));
            }
            Marker::Square => {
                chart
                    .draw_series(points.iter().map(|&(x, y)| {
                        EmptyElement::at((x, y))
                            + Rectangle::new([(-radius, -radius), (radius, radius)], color.filled())
                    }))?
                    .label(series.points_label())
                    .legend(move |(x, y)| {
                        let cx = x + legend_mid;
                        let corners = [(cx - radius, y - radius), (cx + radius, y + radius)];
                        Rectangle::new(corners, color.filled())
                    });
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .margin(scale.px(6.0))
        .legend_area_size(scale.px(26.0))
        .label_font(label_font)
        .background_style(WHITE.mix(0.8))
        .border_style(RGBColor(204, 204, 204))
        .draw()?;

    Ok(())
}

/// Dash and gap lengths for a `--` line of the given width (pt).
fn dash_pattern(scale: Scale, width_pt: f64) -> (u32, u32) {
    (scale.px(3.7 * width_pt), scale.px(1.6 * width_pt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_converts_points_at_figure_dpi() {
        let s = Scale::new(300);
        assert_eq!(s.px(72.0), 300);
        assert_eq!(s.px(2.0), 8);
        assert!((s.font(12.0) - 50.0).abs() < 1e-12);
        // Never collapses to zero width.
        assert_eq!(Scale::new(10).px(0.1), 1);
    }

    #[test]
    fn default_figure_is_3000_by_1800() {
        assert_eq!(RunConfig::default().pixel_size(), (3000, 1800));
    }

    #[test]
    fn series_have_distinct_markers_and_colors() {
        let (c1, m1) = points_style(Series::SeriousInjury);
        let (c2, m2) = points_style(Series::Death);
        assert_ne!(m1, m2);
        assert_ne!(c1.rgb(), c2.rgb());
        assert_ne!(
            curve_color(Series::SeriousInjury).rgb(),
            curve_color(Series::Death).rgb()
        );
    }

    #[test]
    fn non_png_output_is_rejected() {
        let err = check_output_path(Path::new("chart.svg")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }

    #[test]
    fn existing_chart_is_not_touched_by_the_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        std::fs::write(&path, b"hello").unwrap();

        check_output_path(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn canvas_limits_reject_huge_bitmaps() {
        assert!(check_canvas_size((3000, 1800)).is_ok());
        assert!(check_canvas_size((MAX_CANVAS_SIDE, 5000)).is_ok());

        let err = check_canvas_size((120_000, 120_000)).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(check_canvas_size((MAX_CANVAS_SIDE + 1, 10)).is_err());
        assert!(check_canvas_size((15_000, 15_000)).is_err());
    }

    fn chart_data<'a>(samples: &'a [CurveSample]) -> ChartData<'a> {
        ChartData {
            samples,
            reference: &crate::data::REFERENCE_POINTS,
            title: "t",
        }
    }

    #[test]
    fn oversized_render_keeps_the_previous_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        std::fs::write(&path, b"hello").unwrap();

        let config = RunConfig {
            output: path.clone(),
            dpi: 1200,
            fig_size: (100.0, 100.0),
            ..RunConfig::default()
        };
        let err = render_png(&chart_data(&[]), &config).unwrap_err();

        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn failed_write_keeps_the_previous_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        std::fs::write(&path, b"hello").unwrap();
        // A directory where the staging file would go makes the final save fail.
        let staging = staging_path(&path);
        std::fs::create_dir(&staging).unwrap();

        let config = RunConfig {
            output: path.clone(),
            dpi: 20,
            ..RunConfig::default()
        };
        assert!(render_png(&chart_data(&[]), &config).is_err());

        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        assert!(staging.is_dir());
    }

    #[test]
    fn staging_file_sits_next_to_the_target() {
        let staging = staging_path(Path::new("out/chart.png"));
        assert_eq!(staging, PathBuf::from("out/chart.tmp.png"));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("chart.png");
        let err = check_output_path(&path).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_IO);
        assert!(err.message().contains("chart.png"));
    }
}
