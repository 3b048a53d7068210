//! Plotters-powered fall-risk chart widget for Ratatui.
//!
//! Same content as the PNG (curves, reference points, reference heights) drawn
//! at terminal resolution. Plotters output goes into the Ratatui buffer through
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call, so `render()`
/// only draws.
pub struct FallRiskPlottersChart<'a> {
    /// Fitted serious-injury curve.
    pub serious_curve: &'a [(f64, f64)],
    /// Fitted death curve.
    pub death_curve: &'a [(f64, f64)],
    /// Reference points; empty slices hide the overlay.
    pub serious_points: &'a [(f64, f64)],
    pub death_points: &'a [(f64, f64)],
    /// Heights marked with vertical lines; empty hides them.
    pub reference_heights: &'a [f64],
    /// X bounds (height, m).
    pub x_bounds: [f64; 2],
    /// Y bounds (probability).
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
}

impl<'a> Widget for FallRiskPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        let finite = [x0, x1, y0, y1].iter().all(|v| v.is_finite());
        if !finite || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(7)
                .y_labels(6)
                .x_label_formatter(&|v| format!("{v:.0}"))
                .y_label_formatter(&|v| format!("{v:.1}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            let reference_color = RGBColor(110, 110, 110);
            let serious_color = RGBColor(0, 255, 255); // cyan
            let death_color = RGBColor(255, 165, 0); // orange
            let serious_points_color = RGBColor(0, 255, 0); // green
            let death_points_color = RGBColor(255, 0, 0); // red

            // 1) Reference heights, underneath everything else.
            for &h in self.reference_heights {
                chart.draw_series(LineSeries::new(vec![(h, y0), (h, y1)], &reference_color))?;
            }

            // 2) Fitted curves.
            chart.draw_series(LineSeries::new(self.serious_curve.iter().copied(), &serious_color))?;
            chart.draw_series(LineSeries::new(self.death_curve.iter().copied(), &death_color))?;

            // 3) Reference points.
            //
            // `Pixel` instead of `Circle`: the backend maps circle radii to
            // normalized canvas units, which produces huge circles.
            chart.draw_series(
                self.serious_points
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), serious_points_color)),
            )?;
            chart.draw_series(
                self.death_points
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), death_points_color)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
