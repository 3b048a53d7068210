//! Ratatui-based terminal preview.
//!
//! Shows the fitted curves right after the PNG is written: a header with the
//! fitted parameters, the chart, and a footer with key help. The preview is
//! read-only; it only toggles overlays.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::debug;

use crate::app::pipeline::RunOutput;
use crate::data;
use crate::domain::{REFERENCE_HEIGHTS, RunConfig, Series};
use crate::error::AppError;
use crate::plot::{X_LABEL, X_RANGE, Y_LABEL, Y_RANGE};

mod plotters_chart;

use plotters_chart::FallRiskPlottersChart;

/// Show the preview until the user quits.
pub fn run(run: &RunOutput, config: &RunConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::render(format!("Failed to initialize terminal: {e}")))?;

    let mut viewer = Viewer::new(run, config);
    viewer.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::render(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::render(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct Viewer<'a> {
    run: &'a RunOutput,
    output: String,
    show_points: bool,
    show_reference: bool,
    status: String,
    series: ChartSeries,
}

impl<'a> Viewer<'a> {
    fn new(run: &'a RunOutput, config: &RunConfig) -> Self {
        let output = config.output.display().to_string();
        Self {
            run,
            status: format!("Saved {output}"),
            output,
            show_points: true,
            show_reference: true,
            series: chart_series(run),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::render(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::render(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::render(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        debug!("preview closed");
        Ok(())
    }

    /// Returns `true` when the viewer should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('p') => {
                self.show_points = !self.show_points;
                self.status = format!("reference points: {}", on_off(self.show_points));
            }
            KeyCode::Char('g') => {
                self.show_reference = !self.show_reference;
                self.status = format!("reference heights: {}", on_off(self.show_reference));
            }
            _ => {}
        }
        false
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        let rows = [(Series::SeriousInjury, Color::Cyan), (Series::Death, Color::LightRed)];
        for (series, color) in rows {
            let p = self.run.fits.get(series).params;
            lines.push(Line::from(vec![
                Span::styled(format!("{:<15}", series.display_name()), Style::default().fg(color)),
                Span::styled(
                    format!("L={:.4}  x0={:.3} m  k={:.4}", p.l, p.x0, p.k),
                    Style::default().fg(Color::Gray),
                ),
            ]));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.output.as_str()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let s = &self.series;
        let none: &[(f64, f64)] = &[];
        let widget = FallRiskPlottersChart {
            serious_curve: &s.serious_curve,
            death_curve: &s.death_curve,
            serious_points: if self.show_points { &s.serious_points } else { none },
            death_points: if self.show_points { &s.death_points } else { none },
            reference_heights: if self.show_reference { &REFERENCE_HEIGHTS } else { &[] },
            x_bounds: [X_RANGE.0, X_RANGE.1],
            y_bounds: [Y_RANGE.0, Y_RANGE.1],
            x_label: X_LABEL,
            y_label: Y_LABEL,
        };

        let (chart_rect, insets) = chart_layout(inner);
        frame.render_widget(widget, chart_rect);

        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "p points  g reference heights  q/Esc quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);

        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

/// Series for the chart widget, computed once per run.
struct ChartSeries {
    serious_curve: Vec<(f64, f64)>,
    death_curve: Vec<(f64, f64)>,
    serious_points: Vec<(f64, f64)>,
    death_points: Vec<(f64, f64)>,
}

fn chart_series(run: &RunOutput) -> ChartSeries {
    let curve = |series: Series| {
        run.sample(series)
            .map(|s| s.points.clone())
            .unwrap_or_default()
    };

    ChartSeries {
        serious_curve: curve(Series::SeriousInjury),
        death_curve: curve(Series::Death),
        serious_points: data::scatter(Series::SeriousInjury),
        death_points: data::scatter(Series::Death),
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 6,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

/// Tick labels drawn as text cells; Plotters text is unreliable at cell resolution.
fn draw_axis_ticks(frame: &mut ratatui::Frame<'_>, inner: Rect, chart: Rect, insets: AxisInsets) {
    let style = Style::default().fg(Color::Gray);
    let x_ticks = [0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0];
    let y_ticks = [0.0, 0.25, 0.5, 0.75, 1.0];

    for &x_val in &x_ticks {
        let u = (x_val - X_RANGE.0) / (X_RANGE.1 - X_RANGE.0);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.0}");
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label.clone()).style(style),
            Rect {
                x: start,
                y,
                width: label.len() as u16,
                height: 1,
            },
        );
    }

    for &y_val in &y_ticks {
        let u = (y_val - Y_RANGE.0) / (Y_RANGE.1 - Y_RANGE.0);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.2}");
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label.clone()).style(style),
            Rect {
                x: start,
                y,
                width: label.len() as u16,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(X_LABEL)
        .alignment(Alignment::Center)
        .style(style);
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(Y_LABEL).style(style.add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: inner.width.min(Y_LABEL.len() as u16),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_reserves_axis_room_when_it_fits() {
        let inner = Rect::new(0, 0, 80, 24);
        let (rect, insets) = chart_layout(inner);
        assert!(insets.is_some());
        assert_eq!(rect.width, 72);
        assert_eq!(rect.height, 21);
    }

    #[test]
    fn tiny_area_uses_the_whole_rect() {
        let inner = Rect::new(0, 0, 12, 6);
        let (rect, insets) = chart_layout(inner);
        assert!(insets.is_none());
        assert_eq!(rect, inner);
    }

    #[test]
    fn toggles_flip_overlays_and_quit_keys_close() {
        let run = crate::app::pipeline::run_fit(&RunConfig::default()).unwrap();
        let config = RunConfig::default();
        let mut viewer = Viewer::new(&run, &config);

        assert!(!viewer.handle_key(KeyCode::Char('p')));
        assert!(!viewer.show_points);
        assert!(!viewer.handle_key(KeyCode::Char('g')));
        assert!(!viewer.show_reference);
        assert!(viewer.handle_key(KeyCode::Esc));
        assert!(viewer.handle_key(KeyCode::Char('q')));
        assert_eq!(viewer.series.serious_curve.len(), 601);
    }
}
