//! Detail overlay rendering.
//!
//! Displays a modal overlay with the scrubbable chart of the selected
//! series: the visible window, live/history badge, scrub bar with ruler
//! ticks, the alert limit, and for targets the timing waterfall of the
//! focused probe.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::{ProbeTiming, Sample, SeriesBuffer, SeriesKey, SeriesView, WindowController};

use super::common::format_value;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;
/// Ruler ticks under the scrub bar.
const RULER_TICKS: usize = 5;

/// Render the series detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(key) = app.selected_series() else {
        return;
    };
    let Some(view) = app.session.view(&key) else {
        return;
    };

    // Width: 95% of screen, clamped to [MIN_OVERLAY_WIDTH, 120]
    let overlay_width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 120);
    // Height: 90% of screen, clamped to [MIN_OVERLAY_HEIGHT, 40]
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 40);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let visible = view.visible();
    let focused = visible.last().copied();
    let timing = focused.and_then(|s| s.meta.timing);
    let waterfall_height = if timing.is_some() { 7 } else { 0 };

    let chunks = Layout::vertical([
        Constraint::Length(4),                // Header
        Constraint::Min(8),                   // Chart
        Constraint::Length(4),                // Scrub bar and ruler
        Constraint::Length(waterfall_height), // Timing waterfall
        Constraint::Length(1),                // Footer
    ])
    .split(overlay_area);

    render_header(frame, app, &key, view, focused, chunks[0]);
    render_chart(frame, app, &key, view, &visible, chunks[1]);
    render_scrub_bar(frame, app, view, chunks[2]);
    if let Some(timing) = timing {
        render_waterfall(frame, app, &timing, chunks[3]);
    }

    let footer = Paragraph::new(" ←/→ scrub  PgUp/PgDn ±10  Home oldest  End live  Esc close")
        .style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(footer, chunks[4]);
}

fn series_title(app: &App, key: &SeriesKey) -> String {
    match key {
        SeriesKey::System(metric) => metric.label().to_string(),
        SeriesKey::Target(id) => app
            .session
            .target(id)
            .map(|t| t.url.clone())
            .unwrap_or_else(|| id.clone()),
    }
}

fn unit(key: &SeriesKey) -> &'static str {
    match key {
        SeriesKey::System(metric) => metric.unit(),
        SeriesKey::Target(_) => "ms",
    }
}

fn render_header(
    frame: &mut Frame,
    app: &App,
    key: &SeriesKey,
    view: &SeriesView,
    focused: Option<&Sample>,
    area: Rect,
) {
    let badge = if view.window.is_live() {
        Span::styled(
            " LIVE ",
            Style::default()
                .fg(app.theme.healthy)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )
    } else {
        Span::styled(
            " HISTORY ",
            Style::default()
                .fg(app.theme.warning)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )
    };

    let mut value_line = vec![Span::raw(" ")];
    match focused {
        Some(sample) => {
            value_line.push(Span::styled(
                format!("{} {}", format_value(sample.value.as_f64()), unit(key)),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            value_line.push(Span::raw(format!(" at {}", sample.time_label())));
            let meta = &sample.meta;
            if let Some(code) = meta.code.filter(|c| *c != 0) {
                value_line.push(Span::styled(
                    format!("  {}", code),
                    app.theme.up_style((200..300).contains(&code)),
                ));
            }
            if let Some(status) = meta.status.as_deref().filter(|s| !s.is_empty()) {
                value_line.push(Span::raw(format!(" {}", status)));
            }
        }
        None => value_line.push(Span::styled(
            "No samples yet",
            Style::default().add_modifier(Modifier::DIM),
        )),
    }

    if let SeriesKey::System(metric) = key {
        let limit = app.session.thresholds().limit(*metric);
        value_line.push(Span::raw("  │ limit "));
        if limit > 0.0 {
            let style = if app.session.thresholds().is_metric_breached(*metric) {
                app.theme.breach_style()
            } else {
                Style::default()
            };
            value_line.push(Span::styled(
                format!("{} {}", format_value(limit), metric.unit()),
                style,
            ));
        } else {
            value_line.push(Span::styled("off", Style::default().add_modifier(Modifier::DIM)));
        }
    }

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", series_title(app, key)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            badge,
            Span::styled(
                format!("  {} samples", view.buffer.len()),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]),
        Line::from(value_line),
    ];

    let block = Block::default()
        .title(" Series Detail ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_chart(
    frame: &mut Frame,
    app: &App,
    key: &SeriesKey,
    view: &SeriesView,
    visible: &[&Sample],
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if visible.is_empty() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            " Waiting for data...",
            Style::default().add_modifier(Modifier::DIM),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let points: Vec<(f64, f64)> = visible
        .iter()
        .enumerate()
        .map(|(i, s)| (i as f64, s.value.as_f64()))
        .collect();
    let x_max = (points.len().saturating_sub(1)).max(1) as f64;

    let limit = match key {
        SeriesKey::System(metric) => app.session.thresholds().limit(*metric),
        SeriesKey::Target(_) => 0.0,
    };
    let limit_points: Vec<(f64, f64)> = if limit > 0.0 {
        vec![(0.0, limit), (x_max, limit)]
    } else {
        Vec::new()
    };

    let (y_min, y_max) = y_bounds(&points, limit);

    let mut datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.series))
        .data(&points)];
    if !limit_points.is_empty() {
        datasets.push(
            Dataset::default()
                .name(format!("limit {}", format_value(limit)))
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(app.theme.critical))
                .data(&limit_points),
        );
    }

    let (start, _) = view.window.range();
    let x_labels: Vec<Span> = [0, points.len() / 2, points.len().saturating_sub(1)]
        .into_iter()
        .map(|i| {
            Span::raw(
                view.window
                    .label_at(&view.buffer, start + i)
                    .unwrap_or_default(),
            )
        })
        .collect();
    let y_labels: Vec<Span> = [y_min, (y_min + y_max) / 2.0, y_max]
        .into_iter()
        .map(|v| Span::raw(format_value(v)))
        .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(unit(key))
                .style(Style::default().fg(app.theme.border))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );

    frame.render_widget(chart, area);
}

/// Y range covering the points and the limit, with some headroom.
fn y_bounds(points: &[(f64, f64)], limit: f64) -> (f64, f64) {
    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
            (lo.min(y), hi.max(y))
        });
    let lo = lo.min(0.0);
    let hi = hi.max(limit);
    if !hi.is_finite() || hi <= lo {
        return (0.0, 1.0);
    }
    (lo, hi * 1.1)
}

fn render_scrub_bar(frame: &mut Frame, app: &App, view: &SeriesView, area: Rect) {
    let window = &view.window;
    let buffer = &view.buffer;
    let width = area.width.saturating_sub(4) as usize;

    let cursor_label = buffer
        .get(window.cursor())
        .map(|s| format!("{} {}", s.date_label(), s.time_label()))
        .unwrap_or_else(|| "-".to_string());
    let (start, end) = window.range();

    let track = scrub_track(window.progress(), width);
    let lines = vec![
        Line::from(vec![
            Span::raw(" "),
            Span::styled(cursor_label, Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  samples {}-{} of {}", start + 1, end, buffer.len()),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]),
        Line::from(Span::styled(
            format!(" {}", track),
            Style::default().fg(if window.is_live() {
                app.theme.healthy
            } else {
                app.theme.warning
            }),
        )),
        Line::from(Span::styled(
            format!(" {}", ruler(window, buffer, width)),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(app.theme.border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// A track of `width` cells with a knob at `progress` (0.0 to 1.0).
fn scrub_track(progress: f64, width: usize) -> String {
    if width < 2 {
        return String::new();
    }
    let knob = (progress.clamp(0.0, 1.0) * (width - 1) as f64).round() as usize;
    (0..width)
        .map(|i| if i == knob { '●' } else { '─' })
        .collect()
}

/// Time labels spread evenly across the whole buffer.
fn ruler(window: &WindowController, buffer: &SeriesBuffer, width: usize) -> String {
    if buffer.is_empty() || width == 0 {
        return String::new();
    }
    let mut line = vec![' '; width];
    let last = buffer.len() - 1;

    for tick in 0..RULER_TICKS {
        let index = last * tick / (RULER_TICKS - 1);
        let Some(label) = window.label_at(buffer, index) else {
            continue;
        };
        let label: Vec<char> = label.chars().collect();
        let anchor = (width - 1) * tick / (RULER_TICKS - 1);
        let begin = anchor
            .saturating_sub(label.len() / 2)
            .min(width.saturating_sub(label.len()));
        // Skip labels that would overwrite the previous one
        if line[begin..(begin + label.len()).min(width)].iter().any(|c| *c != ' ') {
            continue;
        }
        for (offset, c) in label.into_iter().enumerate() {
            if let Some(cell) = line.get_mut(begin + offset) {
                *cell = c;
            }
        }
    }
    line.into_iter().collect()
}

fn render_waterfall(frame: &mut Frame, app: &App, timing: &ProbeTiming, area: Rect) {
    let total = timing.total();
    let label_width = 10;
    let value_width = 10;
    let bar_width = (area.width as usize).saturating_sub(label_width + value_width + 4);

    let mut lines = Vec::with_capacity(6);
    let mut elapsed = 0.0;
    for (name, ms) in timing.phases() {
        let (offset, len) = if total > 0.0 {
            let offset = ((elapsed / total) * bar_width as f64).round() as usize;
            let len = ((ms / total) * bar_width as f64).round().max(1.0) as usize;
            (offset.min(bar_width), len.min(bar_width.saturating_sub(offset)))
        } else {
            (0, 0)
        };
        elapsed += ms;

        lines.push(Line::from(vec![
            Span::raw(format!(" {:<width$}", name, width = label_width)),
            Span::raw(" ".repeat(offset)),
            Span::styled("█".repeat(len), Style::default().fg(app.theme.series)),
            Span::raw(" ".repeat(bar_width - offset - len)),
            Span::raw(format!(" {:>8} ms", format_value(ms))),
        ]));
    }

    let block = Block::default()
        .title(format!(" Timing ({} ms) ", format_value(total)))
        .borders(Borders::TOP)
        .border_style(Style::default().fg(app.theme.border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
