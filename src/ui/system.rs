//! System view rendering.
//!
//! One widget per host metric: current value, gauge, alert limit, and a
//! sparkline of the most recent samples.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::{SampleValue, SeriesKey, SystemMetric};

use super::common::{bar, format_value, sample_sparkline};

/// Samples shown in each widget's sparkline.
const SPARKLINE_SAMPLES: usize = 40;

/// Render the System view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut constraints = vec![Constraint::Length(1)];
    constraints.extend(SystemMetric::ALL.iter().map(|_| Constraint::Min(4)));
    let chunks = Layout::vertical(constraints).split(area);

    render_host_line(frame, app, chunks[0]);
    for (i, metric) in SystemMetric::ALL.into_iter().enumerate() {
        render_metric(frame, app, metric, i == app.selected_metric, chunks[i + 1]);
    }
}

fn render_host_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.session.latest_system() {
        Some(stats) => {
            let mut spans = vec![Span::raw(" Host")];
            if let Some(os) = &stats.os {
                spans.push(Span::raw(format!(" │ {}", os)));
            }
            if let Some(uptime) = stats.uptime_label() {
                spans.push(Span::raw(format!(" │ up {}", uptime)));
            }
            Line::from(spans)
        }
        None => Line::from(Span::styled(
            " Waiting for host metrics...",
            Style::default().add_modifier(Modifier::DIM),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_metric(frame: &mut Frame, app: &App, metric: SystemMetric, selected: bool, area: Rect) {
    let thresholds = app.session.thresholds();
    let breached = thresholds.is_metric_breached(metric);
    let limit = thresholds.limit(metric);

    let border_style = if breached {
        app.theme.breach_style()
    } else if selected {
        Style::default().fg(app.theme.highlight)
    } else {
        Style::default().fg(app.theme.border)
    };

    let mut title = vec![Span::styled(
        format!(" {} ", metric.label()),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if limit > 0.0 {
        title.push(Span::raw(format!("limit {}{} ", format_value(limit), metric.unit())));
    }
    if breached {
        title.push(Span::styled("⚠ ALERT ", app.theme.breach_style()));
    }

    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(border_style);

    let inner_width = area.width.saturating_sub(2) as usize;
    let mut lines = Vec::with_capacity(2);

    match app.session.latest_system() {
        Some(stats) => {
            let value = metric.value(stats);
            let value_text = match value {
                SampleValue::Threads(counts) => format!(
                    "{} threads  R:{} S:{} Z:{}",
                    counts.total,
                    counts.running,
                    counts.sleeping,
                    counts.zombie
                ),
                SampleValue::Scalar(v) => format!("{} {}", format_value(v), metric.unit()),
            };
            let value_style = if breached {
                app.theme.breach_style()
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };

            let gauge = metric.gauge(stats);
            let gauge_width = inner_width.saturating_sub(value_text.len() + 10).min(30);
            let mut spans = vec![Span::styled(format!(" {:<24}", value_text), value_style)];
            if gauge_width > 0 && metric != SystemMetric::Threads {
                spans.push(Span::styled(
                    bar(gauge, gauge_width),
                    Style::default().fg(app.theme.series),
                ));
                spans.push(Span::raw(format!(" {:>3.0}%", gauge)));
            } else if metric == SystemMetric::Threads && stats.threads.is_warning {
                spans.push(Span::styled("zombie threads", Style::default().fg(app.theme.warning)));
            }
            lines.push(Line::from(spans));
        }
        None => lines.push(Line::from(Span::styled(
            " -",
            Style::default().add_modifier(Modifier::DIM),
        ))),
    }

    let key = SeriesKey::System(metric);
    if let Some(view) = app.session.view(&key) {
        let samples = view.buffer.tail(SPARKLINE_SAMPLES.min(inner_width.saturating_sub(1)));
        lines.push(Line::from(Span::styled(
            format!(" {}", sample_sparkline(&samples)),
            Style::default().fg(app.theme.series),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
