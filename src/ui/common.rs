//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, input prompt,
//! help overlay, and small formatting helpers.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::Sample;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the header bar with connection state and alert overview.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (status_icon, status_style, status_label) = if app.session.is_connected() {
        ("●", Style::default().fg(app.theme.healthy), "LIVE")
    } else {
        (
            "●",
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
            "OFFLINE",
        )
    };

    let breached = app.session.thresholds().breached_metrics();
    let targets = app.session.targets();
    let down = targets
        .iter()
        .filter(|t| {
            app.session
                .latest_result(&t.id)
                .is_some_and(|r| !r.is_up())
        })
        .count();

    let mut spans = vec![
        Span::styled(format!(" {} ", status_icon), status_style),
        Span::styled("PULSAR ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(status_label, status_style),
        Span::raw(" │ "),
    ];

    if breached.is_empty() {
        spans.push(Span::styled("0", Style::default().add_modifier(Modifier::DIM)));
        spans.push(Span::raw(" alerts"));
    } else {
        let names: Vec<&str> = breached.iter().map(|m| m.label()).collect();
        spans.push(Span::styled(
            format!("{} alert{}: {}", breached.len(), plural(breached.len()), names.join(", ")),
            app.theme.breach_style(),
        ));
    }

    spans.push(Span::raw(" │ "));
    spans.push(Span::styled(
        format!("{}", targets.len()),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::raw(" targets "));
    if down > 0 {
        spans.push(Span::styled(format!("{} down", down), app.theme.up_style(false)));
    } else {
        spans.push(Span::styled("0 down", Style::default().add_modifier(Modifier::DIM)));
    }

    if let Some(err) = &app.api_error {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("API: {}", err),
            Style::default().fg(app.theme.warning),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![Line::from(" 1:System "), Line::from(" 2:Targets ")];

    let selected = match app.current_view {
        View::System => 0,
        View::Targets => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the push source, last error, and the controls for the current
/// context. Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.input.is_some() {
        "Type value | Enter:apply Esc:cancel"
    } else if app.show_detail_overlay {
        "←/→:scrub PgUp/PgDn:±10 Home:oldest End:live ↑↓:series t:limit Esc:close"
    } else {
        match app.current_view {
            View::System => "↑↓:select Enter:detail t:limit Tab:switch ?:help q:quit",
            View::Targets => "↑↓:select Enter:detail a:add d:delete r:refresh ?:help q:quit",
        }
    };

    let link = match &app.link_error {
        Some(err) => format!("{} ({})", app.source_description(), err),
        None => app.source_description().to_string(),
    };

    let status = format!(" {} | {} | {}", app.current_view.label(), link, controls);
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the single-line input prompt as a small modal.
pub fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let Some(mode) = app.input else {
        return;
    };

    let width = 60u16.min(area.width.saturating_sub(4));
    let height = 3u16;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let input_area = Rect::new(x, y, width, height);

    let block = Block::default()
        .title(format!(" {} ", mode.prompt()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let line = Line::from(vec![
        Span::raw(" "),
        Span::raw(app.input_text.as_str()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]);

    frame.render_widget(Clear, input_area);
    frame.render_widget(Paragraph::new(line).block(block), input_area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab 1/2     Switch views"),
        Line::from("  ↑/↓ j/k     Select metric or target"),
        Line::from("  Enter       Open detail chart"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        section(" Detail chart"),
        Line::from("  ←/→         Scrub one sample"),
        Line::from("  PgUp/PgDn   Scrub ten samples"),
        Line::from("  Home/End    Oldest / back to live"),
        Line::from(""),
        section(" Actions"),
        Line::from("  t         Set alert limit (System)"),
        Line::from("  a         Add target"),
        Line::from("  d d       Delete selected target"),
        Line::from("  r         Refresh target list"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 24u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Normalize values to the 0-7 range of the sparkline characters.
///
/// A flat series renders as a row of the lowest bar.
pub fn sparkline(values: &[f64]) -> String {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let range = max - min;

    values
        .iter()
        .map(|&v| {
            let level = if range > 0.0 && v.is_finite() {
                (((v - min) / range) * 7.0).round() as usize
            } else {
                0
            };
            SPARKLINE_CHARS[level.min(7)]
        })
        .collect()
}

/// Sparkline of the scalar values of `samples`.
pub fn sample_sparkline(samples: &[&Sample]) -> String {
    let values: Vec<f64> = samples.iter().map(|s| s.value.as_f64()).collect();
    sparkline(&values)
}

/// Text gauge of `width` cells for a 0-100 percentage.
pub fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Format a value with up to two decimals, trimming trailing zeros.
pub fn format_value(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparkline_spans_full_range() {
        assert_eq!(sparkline(&[0.0, 50.0, 100.0]), "▁▅█");
        assert_eq!(sparkline(&[3.0, 3.0]), "▁▁");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(50.0, 4), "██░░");
        assert_eq!(bar(150.0, 2), "██");
        assert_eq!(bar(-1.0, 2), "░░");
    }

    #[test]
    fn values_keep_two_decimals() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(1.234), "1.23");
        assert_eq!(format_value(0.5), "0.5");
    }
}
