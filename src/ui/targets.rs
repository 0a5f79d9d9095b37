//! Targets view rendering.
//!
//! Displays probed URLs grouped under their closest parent URL, with the
//! latest probe result and a latency trend.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::SeriesKey;

use super::common::{format_value, sample_sparkline};

/// Samples shown in the trend column.
const TREND_SAMPLES: usize = 12;

/// Render the Targets view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.target_rows();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if rows.is_empty() {
        let hint = if app.api_error.is_some() {
            " Target list unavailable (r to retry)"
        } else {
            " No targets yet (a to add)"
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().add_modifier(Modifier::DIM),
        )))
        .block(block.title(" Targets "));
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("URL"),
        Cell::from("Every"),
        Cell::from("Status"),
        Cell::from("Code"),
        Cell::from("Latency"),
        Cell::from("Trend"),
    ])
    .height(1)
    .style(app.theme.header);

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            let target = row.target;
            let url = if row.child {
                format!("  └ {}", target.url)
            } else {
                target.url.clone()
            };
            let url_cell = if target.is_active {
                Cell::from(url)
            } else {
                Cell::from(url).style(Style::default().add_modifier(Modifier::DIM))
            };

            let result = app.session.latest_result(&target.id);
            let (status, code, latency) = match result {
                Some(r) => (
                    Cell::from(if r.status.is_empty() {
                        "-".to_string()
                    } else {
                        r.status.clone()
                    })
                    .style(app.theme.up_style(r.is_up())),
                    Cell::from(if r.code == 0 {
                        "-".to_string()
                    } else {
                        r.code.to_string()
                    }),
                    Cell::from(format!("{} ms", format_value(r.latency)))
                        .style(app.theme.grade_style(r.grade())),
                ),
                None => (Cell::from("-"), Cell::from("-"), Cell::from("-")),
            };

            let trend = app
                .session
                .view(&SeriesKey::target(target.id.clone()))
                .map(|view| sample_sparkline(&view.buffer.tail(TREND_SAMPLES)))
                .unwrap_or_default();

            Row::new(vec![
                url_cell,
                Cell::from(format!("{}s", target.interval_seconds)),
                status,
                code,
                latency,
                Cell::from(trend).style(Style::default().fg(app.theme.series)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(4),                      // URL - gets the largest share
        Constraint::Length(6),                    // Interval
        Constraint::Fill(1),                      // Status
        Constraint::Length(5),                    // Code
        Constraint::Length(10),                   // Latency
        Constraint::Length(TREND_SAMPLES as u16), // Trend
    ];

    let selected = app.selected_target.min(rows.len().saturating_sub(1));
    let delete_hint = if app.pending_delete.is_some() {
        " [d again to delete]"
    } else {
        ""
    };
    let title = format!(
        " Targets ({} in {} groups) [{}/{}]{} ",
        rows.len(),
        app.session.groups().len(),
        selected + 1,
        rows.len(),
        delete_hint
    );

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(block.title(title))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}
