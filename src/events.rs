use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// Samples moved by PgUp/PgDn in the detail overlay.
const SCRUB_PAGE: i64 = 10;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Text entry swallows everything else
    if app.input.is_some() {
        handle_text_input(app, key);
        return;
    }

    // If detail overlay is shown, handle scrub keys
    if app.show_detail_overlay {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.go_back();
            }
            KeyCode::Left | KeyCode::Char('h') => app.scrub_by(-1),
            KeyCode::Right | KeyCode::Char('l') => app.scrub_by(1),
            KeyCode::PageUp => app.scrub_by(-SCRUB_PAGE),
            KeyCode::PageDown => app.scrub_by(SCRUB_PAGE),
            KeyCode::Home => app.scrub_to_oldest(),
            KeyCode::End => app.scrub_to_live(),
            // Allow moving between series while the overlay is open
            KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Char('t') => app.start_threshold_input(),
            KeyCode::Char('?') => app.toggle_help(),
            _ => {}
        }
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab | KeyCode::BackTab => app.next_view(),
        KeyCode::Char('1') => app.set_view(View::System),
        KeyCode::Char('2') => app.set_view(View::Targets),
        KeyCode::Left => app.prev_view(),
        KeyCode::Right => app.next_view(),

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_prev_n(usize::MAX),
        KeyCode::End => app.select_next_n(usize::MAX),

        // Enter detail overlay
        KeyCode::Enter => app.enter_detail(),

        // Go back (Esc and Backspace)
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        // Target list
        KeyCode::Char('r') => {
            app.refresh_targets();
            app.set_status_message("Refreshing targets...".to_string());
        }
        KeyCode::Char('a') => app.start_add_target(),
        KeyCode::Char('d') => app.request_delete(),

        // Alert limit of the selected metric
        KeyCode::Char('t') => app.start_threshold_input(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}

/// Handle key input while a prompt is open
fn handle_text_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_input(),
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Backspace => app.input_pop(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.input_text.clear();
        }
        KeyCode::Char(c) => app.input_push(c),
        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel scrubs the overlay, otherwise moves the selection
        MouseEventKind::ScrollUp => {
            if app.show_detail_overlay {
                app.scrub_by(-1);
            } else {
                app.select_prev();
            }
        }
        MouseEventKind::ScrollDown => {
            if app.show_detail_overlay {
                app.scrub_by(1);
            } else {
                app.select_next();
            }
        }

        // Tab clicks (row 1, after header)
        MouseEventKind::Down(MouseButton::Left) if mouse.row == 1 => {
            // Approximate tab positions: System (0-11), Targets (12-24)
            if mouse.column < 12 {
                app.set_view(View::System);
            } else if mouse.column < 25 {
                app.set_view(View::Targets);
            }
        }

        // Right-click goes back
        MouseEventKind::Down(MouseButton::Right) => app.go_back(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::InputMode;
    use crate::data::{DashboardSession, SystemMetric, ThresholdMonitor};
    use crate::source::ChannelSource;
    use crate::store::MemoryStore;

    fn app() -> App {
        let (_tx, source) = ChannelSource::create("test");
        let session = DashboardSession::new(ThresholdMonitor::new(Box::new(MemoryStore::new())));
        App::new(Box::new(source), session)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn number_keys_switch_views() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.current_view, View::Targets);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_view, View::System);
    }

    #[test]
    fn help_swallows_next_key() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn prompt_collects_text_until_enter() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.input, Some(InputMode::Threshold(SystemMetric::Ram)));

        // 'q' is text here, not quit
        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('8'));
        press(&mut app, KeyCode::Enter);

        assert!(app.running);
        assert!(app.input.is_none());
        assert_eq!(app.session.thresholds().limit(SystemMetric::Ram), 8.0);
    }

    #[test]
    fn escape_cancels_prompt() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Char('5'));
        press(&mut app, KeyCode::Esc);
        assert!(app.input.is_none());
        assert_eq!(app.session.thresholds().limit(SystemMetric::Cpu), 0.0);
    }

    #[test]
    fn overlay_keys_scrub_instead_of_switching_views() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert!(app.show_detail_overlay);

        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Home);
        assert_eq!(app.current_view, View::System);
        assert!(app.show_detail_overlay);

        press(&mut app, KeyCode::Esc);
        assert!(!app.show_detail_overlay);
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'));
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(!app.running);
    }
}
