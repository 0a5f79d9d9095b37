//! Application state and navigation logic.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::data::{DashboardSession, MonitorTarget, SeriesKey, SeriesView, SystemMetric};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::source::EventSource;
use crate::ui::Theme;

/// Default target list refresh interval.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(10);

/// Probe interval used when the add-target input gives none.
pub const DEFAULT_PROBE_INTERVAL: u32 = 5;

/// Upper bound on push frames applied per tick, so a burst cannot starve
/// input handling.
const MAX_FRAMES_PER_TICK: usize = 512;

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
///
/// Series detail is shown as an overlay (controlled by
/// `App::show_detail_overlay`) rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Host metrics: CPU, RAM, Disk, Network, Threads.
    System,
    /// Probed URLs, grouped by path prefix.
    Targets,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::System => View::Targets,
            View::Targets => View::System,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        // Two views: previous and next coincide
        self.next()
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::System => "System",
            View::Targets => "Targets",
        }
    }
}

/// What the text input line is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// A new alert limit for a metric.
    Threshold(SystemMetric),
    /// `<url> [interval seconds]` for a new target.
    AddTarget,
}

impl InputMode {
    pub fn prompt(&self) -> String {
        match self {
            InputMode::Threshold(metric) => {
                format!("{} limit ({}, 0 disables)", metric.label(), metric.unit())
            }
            InputMode::AddTarget => "URL [interval s]".to_string(),
        }
    }
}

/// One row of the targets table.
#[derive(Debug, Clone, Copy)]
pub struct TargetRow<'a> {
    pub target: &'a MonitorTarget,
    /// Nested under the preceding parent row.
    pub child: bool,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Data
    source: Box<dyn EventSource>,
    fetcher: Option<Fetcher>,
    pub session: DashboardSession,
    pub link_error: Option<String>,
    pub api_error: Option<String>,
    awaiting_reconnect: bool,

    // Target list polling
    refresh_interval: Duration,
    last_refresh: Option<Instant>,

    // Navigation state
    pub selected_metric: usize,
    pub selected_target: usize,

    // Text input
    pub input: Option<InputMode>,
    pub input_text: String,
    pub pending_delete: Option<String>,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading push frames from `source`.
    ///
    /// Mounts the system views. Without a fetcher the app runs on push data
    /// alone.
    pub fn new(source: Box<dyn EventSource>, mut session: DashboardSession) -> Self {
        session.mount_system();
        Self {
            running: true,
            current_view: View::System,
            show_help: false,
            show_detail_overlay: false,
            source,
            fetcher: None,
            session,
            link_error: None,
            api_error: None,
            awaiting_reconnect: false,
            refresh_interval: DEFAULT_REFRESH,
            last_refresh: None,
            selected_metric: 0,
            selected_target: 0,
            input: None,
            input_text: String::new(),
            pending_delete: None,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    /// Use `fetcher` for history, the target list and mutations.
    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Kick off the initial fetches: system history and the target list.
    pub fn start(&mut self) {
        let tokens = self.session.tokens_awaiting_history();
        if let Some(fetcher) = self.fetcher.as_mut() {
            fetcher.request_system_history(tokens);
            fetcher.request_targets();
        }
        self.last_refresh = Some(Instant::now());
    }

    /// Returns a description of the current push source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_TTL {
                return Some(msg);
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Apply everything that arrived since the last tick.
    ///
    /// Returns true if any state changed.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Local::now())
    }

    /// Same as [`tick`](Self::tick), stamping push samples with `now`.
    pub fn tick_at(&mut self, now: DateTime<Local>) -> bool {
        let mut changed = self.drain_source(now);
        changed |= self.track_link();
        changed |= self.drain_fetcher();

        let due = self
            .last_refresh
            .is_some_and(|at| at.elapsed() >= self.refresh_interval);
        if due {
            self.refresh_targets();
        }
        changed
    }

    fn drain_source(&mut self, now: DateTime<Local>) -> bool {
        let budget = if self.source.is_paced() {
            1
        } else {
            MAX_FRAMES_PER_TICK
        };
        let mut applied = 0;
        for _ in 0..budget {
            let Some(frame) = self.source.poll() else {
                break;
            };
            if self.session.ingest_at(&frame, now).is_some() {
                applied += 1;
            }
        }
        applied > 0
    }

    /// Follow the source's link state into the session.
    fn track_link(&mut self) -> bool {
        let up = self.source.is_connected();
        if up == self.session.is_connected() {
            return false;
        }

        if up {
            self.session.on_connected();
            self.link_error = None;
            if self.awaiting_reconnect {
                self.awaiting_reconnect = false;
                self.refetch_history();
            }
            self.set_status_message(format!("Connected to {}", self.source.description()));
        } else {
            self.session.on_disconnected();
            self.awaiting_reconnect = true;
            let error = self
                .source
                .error()
                .unwrap_or_else(|| "Connection lost".to_string());
            warn!(source = %self.source.description(), error = %error, "Push channel down");
            self.set_status_message(format!("Disconnected: {}", error));
            self.link_error = Some(error);
        }
        true
    }

    /// Re-request history for views the last connection never filled.
    fn refetch_history(&mut self) {
        let Some(fetcher) = self.fetcher.as_mut() else {
            return;
        };
        let (system, targets): (Vec<_>, Vec<_>) = self
            .session
            .tokens_awaiting_history()
            .into_iter()
            .partition(|t| matches!(t.key(), SeriesKey::System(_)));

        if !system.is_empty() {
            fetcher.request_system_history(system);
        }
        for token in targets {
            if let SeriesKey::Target(id) = token.key() {
                let id = id.clone();
                fetcher.request_target_history(token, id);
            }
        }
    }

    fn drain_fetcher(&mut self) -> bool {
        let mut outcomes = Vec::new();
        if let Some(fetcher) = self.fetcher.as_mut() {
            while let Some(outcome) = fetcher.poll() {
                outcomes.push(outcome);
            }
        }
        let changed = !outcomes.is_empty();
        for outcome in outcomes {
            self.apply_outcome(outcome);
        }
        changed
    }

    /// Apply one finished API call.
    pub fn apply_outcome(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Targets(Ok(targets)) => {
                self.api_error = None;
                let tokens = self.session.sync_targets(targets);
                if let Some(fetcher) = self.fetcher.as_ref() {
                    for token in tokens {
                        if let SeriesKey::Target(id) = token.key() {
                            let id = id.clone();
                            fetcher.request_target_history(token, id);
                        }
                    }
                }
                self.clamp_selection();
            }
            FetchOutcome::Targets(Err(e)) => {
                warn!(error = %e, "Target list refresh failed");
                self.api_error = Some(e.to_string());
            }
            FetchOutcome::SystemHistory { tokens, result } => match result {
                Ok(Some(history)) => {
                    let applied = self.session.apply_system_history(&tokens, history);
                    debug!(applied, "System history delivered");
                }
                Ok(None) => debug!("Server has no system history yet"),
                Err(e) => {
                    warn!(error = %e, "System history fetch failed");
                    self.api_error = Some(e.to_string());
                }
            },
            FetchOutcome::TargetHistory { token, result } => match result {
                Ok(records) => {
                    self.session.apply_target_history(&token, records);
                }
                Err(e) => {
                    warn!(series = %token.key(), error = %e, "Target history fetch failed");
                    if e.is_transport() {
                        self.api_error = Some(e.to_string());
                    }
                }
            },
            FetchOutcome::Created(result) => match result {
                Ok(target) => {
                    info!(url = %target.url, "Target created");
                    self.set_status_message(format!("Added {}", target.url));
                    self.refresh_targets();
                }
                Err(e) => {
                    warn!(error = %e, "Create target failed");
                    self.set_status_message(format!("Add failed: {}", e));
                }
            },
            FetchOutcome::Deleted { id, result } => match result {
                Ok(()) => {
                    info!(id = %id, "Target deleted");
                    self.set_status_message("Target deleted".to_string());
                    self.refresh_targets();
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Delete target failed");
                    self.set_status_message(format!("Delete failed: {}", e));
                }
            },
        }
    }

    /// Request a fresh target list now.
    pub fn refresh_targets(&mut self) {
        self.last_refresh = Some(Instant::now());
        if let Some(fetcher) = self.fetcher.as_mut() {
            fetcher.request_targets();
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.show_detail_overlay = false;
        self.pending_delete = None;
    }

    /// Targets in display order: each parent followed by its children.
    pub fn target_rows(&self) -> Vec<TargetRow<'_>> {
        let mut rows = Vec::with_capacity(self.session.targets().len());
        for group in self.session.groups() {
            rows.push(TargetRow {
                target: &group.parent,
                child: false,
            });
            rows.extend(group.children.iter().map(|target| TargetRow {
                target,
                child: true,
            }));
        }
        rows
    }

    fn row_count(&self) -> usize {
        match self.current_view {
            View::System => SystemMetric::ALL.len(),
            View::Targets => self.session.targets().len(),
        }
    }

    fn selection_mut(&mut self) -> &mut usize {
        match self.current_view {
            View::System => &mut self.selected_metric,
            View::Targets => &mut self.selected_target,
        }
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.row_count().saturating_sub(1);
        let selected = self.selection_mut();
        *selected = selected.saturating_add(n).min(max);
        self.pending_delete = None;
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        let selected = self.selection_mut();
        *selected = selected.saturating_sub(n);
        self.pending_delete = None;
    }

    fn clamp_selection(&mut self) {
        let max = self.session.targets().len().saturating_sub(1);
        self.selected_target = self.selected_target.min(max);
    }

    pub fn selected_system_metric(&self) -> SystemMetric {
        SystemMetric::ALL[self.selected_metric.min(SystemMetric::ALL.len() - 1)]
    }

    /// The target under the selection in the Targets view.
    pub fn selected_target(&self) -> Option<&MonitorTarget> {
        self.target_rows()
            .get(self.selected_target)
            .map(|row| row.target)
    }

    /// The series the detail overlay shows.
    pub fn selected_series(&self) -> Option<SeriesKey> {
        match self.current_view {
            View::System => Some(SeriesKey::System(self.selected_system_metric())),
            View::Targets => self
                .selected_target()
                .map(|t| SeriesKey::target(t.id.clone())),
        }
    }

    pub fn selected_view(&self) -> Option<&SeriesView> {
        self.selected_series().and_then(|key| self.session.view(&key))
    }

    /// Open the detail overlay for the current selection.
    pub fn enter_detail(&mut self) {
        if self.selected_series().is_some() {
            self.show_detail_overlay = true;
        }
    }

    /// Navigate back: close the overlay first, then return to System.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
            return;
        }
        if self.pending_delete.take().is_some() {
            return;
        }
        self.current_view = View::System;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ------------------------------------------------------------------
    // Scrubbing
    // ------------------------------------------------------------------

    fn with_selected_window(&mut self, f: impl FnOnce(&mut crate::data::WindowController)) {
        if let Some(key) = self.selected_series() {
            if let Some(view) = self.session.view_mut(&key) {
                f(&mut view.window);
            }
        }
    }

    /// Move the detail window by `delta` samples (negative is older).
    pub fn scrub_by(&mut self, delta: i64) {
        self.with_selected_window(|w| w.scrub_by(delta));
    }

    pub fn scrub_to_oldest(&mut self) {
        self.with_selected_window(|w| w.jump_to_oldest());
    }

    pub fn scrub_to_live(&mut self) {
        self.with_selected_window(|w| w.jump_to_live());
    }

    // ------------------------------------------------------------------
    // Text input
    // ------------------------------------------------------------------

    /// Start editing the limit of the selected system metric.
    pub fn start_threshold_input(&mut self) {
        if self.current_view != View::System {
            return;
        }
        let metric = self.selected_system_metric();
        let limit = self.session.thresholds().limit(metric);
        self.input_text = if limit > 0.0 {
            format!("{}", limit)
        } else {
            String::new()
        };
        self.input = Some(InputMode::Threshold(metric));
    }

    /// Start entering a new target.
    pub fn start_add_target(&mut self) {
        if self.fetcher.is_none() {
            self.set_status_message("No API configured".to_string());
            return;
        }
        self.input_text.clear();
        self.input = Some(InputMode::AddTarget);
    }

    /// Leave input mode, discarding the text.
    pub fn cancel_input(&mut self) {
        self.input = None;
        self.input_text.clear();
    }

    /// Append a character to the input text.
    pub fn input_push(&mut self, c: char) {
        self.input_text.push(c);
    }

    /// Remove the last character from the input text.
    pub fn input_pop(&mut self) {
        self.input_text.pop();
    }

    /// Act on the input text and leave input mode.
    pub fn submit_input(&mut self) {
        let Some(mode) = self.input.take() else {
            return;
        };
        let text = std::mem::take(&mut self.input_text);
        match mode {
            InputMode::Threshold(metric) => self.submit_threshold(metric, &text),
            InputMode::AddTarget => self.submit_target(&text),
        }
    }

    fn submit_threshold(&mut self, metric: SystemMetric, text: &str) {
        let text = text.trim();
        let limit = if text.is_empty() {
            0.0
        } else {
            match text.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                _ => {
                    self.set_status_message(format!("Invalid limit: {}", text));
                    return;
                }
            }
        };
        match self.session.set_limit(metric, limit) {
            Ok(()) if limit > 0.0 => {
                self.set_status_message(format!("{} limit set to {}", metric.label(), limit))
            }
            Ok(()) => self.set_status_message(format!("{} alert disabled", metric.label())),
            Err(e) => {
                warn!(metric = %metric, error = %e, "Saving limit failed");
                self.set_status_message(format!("Could not save limit: {}", e));
            }
        }
    }

    fn submit_target(&mut self, text: &str) {
        match parse_target_input(text) {
            Ok((url, interval)) => {
                if let Some(fetcher) = self.fetcher.as_ref() {
                    fetcher.create_target(url.clone(), interval);
                    self.set_status_message(format!("Adding {}...", url));
                }
            }
            Err(msg) => self.set_status_message(msg),
        }
    }

    /// First press arms deletion of the selected target, the second confirms.
    pub fn request_delete(&mut self) {
        if self.current_view != View::Targets || self.fetcher.is_none() {
            return;
        }
        let Some(target) = self.selected_target() else {
            return;
        };
        let (id, url) = (target.id.clone(), target.url.clone());

        if self.pending_delete.as_deref() == Some(id.as_str()) {
            self.pending_delete = None;
            if let Some(fetcher) = self.fetcher.as_ref() {
                fetcher.delete_target(id);
            }
            self.set_status_message(format!("Deleting {}...", url));
        } else {
            self.pending_delete = Some(id);
            self.set_status_message(format!("Press d again to delete {}", url));
        }
    }

    /// Signal the application to quit and release all views.
    pub fn quit(&mut self) {
        self.running = false;
        self.session.teardown();
    }
}

/// Parse `<url> [interval seconds]`.
pub fn parse_target_input(text: &str) -> Result<(String, u32), String> {
    let mut parts = text.split_whitespace();
    let Some(url) = parts.next() else {
        return Err("URL is required".to_string());
    };
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!("URL must start with http:// or https://: {}", url));
    }
    let interval = match parts.next() {
        None => DEFAULT_PROBE_INTERVAL,
        Some(s) => match s.trim_end_matches('s').parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => return Err(format!("Invalid interval: {}", s)),
        },
    };
    if parts.next().is_some() {
        return Err("Expected: <url> [interval]".to_string());
    }
    Ok((url.to_string(), interval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ThresholdMonitor;
    use crate::source::ChannelSource;
    use crate::store::MemoryStore;
    use tokio::sync::mpsc::Sender;

    const SNAPSHOT: &str = r#"{"type":"system","data":{"cpu":{"percent":42.0},"memory":{"percent":50,"used":8,"total":16}}}"#;

    fn app() -> (Sender<String>, App) {
        let (tx, source) = ChannelSource::create("test");
        let session = DashboardSession::new(ThresholdMonitor::new(Box::new(MemoryStore::new())));
        (tx, App::new(Box::new(source), session))
    }

    fn target(id: &str, url: &str) -> MonitorTarget {
        MonitorTarget {
            id: id.into(),
            url: url.into(),
            interval_seconds: 5,
            is_active: true,
        }
    }

    #[test]
    fn view_cycles() {
        assert_eq!(View::System.next(), View::Targets);
        assert_eq!(View::Targets.next(), View::System);
        assert_eq!(View::System.prev(), View::Targets);
    }

    #[test]
    fn tick_feeds_push_frames_into_views() {
        let (tx, mut app) = app();
        tx.try_send(SNAPSHOT.to_string()).unwrap();
        tx.try_send("not json".to_string()).unwrap();

        assert!(app.tick());
        assert!(app.session.is_connected());
        let cpu = app.session.view(&SeriesKey::System(SystemMetric::Cpu)).unwrap();
        assert_eq!(cpu.buffer.len(), 1);
        assert_eq!(app.session.router().dropped(), 1);
    }

    #[test]
    fn replay_yields_one_sample_per_tick() {
        use crate::source::FileSource;
        use chrono::TimeZone;
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..20 {
            writeln!(file, r#"{{"type":"system","data":{{"cpu":{{"percent":{}}}}}}}"#, i).unwrap();
        }
        let source = FileSource::new(file.path()).with_interval(Duration::ZERO);
        let session = DashboardSession::new(ThresholdMonitor::new(Box::new(MemoryStore::new())));
        let mut app = App::new(Box::new(source), session);

        let start = Local.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
        app.tick_at(start);
        let cpu = SeriesKey::System(SystemMetric::Cpu);
        assert_eq!(app.session.view(&cpu).unwrap().buffer.len(), 1);

        for i in 1..20 {
            app.tick_at(start + chrono::Duration::seconds(i));
        }
        let values: Vec<f64> = app
            .session
            .view(&cpu)
            .unwrap()
            .buffer
            .iter()
            .map(|s| s.value.as_f64())
            .collect();
        assert_eq!(values, (0..20).map(f64::from).collect::<Vec<_>>());
        assert_eq!(app.session.router().accepted(), 20);
    }

    #[test]
    fn closed_source_disconnects_session() {
        let (tx, mut app) = app();
        app.tick();
        assert!(app.session.is_connected());

        drop(tx);
        app.tick();
        assert!(!app.session.is_connected());
        assert_eq!(app.link_error.as_deref(), Some("Channel closed"));
    }

    #[test]
    fn target_rows_follow_groups() {
        let (_tx, mut app) = app();
        app.apply_outcome(FetchOutcome::Targets(Ok(vec![
            target("b", "http://x.com/api"),
            target("a", "http://x.com"),
            target("c", "http://y.com"),
        ])));

        let rows: Vec<(&str, bool)> = app
            .target_rows()
            .iter()
            .map(|r| (r.target.id.as_str(), r.child))
            .collect();
        assert_eq!(rows, vec![("a", false), ("b", true), ("c", false)]);

        app.set_view(View::Targets);
        app.select_next_n(10);
        assert_eq!(app.selected_target().map(|t| t.id.as_str()), Some("c"));
        assert_eq!(app.selected_series(), Some(SeriesKey::target("c")));
    }

    #[test]
    fn shrinking_target_list_clamps_selection() {
        let (_tx, mut app) = app();
        app.apply_outcome(FetchOutcome::Targets(Ok(vec![
            target("a", "http://a.io"),
            target("b", "http://b.io"),
        ])));
        app.set_view(View::Targets);
        app.select_next();
        assert_eq!(app.selected_target, 1);

        app.apply_outcome(FetchOutcome::Targets(Ok(vec![target("a", "http://a.io")])));
        assert_eq!(app.selected_target, 0);
    }

    #[test]
    fn threshold_input_sets_limit() {
        let (tx, mut app) = app();
        tx.try_send(SNAPSHOT.to_string()).unwrap();
        app.tick();

        app.start_threshold_input();
        assert_eq!(app.input, Some(InputMode::Threshold(SystemMetric::Cpu)));
        for c in "40".chars() {
            app.input_push(c);
        }
        app.submit_input();

        assert!(app.input.is_none());
        assert_eq!(app.session.thresholds().limit(SystemMetric::Cpu), 40.0);
        assert!(app.session.thresholds().is_metric_breached(SystemMetric::Cpu));
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let (_tx, mut app) = app();
        app.start_threshold_input();
        app.input_text = "-3".into();
        app.submit_input();
        assert_eq!(app.session.thresholds().limit(SystemMetric::Cpu), 0.0);
        assert!(app.get_status_message().unwrap().contains("Invalid limit"));
    }

    #[test]
    fn scrub_moves_selected_window() {
        let (tx, mut app) = app();
        app.apply_outcome(FetchOutcome::Targets(Ok(vec![target("a", "http://a.io")])));
        for i in 0..60 {
            let frame = format!(
                r#"{{"type":"target_update","data":{{"target_id":"a","latency":{}}}}}"#,
                i
            );
            tx.try_send(frame).unwrap();
        }
        app.tick();
        app.set_view(View::Targets);
        app.enter_detail();
        assert!(app.show_detail_overlay);

        let key = SeriesKey::target("a");
        let window = |app: &App| app.session.view(&key).unwrap().window.clone();
        assert!(window(&app).is_live());
        assert_eq!(window(&app).cursor(), 20);

        app.scrub_to_oldest();
        assert_eq!(window(&app).cursor(), 0);
        assert!(!window(&app).is_live());

        app.scrub_by(5);
        assert_eq!(window(&app).cursor(), 5);

        app.scrub_to_live();
        assert!(window(&app).is_live());
        assert_eq!(window(&app).cursor(), 20);

        app.go_back();
        assert!(!app.show_detail_overlay);
    }

    #[test]
    fn parses_target_input() {
        assert_eq!(
            parse_target_input("https://a.io"),
            Ok(("https://a.io".to_string(), DEFAULT_PROBE_INTERVAL))
        );
        assert_eq!(
            parse_target_input("http://a.io 30s"),
            Ok(("http://a.io".to_string(), 30))
        );
        assert!(parse_target_input("").is_err());
        assert!(parse_target_input("a.io").is_err());
        assert!(parse_target_input("http://a.io 0").is_err());
    }

    #[test]
    fn quit_tears_down_session() {
        let (_tx, mut app) = app();
        app.quit();
        assert!(!app.running);
        assert!(!app.session.is_mounted(&SeriesKey::System(SystemMetric::Cpu)));
    }
}
