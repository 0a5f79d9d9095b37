//! The dashboard's mutable state.
//!
//! A [`DashboardSession`] owns everything the views read: the latest host
//! snapshot, the latest probe result per target, one mounted
//! [`SeriesView`] per displayed series, and the alert limits. All mutation
//! happens through its methods on a single thread.
//!
//! ## Bulk history and tokens
//!
//! Mounting a series returns a [`ViewToken`]. History fetched for that view
//! is delivered with the token; if the view was unmounted, re-mounted, or the
//! connection dropped in the meantime, the token is stale and the delivery is
//! ignored. Together with the buffer's load-once latch this makes abandoned
//! fetches harmless.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Local};
use tracing::{debug, info};

use super::grouping::{group_targets, MonitorTarget, TargetGroup};
use super::history::{percent_to_absolute, ProbeRecord, SystemHistory, ThreadRecord, HISTORY_ORDER};
use super::metric::{SeriesKey, SystemMetric};
use super::router::{PushEvent, RoutedEvent, UpdateRouter};
use super::sample::{Sample, SampleValue};
use super::series::{SeriesBuffer, DATA_INTERVAL_MS};
use super::stats::{ProbeResult, SystemStats};
use super::threshold::ThresholdMonitor;
use super::window::WindowController;
use crate::store::StoreError;

/// Proof that a history fetch belongs to the current mount of a view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewToken {
    key: SeriesKey,
    epoch: u64,
    generation: u64,
}

impl ViewToken {
    pub fn key(&self) -> &SeriesKey {
        &self.key
    }
}

/// A displayed series: its buffer and scrub window.
#[derive(Debug, Clone)]
pub struct SeriesView {
    pub buffer: SeriesBuffer,
    pub window: WindowController,
    generation: u64,
}

impl SeriesView {
    fn new(key: &SeriesKey, generation: u64) -> Self {
        let buffer = SeriesBuffer::new(key.kind());
        let window = WindowController::for_buffer(&buffer);
        Self {
            buffer,
            window,
            generation,
        }
    }

    pub fn visible(&self) -> Vec<&Sample> {
        self.window.visible_window(&self.buffer)
    }

    fn append(&mut self, sample: Sample) {
        if self.buffer.append(sample) {
            self.window.on_buffer_grow(self.buffer.len());
        }
    }

    fn prepend(&mut self, values: Vec<f64>, now: DateTime<Local>) -> bool {
        let values = values.into_iter().map(SampleValue::from).collect();
        let applied = self.buffer.prepend_at(values, HISTORY_ORDER, now);
        if applied {
            self.window.on_buffer_grow(self.buffer.len());
        }
        applied
    }

    fn prepend_samples(&mut self, samples: Vec<Sample>) -> bool {
        let applied = self.buffer.prepend_samples(samples, HISTORY_ORDER);
        if applied {
            self.window.on_buffer_grow(self.buffer.len());
        }
        applied
    }
}

/// RAM or Disk history waiting for a snapshot that carries the total.
#[derive(Debug, Clone)]
struct PendingPercent {
    token: ViewToken,
    percents: Vec<f64>,
}

/// Session-scoped dashboard state.
#[derive(Debug)]
pub struct DashboardSession {
    views: HashMap<SeriesKey, SeriesView>,
    latest_system: Option<SystemStats>,
    latest_results: HashMap<String, ProbeResult>,
    targets: Vec<MonitorTarget>,
    groups: Vec<TargetGroup>,
    pending: HashMap<SystemMetric, PendingPercent>,
    thresholds: ThresholdMonitor,
    router: UpdateRouter,
    connected: bool,
    epoch: u64,
    next_generation: u64,
}

impl DashboardSession {
    pub fn new(thresholds: ThresholdMonitor) -> Self {
        Self {
            views: HashMap::new(),
            latest_system: None,
            latest_results: HashMap::new(),
            targets: Vec::new(),
            groups: Vec::new(),
            pending: HashMap::new(),
            thresholds,
            router: UpdateRouter::new(),
            connected: false,
            epoch: 0,
            next_generation: 0,
        }
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Register a view for `key`, creating an empty buffer.
    ///
    /// Mounting an already-mounted key keeps its data and returns a token for
    /// the current epoch. System views load their alert limit.
    pub fn mount(&mut self, key: SeriesKey) -> ViewToken {
        let generation = match self.views.get(&key) {
            Some(view) => view.generation,
            None => {
                let generation = self.next_generation;
                self.next_generation += 1;
                if let SeriesKey::System(metric) = key {
                    self.thresholds.load(metric);
                }
                debug!(series = %key, generation, "Mounted series view");
                self.views.insert(key.clone(), SeriesView::new(&key, generation));
                generation
            }
        };
        ViewToken {
            key,
            epoch: self.epoch,
            generation,
        }
    }

    /// Mount every system metric view.
    pub fn mount_system(&mut self) -> Vec<ViewToken> {
        SystemMetric::ALL
            .into_iter()
            .map(|m| self.mount(SeriesKey::System(m)))
            .collect()
    }

    /// Destroy the view for `key` and its buffer.
    pub fn unmount(&mut self, key: &SeriesKey) -> bool {
        if let SeriesKey::System(metric) = key {
            self.pending.remove(metric);
        }
        let removed = self.views.remove(key).is_some();
        if removed {
            debug!(series = %key, "Unmounted series view");
        }
        removed
    }

    pub fn view(&self, key: &SeriesKey) -> Option<&SeriesView> {
        self.views.get(key)
    }

    pub fn view_mut(&mut self, key: &SeriesKey) -> Option<&mut SeriesView> {
        self.views.get_mut(key)
    }

    pub fn is_mounted(&self, key: &SeriesKey) -> bool {
        self.views.contains_key(key)
    }

    /// Fresh tokens for every mounted view that has not been backfilled yet.
    pub fn tokens_awaiting_history(&self) -> Vec<ViewToken> {
        let mut tokens: Vec<ViewToken> = self
            .views
            .iter()
            .filter(|(_, view)| !view.buffer.is_backfilled())
            .map(|(key, view)| ViewToken {
                key: key.clone(),
                epoch: self.epoch,
                generation: view.generation,
            })
            .collect();
        tokens.sort_by_key(|t| t.generation);
        tokens
    }

    /// Whether a history delivery for `token` should still be applied.
    pub fn is_current(&self, token: &ViewToken) -> bool {
        token.epoch == self.epoch
            && self
                .views
                .get(&token.key)
                .is_some_and(|v| v.generation == token.generation)
    }

    // ------------------------------------------------------------------
    // Bulk history
    // ------------------------------------------------------------------

    /// Deliver host history to the system views in `tokens`.
    ///
    /// Returns the number of series that were backfilled now. RAM and Disk
    /// are held until a snapshot supplies their totals.
    pub fn apply_system_history(&mut self, tokens: &[ViewToken], history: SystemHistory) -> usize {
        self.apply_system_history_at(tokens, history, Local::now())
    }

    pub fn apply_system_history_at(
        &mut self,
        tokens: &[ViewToken],
        history: SystemHistory,
        now: DateTime<Local>,
    ) -> usize {
        let SystemHistory {
            cpu,
            ram_percent,
            disk_percent,
            network,
            threads,
        } = history;
        let mut cpu = Some(cpu);
        let mut ram = Some(ram_percent);
        let mut disk = Some(disk_percent);
        let mut network = Some(network);
        let mut threads = Some(threads);

        let mut applied = 0;
        for token in tokens {
            if !self.is_current(token) {
                debug!(series = %token.key, "Ignoring stale system history");
                continue;
            }
            let SeriesKey::System(metric) = token.key else {
                continue;
            };
            let done = match metric {
                SystemMetric::Cpu => self.prepend_values(token, cpu.take(), now),
                SystemMetric::Network => self.prepend_values(token, network.take(), now),
                SystemMetric::Threads => match threads.take() {
                    Some(records) => self.prepend_threads(token, records, now),
                    None => false,
                },
                SystemMetric::Ram | SystemMetric::Disk => {
                    let percents = if metric == SystemMetric::Ram {
                        ram.take()
                    } else {
                        disk.take()
                    };
                    if let Some(percents) = percents.filter(|p| !p.is_empty()) {
                        self.pending.insert(
                            metric,
                            PendingPercent {
                                token: token.clone(),
                                percents,
                            },
                        );
                    }
                    false
                }
            };
            if done {
                applied += 1;
            }
        }

        applied + self.flush_pending(now)
    }

    fn prepend_values(
        &mut self,
        token: &ViewToken,
        values: Option<Vec<f64>>,
        now: DateTime<Local>,
    ) -> bool {
        match (values, self.views.get_mut(&token.key)) {
            (Some(values), Some(view)) => view.prepend(values, now),
            _ => false,
        }
    }

    fn prepend_threads(
        &mut self,
        token: &ViewToken,
        records: Vec<ThreadRecord>,
        now: DateTime<Local>,
    ) -> bool {
        let Some(view) = self.views.get_mut(&token.key) else {
            return false;
        };
        // Newest first: record i is i intervals old unless it carries a time
        let samples = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let fallback = now - Duration::milliseconds(i as i64 * DATA_INTERVAL_MS);
                Sample::new(record.time.unwrap_or(fallback), record.counts)
            })
            .collect();
        view.prepend_samples(samples)
    }

    /// Convert and apply RAM/Disk history whose total is now known.
    fn flush_pending(&mut self, now: DateTime<Local>) -> usize {
        let Some(stats) = &self.latest_system else {
            return 0;
        };
        let totals = [
            (SystemMetric::Ram, stats.memory.total),
            (SystemMetric::Disk, stats.disk.total),
        ];

        let mut applied = 0;
        for (metric, total) in totals {
            let Some(pending) = self.pending.get(&metric) else {
                continue;
            };
            if !self.is_current(&pending.token) {
                self.pending.remove(&metric);
                continue;
            }
            let converted = percent_to_absolute(&pending.percents, total);
            if converted.is_empty() {
                continue;
            }
            if let Some(pending) = self.pending.remove(&metric) {
                if let Some(view) = self.views.get_mut(&pending.token.key) {
                    if view.prepend(converted, now) {
                        debug!(metric = %metric, total, "Applied converted history");
                        applied += 1;
                    }
                }
            }
        }
        applied
    }

    /// Whether RAM or Disk history is waiting for a total.
    pub fn has_pending_history(&self, metric: SystemMetric) -> bool {
        self.pending.contains_key(&metric)
    }

    /// Deliver past probes to a target view.
    pub fn apply_target_history(&mut self, token: &ViewToken, records: Vec<ProbeRecord>) -> bool {
        if !self.is_current(token) {
            debug!(series = %token.key, "Ignoring stale target history");
            return false;
        }
        let Some(view) = self.views.get_mut(&token.key) else {
            return false;
        };
        let samples = records.into_iter().map(ProbeRecord::into_sample).collect();
        view.prepend_samples(samples)
    }

    // ------------------------------------------------------------------
    // Push events
    // ------------------------------------------------------------------

    /// Parse and apply one raw push frame. Malformed frames change nothing.
    pub fn ingest(&mut self, raw: &str) -> Option<RoutedEvent> {
        self.ingest_at(raw, Local::now())
    }

    pub fn ingest_at(&mut self, raw: &str, now: DateTime<Local>) -> Option<RoutedEvent> {
        let event = self.router.route(raw)?;
        Some(self.apply_event_at(event, now))
    }

    /// Apply an already-parsed event.
    pub fn apply_event_at(&mut self, event: PushEvent, now: DateTime<Local>) -> RoutedEvent {
        match event {
            PushEvent::System(stats) => {
                self.thresholds.evaluate_snapshot(&stats);
                for metric in SystemMetric::ALL {
                    if let Some(view) = self.views.get_mut(&SeriesKey::System(metric)) {
                        view.append(Sample::new(now, metric.value(&stats)));
                    }
                }
                self.latest_system = Some(stats);
                self.flush_pending(now);
                RoutedEvent::System
            }
            PushEvent::TargetUpdate(result) => {
                let id = result.target_id.clone();
                if let Some(view) = self.views.get_mut(&SeriesKey::Target(id.clone())) {
                    view.append(Sample::new(now, result.latency).with_meta(result.meta()));
                }
                self.latest_results.insert(id.clone(), result);
                RoutedEvent::Target(id)
            }
        }
    }

    pub fn router(&self) -> &UpdateRouter {
        &self.router
    }

    // ------------------------------------------------------------------
    // Targets
    // ------------------------------------------------------------------

    /// Replace the flat target list and regroup.
    ///
    /// Mounts a view for every new target id and unmounts ids that are gone.
    /// Returns tokens of the newly mounted views.
    pub fn sync_targets(&mut self, targets: Vec<MonitorTarget>) -> Vec<ViewToken> {
        let ids: HashSet<&str> = targets.iter().map(|t| t.id.as_str()).collect();

        let gone: Vec<SeriesKey> = self
            .views
            .keys()
            .filter(|k| matches!(k, SeriesKey::Target(id) if !ids.contains(id.as_str())))
            .cloned()
            .collect();
        for key in gone {
            if let SeriesKey::Target(id) = &key {
                self.latest_results.remove(id);
            }
            self.unmount(&key);
        }

        let mut mounted = Vec::new();
        for target in &targets {
            let key = SeriesKey::target(target.id.clone());
            if !self.views.contains_key(&key) {
                mounted.push(self.mount(key));
            }
        }

        self.groups = group_targets(&targets);
        if targets.len() != self.targets.len() || !mounted.is_empty() {
            info!(
                targets = targets.len(),
                groups = self.groups.len(),
                "Target list updated"
            );
        }
        self.targets = targets;
        mounted
    }

    pub fn targets(&self) -> &[MonitorTarget] {
        &self.targets
    }

    pub fn groups(&self) -> &[TargetGroup] {
        &self.groups
    }

    pub fn target(&self, id: &str) -> Option<&MonitorTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn latest_result(&self, id: &str) -> Option<&ProbeResult> {
        self.latest_results.get(id)
    }

    pub fn latest_system(&self) -> Option<&SystemStats> {
        self.latest_system.as_ref()
    }

    // ------------------------------------------------------------------
    // Thresholds
    // ------------------------------------------------------------------

    pub fn thresholds(&self) -> &ThresholdMonitor {
        &self.thresholds
    }

    /// Persist a new limit and re-evaluate it against the latest snapshot.
    pub fn set_limit(&mut self, metric: SystemMetric, limit: f64) -> Result<(), StoreError> {
        self.thresholds.set_limit(metric, limit)?;
        if let Some(stats) = &self.latest_system {
            self.thresholds.evaluate(metric, metric.value(stats).as_f64());
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn on_connected(&mut self) {
        if !self.connected {
            info!("Push channel connected");
        }
        self.connected = true;
    }

    /// Mark the push channel down and abandon all in-flight fetches.
    pub fn on_disconnected(&mut self) {
        if self.connected {
            info!("Push channel disconnected");
        }
        self.connected = false;
        self.epoch += 1;
        self.pending.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Drop all views and cached results.
    pub fn teardown(&mut self) {
        self.views.clear();
        self.pending.clear();
        self.latest_system = None;
        self.latest_results.clear();
        self.targets.clear();
        self.groups.clear();
        self.connected = false;
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::ThreadCounts;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    const SNAPSHOT: &str = r#"{"type":"system","data":{
        "cpu":{"percent":42.0},
        "memory":{"percent":50,"used":8,"total":16},
        "disk":{"percent":25,"used":100,"total":400},
        "network":{"used":12.5},
        "threads":{"total":3,"running":1,"sleeping":2,"zombie":0,"is_warning":false}}}"#;

    fn session() -> DashboardSession {
        DashboardSession::new(ThresholdMonitor::new(Box::new(MemoryStore::new())))
    }

    fn at(secs: i64) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn target(id: &str, url: &str) -> MonitorTarget {
        MonitorTarget {
            id: id.into(),
            url: url.into(),
            interval_seconds: 5,
            is_active: true,
        }
    }

    fn update(id: &str, latency: f64) -> String {
        format!(
            r#"{{"type":"target_update","data":{{"target_id":"{}","latency":{},"code":200,"status":"200 OK"}}}}"#,
            id, latency
        )
    }

    fn values(session: &DashboardSession, key: &SeriesKey) -> Vec<f64> {
        session
            .view(key)
            .map(|v| v.buffer.iter().map(|s| s.value.as_f64()).collect())
            .unwrap_or_default()
    }

    const CPU: SeriesKey = SeriesKey::System(SystemMetric::Cpu);
    const RAM: SeriesKey = SeriesKey::System(SystemMetric::Ram);

    #[test]
    fn system_snapshot_feeds_mounted_views() {
        let mut session = session();
        session.mount_system();

        assert_eq!(session.ingest_at(SNAPSHOT, at(0)), Some(RoutedEvent::System));
        assert_eq!(values(&session, &CPU), vec![42.0]);
        assert_eq!(values(&session, &RAM), vec![8.0]);
        assert_eq!(
            values(&session, &SeriesKey::System(SystemMetric::Threads)),
            vec![3.0]
        );
        assert_eq!(session.latest_system().map(|s| s.cpu.percent), Some(42.0));
    }

    #[test]
    fn thread_series_tracks_reported_total() {
        let mut session = session();
        session.mount_system();
        session.set_limit(SystemMetric::Threads, 100.0).unwrap();

        let raw = r#"{"type":"system","data":{"threads":{"total":3500,"running":1,"sleeping":2,"zombie":0}}}"#;
        session.ingest_at(raw, at(0));
        assert_eq!(
            values(&session, &SeriesKey::System(SystemMetric::Threads)),
            vec![3500.0]
        );
        assert!(session.thresholds().is_metric_breached(SystemMetric::Threads));
    }

    #[test]
    fn extreme_thread_counts_are_applied_whole() {
        let mut session = session();
        session.mount_system();
        session.set_limit(SystemMetric::Cpu, 10.0).unwrap();
        session.set_limit(SystemMetric::Threads, 100.0).unwrap();

        let raw = r#"{"type":"system","data":{"cpu":{"percent":50},
            "threads":{"running":4294967295,"sleeping":1}}}"#;
        assert_eq!(session.ingest_at(raw, at(0)), Some(RoutedEvent::System));
        assert_eq!(
            values(&session, &SeriesKey::System(SystemMetric::Threads)),
            vec![4_294_967_296.0]
        );
        assert_eq!(values(&session, &CPU), vec![50.0]);
        assert_eq!(
            session.thresholds().breached_metrics(),
            vec![SystemMetric::Cpu, SystemMetric::Threads]
        );
    }

    #[test]
    fn repeated_tick_is_collapsed() {
        let mut session = session();
        session.mount_system();
        session.ingest_at(SNAPSHOT, at(0));
        session.ingest_at(SNAPSHOT, at(0) + Duration::milliseconds(300));
        assert_eq!(values(&session, &CPU).len(), 1);
    }

    #[test]
    fn malformed_event_changes_nothing() {
        let mut session = session();
        session.mount_system();
        session.ingest_at(SNAPSHOT, at(0));

        assert!(session.ingest_at(r#"{"type":"system","data":{"cpu":1}}"#, at(5)).is_none());
        assert!(session.ingest_at("garbage", at(6)).is_none());

        assert_eq!(values(&session, &CPU), vec![42.0]);
        assert_eq!(session.latest_system().map(|s| s.cpu.percent), Some(42.0));
        assert_eq!(session.router().dropped(), 2);
        assert_eq!(session.router().accepted(), 1);
    }

    #[test]
    fn target_update_is_last_write_wins() {
        let mut session = session();
        session.sync_targets(vec![target("a", "http://a.io")]);

        session.ingest_at(&update("a", 10.0), at(0));
        session.ingest_at(&update("a", 30.0), at(0));

        assert_eq!(session.latest_result("a").map(|r| r.latency), Some(30.0));
        assert_eq!(values(&session, &SeriesKey::target("a")), vec![10.0, 30.0]);
    }

    #[test]
    fn update_for_unmounted_target_only_sets_latest() {
        let mut session = session();
        session.ingest_at(&update("ghost", 5.0), at(0));
        assert!(session.latest_result("ghost").is_some());
        assert!(!session.is_mounted(&SeriesKey::target("ghost")));
    }

    #[test]
    fn live_view_follows_tail() {
        let mut session = session();
        session.sync_targets(vec![target("a", "http://a.io")]);
        let key = SeriesKey::target("a");
        for i in 0..100 {
            session.ingest_at(&update("a", i as f64), at(i));
        }
        let view = session.view(&key).unwrap();
        assert!(view.window.is_live());
        assert_eq!(view.window.cursor(), 60);
        assert_eq!(view.visible().last().map(|s| s.value.as_f64()), Some(99.0));
    }

    #[test]
    fn pinned_view_holds_while_data_arrives() {
        let mut session = session();
        session.sync_targets(vec![target("a", "http://a.io")]);
        let key = SeriesKey::target("a");
        for i in 0..100 {
            session.ingest_at(&update("a", i as f64), at(i));
        }
        session.view_mut(&key).unwrap().window.on_scrub(10);
        for i in 100..110 {
            session.ingest_at(&update("a", i as f64), at(i));
        }
        let view = session.view(&key).unwrap();
        assert!(!view.window.is_live());
        assert_eq!(view.window.cursor(), 10);
    }

    #[test]
    fn system_history_backfills_once() {
        let mut session = session();
        let tokens = session.mount_system();
        session.ingest_at(SNAPSHOT, at(100));

        let history = SystemHistory {
            cpu: vec![30.0, 20.0, 10.0],
            network: vec![2.0, 1.0],
            ..Default::default()
        };
        assert_eq!(session.apply_system_history_at(&tokens, history.clone(), at(100)), 2);
        assert_eq!(values(&session, &CPU), vec![10.0, 20.0, 30.0, 42.0]);

        assert_eq!(session.apply_system_history_at(&tokens, history, at(100)), 0);
        assert_eq!(values(&session, &CPU).len(), 4);
    }

    #[test]
    fn ram_history_waits_for_totals() {
        let mut session = session();
        let tokens = session.mount_system();

        let history = SystemHistory {
            ram_percent: vec![50.0, 25.0],
            ..Default::default()
        };
        assert_eq!(session.apply_system_history_at(&tokens, history, at(0)), 0);
        assert!(session.has_pending_history(SystemMetric::Ram));
        assert!(values(&session, &RAM).is_empty());

        // The snapshot carries total = 16 GB; history is converted after it
        session.ingest_at(SNAPSHOT, at(1));
        assert!(!session.has_pending_history(SystemMetric::Ram));
        assert_eq!(values(&session, &RAM), vec![4.0, 8.0, 8.0]);
        assert!(session.view(&RAM).unwrap().buffer.is_backfilled());
    }

    #[test]
    fn ram_history_applies_immediately_with_totals() {
        let mut session = session();
        let tokens = session.mount_system();
        session.ingest_at(SNAPSHOT, at(0));

        let history = SystemHistory {
            disk_percent: vec![10.0],
            ..Default::default()
        };
        assert_eq!(session.apply_system_history_at(&tokens, history, at(0)), 1);
        let disk = SeriesKey::System(SystemMetric::Disk);
        assert_eq!(values(&session, &disk), vec![40.0, 100.0]);
    }

    #[test]
    fn thread_history_keeps_record_times() {
        let mut session = session();
        let tokens = session.mount_system();
        let counts = |running| ThreadCounts::from_states(running, 10, 0);
        let history = SystemHistory {
            threads: vec![
                ThreadRecord {
                    counts: counts(2),
                    time: Some(at(-5)),
                },
                ThreadRecord {
                    counts: counts(1),
                    time: None,
                },
            ],
            ..Default::default()
        };
        session.apply_system_history_at(&tokens, history, at(0));

        let view = session.view(&SeriesKey::System(SystemMetric::Threads)).unwrap();
        let samples: Vec<_> = view.buffer.iter().collect();
        assert_eq!(samples[0].value.as_f64(), 11.0);
        assert_eq!(samples[0].timestamp, at(0) - Duration::milliseconds(DATA_INTERVAL_MS));
        assert_eq!(samples[1].timestamp, at(-5));
    }

    #[test]
    fn stale_token_after_remount_is_ignored() {
        let mut session = session();
        let old = session.mount(CPU);
        session.unmount(&CPU);
        let fresh = session.mount(CPU);

        let history = SystemHistory {
            cpu: vec![1.0],
            ..Default::default()
        };
        assert_eq!(session.apply_system_history_at(&[old], history.clone(), at(0)), 0);
        assert!(values(&session, &CPU).is_empty());
        assert_eq!(session.apply_system_history_at(&[fresh], history, at(0)), 1);
    }

    #[test]
    fn disconnect_abandons_in_flight_fetches() {
        let mut session = session();
        session.on_connected();
        let tokens = session.sync_targets(vec![target("a", "http://a.io")]);
        session.on_disconnected();
        assert!(!session.is_connected());

        let record = ProbeRecord {
            time: at(0),
            latency: 12.0,
            code: 200,
            status: "OK".into(),
            timing: None,
        };
        assert!(!session.apply_target_history(&tokens[0], vec![record.clone()]));

        // Re-mounting an existing view yields a token for the new epoch
        let token = session.mount(SeriesKey::target("a"));
        assert!(session.apply_target_history(&token, vec![record]));
        assert_eq!(values(&session, &SeriesKey::target("a")), vec![12.0]);
    }

    #[test]
    fn reconnect_refetches_only_unfilled_views() {
        let mut session = session();
        let tokens = session.mount_system();
        let history = SystemHistory {
            cpu: vec![1.0],
            ..Default::default()
        };
        session.apply_system_history_at(&tokens, history, at(0));
        session.on_disconnected();
        session.on_connected();

        let awaiting = session.tokens_awaiting_history();
        assert_eq!(awaiting.len(), 4);
        assert!(awaiting.iter().all(|t| t.key() != &CPU));
        assert!(awaiting.iter().all(|t| session.is_current(t)));
    }

    #[test]
    fn mount_twice_keeps_data() {
        let mut session = session();
        let first = session.mount(CPU);
        session.ingest_at(SNAPSHOT, at(0));
        let second = session.mount(CPU);
        assert_eq!(first, second);
        assert_eq!(values(&session, &CPU), vec![42.0]);
    }

    #[test]
    fn sync_targets_mounts_new_and_drops_removed() {
        let mut session = session();
        let tokens = session.sync_targets(vec![
            target("a", "http://x.com"),
            target("b", "http://x.com/a"),
        ]);
        assert_eq!(tokens.len(), 2);
        assert_eq!(session.groups().len(), 1);
        session.ingest_at(&update("b", 3.0), at(0));

        let tokens = session.sync_targets(vec![target("a", "http://x.com"), target("c", "http://y.com")]);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].key(), &SeriesKey::target("c"));
        assert!(!session.is_mounted(&SeriesKey::target("b")));
        assert!(session.latest_result("b").is_none());
        assert_eq!(session.groups().len(), 2);
    }

    #[test]
    fn set_limit_reevaluates_latest_snapshot() {
        let mut session = session();
        session.mount_system();
        session.ingest_at(SNAPSHOT, at(0));
        assert!(!session.thresholds().is_metric_breached(SystemMetric::Cpu));

        session.set_limit(SystemMetric::Cpu, 40.0).unwrap();
        assert!(session.thresholds().is_metric_breached(SystemMetric::Cpu));
    }

    #[test]
    fn teardown_clears_everything() {
        let mut session = session();
        let tokens = session.mount_system();
        session.sync_targets(vec![target("a", "http://a.io")]);
        session.ingest_at(SNAPSHOT, at(0));
        session.teardown();

        assert!(!session.is_mounted(&CPU));
        assert!(session.latest_system().is_none());
        assert!(session.targets().is_empty());
        let history = SystemHistory {
            cpu: vec![1.0],
            ..Default::default()
        };
        assert_eq!(session.apply_system_history_at(&tokens, history, at(0)), 0);
    }
}
