//! Background API calls.
//!
//! The UI thread never awaits the network. [`Fetcher`] spawns each call on
//! the tokio runtime and hands the outcome back through a channel that the
//! UI drains once per tick, so every buffer keeps a single writer.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ApiError, DashboardApi};
use crate::data::{MonitorTarget, ProbeRecord, SystemHistory, ViewToken};

/// Result of one background call.
#[derive(Debug)]
pub enum FetchOutcome {
    Targets(Result<Vec<MonitorTarget>, ApiError>),
    SystemHistory {
        tokens: Vec<ViewToken>,
        result: Result<Option<SystemHistory>, ApiError>,
    },
    TargetHistory {
        token: ViewToken,
        result: Result<Vec<ProbeRecord>, ApiError>,
    },
    Created(Result<MonitorTarget, ApiError>),
    Deleted {
        id: String,
        result: Result<(), ApiError>,
    },
}

/// Runs API calls off the UI thread.
pub struct Fetcher {
    api: Arc<dyn DashboardApi>,
    runtime: Handle,
    tx: mpsc::UnboundedSender<FetchOutcome>,
    rx: mpsc::UnboundedReceiver<FetchOutcome>,
    targets_in_flight: bool,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("targets_in_flight", &self.targets_in_flight)
            .finish()
    }
}

impl Fetcher {
    pub fn new(api: Arc<dyn DashboardApi>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            runtime,
            tx,
            rx,
            targets_in_flight: false,
        }
    }

    fn spawn<F, Fut>(&self, call: F)
    where
        F: FnOnce(Arc<dyn DashboardApi>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = FetchOutcome> + Send + 'static,
    {
        let api = self.api.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let outcome = call(api).await;
            // The UI may have shut down
            let _ = tx.send(outcome);
        });
    }

    /// Refresh the target list unless a refresh is already running.
    pub fn request_targets(&mut self) {
        if self.targets_in_flight {
            return;
        }
        self.targets_in_flight = true;
        self.spawn(|api| async move { FetchOutcome::Targets(api.list_targets().await) });
    }

    pub fn request_system_history(&self, tokens: Vec<ViewToken>) {
        debug!(views = tokens.len(), "Fetching system history");
        self.spawn(|api| async move {
            let result = api.system_history().await;
            FetchOutcome::SystemHistory { tokens, result }
        });
    }

    pub fn request_target_history(&self, token: ViewToken, id: String) {
        self.spawn(|api| async move {
            let result = api.target_history(&id).await;
            FetchOutcome::TargetHistory { token, result }
        });
    }

    pub fn create_target(&self, url: String, interval_seconds: u32) {
        self.spawn(move |api| async move {
            FetchOutcome::Created(api.create_target(&url, interval_seconds).await)
        });
    }

    pub fn delete_target(&self, id: String) {
        self.spawn(|api| async move {
            let result = api.delete_target(&id).await;
            FetchOutcome::Deleted { id, result }
        });
    }

    /// Take the next finished call, without blocking.
    pub fn poll(&mut self) -> Option<FetchOutcome> {
        let outcome = self.rx.try_recv().ok()?;
        if matches!(outcome, FetchOutcome::Targets(_)) {
            self.targets_in_flight = false;
        }
        Some(outcome)
    }
}
