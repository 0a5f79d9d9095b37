//! Classification of raw push frames.
//!
//! Frames are JSON objects `{"type": ..., "data": ...}`. The router turns them
//! into [`PushEvent`]s, fully validated before anything is mutated, and keeps
//! counts of what it accepted and dropped. Applying a parsed event is done by
//! [`DashboardSession`](super::session::DashboardSession) and cannot fail.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{trace, warn};

use super::stats::{ProbeResult, SystemStats};

/// A push event after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    /// Host snapshot.
    System(SystemStats),
    /// Probe result for one target.
    #[serde(alias = "monitor_update")]
    TargetUpdate(ProbeResult),
}

/// What a routed event touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutedEvent {
    System,
    Target(String),
}

/// Why a frame was dropped.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("target update without a target id")]
    MissingTargetId,

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Parses push frames and counts the outcome.
#[derive(Debug, Default, Clone)]
pub struct UpdateRouter {
    accepted: u64,
    dropped: u64,
}

impl UpdateRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate one frame without touching any counters.
    pub fn parse(raw: &str) -> Result<PushEvent, RouteError> {
        let event: PushEvent = serde_json::from_str(raw)?;
        validate(&event)?;
        Ok(event)
    }

    /// Parse one frame, logging and counting frames that are dropped.
    pub fn route(&mut self, raw: &str) -> Option<PushEvent> {
        match Self::parse(raw) {
            Ok(event) => {
                self.accepted += 1;
                trace!(?event, "Routed push event");
                Some(event)
            }
            Err(e) => {
                self.dropped += 1;
                warn!(error = %e, "Dropping push event");
                None
            }
        }
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

fn validate(event: &PushEvent) -> Result<(), RouteError> {
    match event {
        PushEvent::System(stats) => {
            let values = [
                ("cpu", stats.cpu.percent),
                ("memory", stats.memory.used),
                ("disk", stats.disk.used),
                ("network", stats.network.used),
            ];
            for (name, value) in values {
                if !value.is_finite() {
                    return Err(RouteError::NonFinite(name));
                }
            }
        }
        PushEvent::TargetUpdate(result) => {
            if result.target_id.is_empty() {
                return Err(RouteError::MissingTargetId);
            }
            if !result.latency.is_finite() {
                return Err(RouteError::NonFinite("latency"));
            }
        }
    }
    Ok(())
}
