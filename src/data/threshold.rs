//! Per-metric alert limits and breach tracking.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::metric::SystemMetric;
use super::stats::SystemStats;
use crate::store::{PreferenceStore, StoreError};

/// Prefix of the storage key holding a metric's limit.
pub const THRESHOLD_KEY_PREFIX: &str = "pulsar_threshold_";

/// Storage key for the limit of the metric with this label.
pub fn threshold_key(label: &str) -> String {
    format!("{}{}", THRESHOLD_KEY_PREFIX, label)
}

/// Whether `value` exceeds an enabled limit. A limit of 0 is disabled.
pub fn is_breached(value: f64, limit: f64) -> bool {
    limit > 0.0 && value > limit
}

/// Holds one optional limit per system metric and the breach state from the
/// last evaluation.
pub struct ThresholdMonitor {
    store: Box<dyn PreferenceStore>,
    limits: HashMap<SystemMetric, f64>,
    breached: HashMap<SystemMetric, bool>,
}

impl std::fmt::Debug for ThresholdMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThresholdMonitor")
            .field("limits", &self.limits)
            .field("breached", &self.breached)
            .finish()
    }
}

impl ThresholdMonitor {
    pub fn new(store: Box<dyn PreferenceStore>) -> Self {
        Self {
            store,
            limits: HashMap::new(),
            breached: HashMap::new(),
        }
    }

    /// Read the stored limit for `metric` and cache it.
    ///
    /// Missing or unparsable entries mean 0 (disabled).
    pub fn load(&mut self, metric: SystemMetric) -> f64 {
        let key = threshold_key(metric.label());
        let limit = match self.store.get(&key) {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                _ => {
                    warn!(key = %key, value = %raw, "Ignoring unparsable threshold");
                    0.0
                }
            },
            None => 0.0,
        };
        self.limits.insert(metric, limit);
        limit
    }

    /// Load every metric's limit.
    pub fn load_all(&mut self) {
        for metric in SystemMetric::ALL {
            self.load(metric);
        }
    }

    /// Persist a new limit. 0 disables alerting for the metric.
    ///
    /// Negative or non-finite values are stored as 0.
    pub fn set_limit(&mut self, metric: SystemMetric, limit: f64) -> Result<(), StoreError> {
        let limit = if limit.is_finite() && limit > 0.0 { limit } else { 0.0 };
        self.store
            .set(&threshold_key(metric.label()), &limit.to_string())?;
        self.limits.insert(metric, limit);
        debug!(metric = %metric, limit, "Threshold updated");
        Ok(())
    }

    /// Cached limit, 0 if never loaded.
    pub fn limit(&self, metric: SystemMetric) -> f64 {
        self.limits.get(&metric).copied().unwrap_or(0.0)
    }

    /// Evaluate one metric's value against its cached limit.
    pub fn evaluate(&mut self, metric: SystemMetric, value: f64) -> bool {
        let breached = is_breached(value, self.limit(metric));
        self.breached.insert(metric, breached);
        breached
    }

    /// Evaluate every metric against a fresh snapshot.
    pub fn evaluate_snapshot(&mut self, stats: &SystemStats) {
        for metric in SystemMetric::ALL {
            self.evaluate(metric, metric.value(stats).as_f64());
        }
    }

    /// Breach state from the last evaluation.
    pub fn is_metric_breached(&self, metric: SystemMetric) -> bool {
        self.breached.get(&metric).copied().unwrap_or(false)
    }

    /// Metrics currently in breach, in display order.
    pub fn breached_metrics(&self) -> Vec<SystemMetric> {
        SystemMetric::ALL
            .into_iter()
            .filter(|m| self.is_metric_breached(*m))
            .collect()
    }
}
