//! Samples held by series buffers.
//!
//! A [`Sample`] is one immutable point of a metric series: a local wall-clock
//! timestamp, a numeric or composite value, and optional probe metadata.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Format of the display-precision time label (one-second resolution).
pub const TIME_LABEL_FORMAT: &str = "%H:%M:%S";

/// Format of the date label shown next to the time label.
pub const DATE_LABEL_FORMAT: &str = "%d.%m.%Y";

/// Process counts by scheduler state.
///
/// `total` counts every process, including those whose state could not be
/// read, so it is never below the sum of the three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThreadCounts {
    #[serde(default)]
    pub total: u64,
    pub running: u32,
    pub sleeping: u32,
    pub zombie: u32,
}

impl ThreadCounts {
    /// Counts with no separately reported total.
    pub fn from_states(running: u32, sleeping: u32, zombie: u32) -> Self {
        Self::with_total(0, running, sleeping, zombie)
    }

    /// Counts with a reported total, raised to the state sum if it is lower.
    pub fn with_total(total: u64, running: u32, sleeping: u32, zombie: u32) -> Self {
        let states = u64::from(running) + u64::from(sleeping) + u64::from(zombie);
        Self {
            total: total.max(states),
            running,
            sleeping,
            zombie,
        }
    }
}

/// Per-phase timing breakdown of a single probe, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProbeTiming {
    #[serde(default)]
    pub dns: f64,
    /// TCP connect time. The worker calls this `connect`, the stats API `tcp`.
    #[serde(default, alias = "tcp")]
    pub connect: f64,
    #[serde(default)]
    pub tls: f64,
    #[serde(default)]
    pub ttfb: f64,
    #[serde(default)]
    pub download: f64,
}

impl ProbeTiming {
    /// Sum of all phases.
    pub fn total(&self) -> f64 {
        self.dns + self.connect + self.tls + self.ttfb + self.download
    }

    /// Phases in request order, with their short display names.
    pub fn phases(&self) -> [(&'static str, f64); 5] {
        [
            ("DNS", self.dns),
            ("TCP", self.connect),
            ("TLS", self.tls),
            ("TTFB", self.ttfb),
            ("DL", self.download),
        ]
    }
}

/// The value carried by a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    /// A plain number (percent, GB, KB/s, latency in ms).
    Scalar(f64),
    /// Thread-state triple.
    Threads(ThreadCounts),
}

impl SampleValue {
    /// Collapse the value to one number for charting and threshold checks.
    ///
    /// Thread triples collapse to their total.
    pub fn as_f64(&self) -> f64 {
        match self {
            SampleValue::Scalar(v) => *v,
            SampleValue::Threads(t) => t.total as f64,
        }
    }
}

impl From<f64> for SampleValue {
    fn from(v: f64) -> Self {
        SampleValue::Scalar(v)
    }
}

impl From<ThreadCounts> for SampleValue {
    fn from(t: ThreadCounts) -> Self {
        SampleValue::Threads(t)
    }
}

/// Probe labels attached to URL-probe samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleMeta {
    pub code: Option<u16>,
    pub status: Option<String>,
    pub timing: Option<ProbeTiming>,
}

/// One point of a metric series.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub value: SampleValue,
    pub meta: SampleMeta,
}

impl Sample {
    pub fn new(timestamp: DateTime<Local>, value: impl Into<SampleValue>) -> Self {
        Self {
            timestamp,
            value: value.into(),
            meta: SampleMeta::default(),
        }
    }

    /// Attach probe metadata.
    pub fn with_meta(mut self, meta: SampleMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Display-precision time label, e.g. `14:03:27`.
    pub fn time_label(&self) -> String {
        self.timestamp.format(TIME_LABEL_FORMAT).to_string()
    }

    /// Date label, e.g. `19.10.2026`.
    pub fn date_label(&self) -> String {
        self.timestamp.format(DATE_LABEL_FORMAT).to_string()
    }

    /// Whether two samples fall on the same display tick.
    pub fn same_tick(&self, other: &Sample) -> bool {
        self.time_label() == other.time_label()
    }
}
