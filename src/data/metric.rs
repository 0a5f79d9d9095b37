//! Identity of the series the dashboard tracks.

use std::fmt;

use super::sample::SampleValue;
use super::series::SeriesKind;
use super::stats::SystemStats;

/// Host-level metrics shown on the System view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemMetric {
    Cpu,
    Ram,
    Disk,
    Network,
    Threads,
}

impl SystemMetric {
    pub const ALL: [SystemMetric; 5] = [
        SystemMetric::Cpu,
        SystemMetric::Ram,
        SystemMetric::Disk,
        SystemMetric::Network,
        SystemMetric::Threads,
    ];

    /// Label used for display and as the threshold storage key suffix.
    pub fn label(self) -> &'static str {
        match self {
            SystemMetric::Cpu => "CPU",
            SystemMetric::Ram => "RAM",
            SystemMetric::Disk => "Disk",
            SystemMetric::Network => "Network",
            SystemMetric::Threads => "Threads",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SystemMetric::Cpu => "%",
            SystemMetric::Ram | SystemMetric::Disk => "GB",
            SystemMetric::Network => "KB/s",
            SystemMetric::Threads => "",
        }
    }

    /// The value this metric tracks in a snapshot.
    ///
    /// RAM and Disk track used GB, not percent.
    pub fn value(self, stats: &SystemStats) -> SampleValue {
        match self {
            SystemMetric::Cpu => stats.cpu.percent.into(),
            SystemMetric::Ram => stats.memory.used.into(),
            SystemMetric::Disk => stats.disk.used.into(),
            SystemMetric::Network => stats.network.used.into(),
            SystemMetric::Threads => stats.threads.counts().into(),
        }
    }

    /// Fill level in percent for the gauge bar.
    ///
    /// Network has no capacity, so 1000 KB/s counts as full.
    pub fn gauge(self, stats: &SystemStats) -> f64 {
        let percent = match self {
            SystemMetric::Cpu => stats.cpu.percent,
            SystemMetric::Ram => stats.memory.percent,
            SystemMetric::Disk => stats.disk.percent,
            SystemMetric::Network => stats.network.used / 10.0,
            SystemMetric::Threads => {
                if stats.threads.is_warning {
                    100.0
                } else {
                    0.0
                }
            }
        };
        percent.clamp(0.0, 100.0)
    }
}

impl fmt::Display for SystemMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Key of one mounted series view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SeriesKey {
    System(SystemMetric),
    /// Latency series of the target with this id.
    Target(String),
}

impl SeriesKey {
    pub fn target(id: impl Into<String>) -> Self {
        SeriesKey::Target(id.into())
    }

    pub fn kind(&self) -> SeriesKind {
        match self {
            SeriesKey::System(_) => SeriesKind::System,
            SeriesKey::Target(_) => SeriesKind::Probe,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::System(metric) => write!(f, "{}", metric),
            SeriesKey::Target(id) => write!(f, "target {}", id),
        }
    }
}
