//! Payloads carried by push events.

use serde::{Deserialize, Serialize};

use super::sample::{ProbeTiming, SampleMeta, ThreadCounts};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CpuStats {
    #[serde(default)]
    pub percent: f64,
}

/// Capacity usage of memory or disk. `used` and `total` are in GB.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub percent: f64,
    #[serde(default)]
    pub used: f64,
    #[serde(default)]
    pub total: f64,
}

/// Network throughput in KB/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkStats {
    #[serde(default)]
    pub used: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThreadStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub running: u32,
    #[serde(default)]
    pub sleeping: u32,
    #[serde(default)]
    pub zombie: u32,
    /// Set by the collector when the total passes its alarm level.
    #[serde(default)]
    pub is_warning: bool,
}

impl ThreadStats {
    pub fn counts(&self) -> ThreadCounts {
        ThreadCounts::with_total(u64::from(self.total), self.running, self.sleeping, self.zombie)
    }
}

/// One host snapshot. Missing sections read as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(default)]
    pub cpu: CpuStats,
    #[serde(default)]
    pub memory: UsageStats,
    #[serde(default)]
    pub disk: UsageStats,
    #[serde(default)]
    pub network: NetworkStats,
    #[serde(default)]
    pub threads: ThreadStats,
    /// Host uptime in seconds.
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub os: Option<String>,
}

impl SystemStats {
    /// Uptime rounded down to whole hours, e.g. `"37h"`.
    pub fn uptime_label(&self) -> Option<String> {
        self.uptime.map(|secs| format!("{}h", secs / 3600))
    }
}

/// Coarse latency class used for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyGrade {
    Fast,
    Slow,
    Critical,
}

impl LatencyGrade {
    pub fn of(latency_ms: f64) -> Self {
        if latency_ms > 500.0 {
            LatencyGrade::Critical
        } else if latency_ms > 200.0 {
            LatencyGrade::Slow
        } else {
            LatencyGrade::Fast
        }
    }
}

/// Latest outcome of one probe of a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    #[serde(alias = "monitor_id")]
    pub target_id: String,
    /// Total request time in ms.
    pub latency: f64,
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timing: Option<ProbeTiming>,
}

impl ProbeResult {
    /// Whether the target answered with a 2xx code.
    pub fn is_up(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn grade(&self) -> LatencyGrade {
        LatencyGrade::of(self.latency)
    }

    pub fn meta(&self) -> SampleMeta {
        SampleMeta {
            code: Some(self.code),
            status: Some(self.status.clone()),
            timing: self.timing,
        }
    }
}
