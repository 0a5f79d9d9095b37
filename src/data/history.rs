//! Bulk history batches delivered by the API at view mount.
//!
//! All sequences are newest-first, as the server returns them.

use chrono::{DateTime, Local};

use super::sample::{ProbeTiming, Sample, SampleMeta, ThreadCounts};
use super::series::BatchOrder;

/// Order of every batch in this module.
pub const HISTORY_ORDER: BatchOrder = BatchOrder::NewestFirst;

/// One past thread-state reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreadRecord {
    pub counts: ThreadCounts,
    /// Collection time, when the server supplied a parsable one.
    pub time: Option<DateTime<Local>>,
}

/// Recent host history, one sequence per metric.
///
/// RAM and Disk arrive as percentages and are converted to GB once the
/// totals are known from a live snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemHistory {
    pub cpu: Vec<f64>,
    pub ram_percent: Vec<f64>,
    pub disk_percent: Vec<f64>,
    pub network: Vec<f64>,
    pub threads: Vec<ThreadRecord>,
}

impl SystemHistory {
    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
            && self.ram_percent.is_empty()
            && self.disk_percent.is_empty()
            && self.network.is_empty()
            && self.threads.is_empty()
    }
}

/// Convert a percent series to absolute values given the capacity total.
///
/// Yields nothing while the total is unknown (zero).
pub fn percent_to_absolute(percents: &[f64], total: f64) -> Vec<f64> {
    if total <= 0.0 {
        return Vec::new();
    }
    percents.iter().map(|p| p * total / 100.0).collect()
}

/// One past probe of a target.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRecord {
    pub time: DateTime<Local>,
    pub latency: f64,
    pub code: u16,
    pub status: String,
    pub timing: Option<ProbeTiming>,
}

impl ProbeRecord {
    /// Status to show for a record, falling back on the code when the server
    /// stored none.
    pub fn status_or_default(status: Option<String>, code: u16) -> String {
        match status {
            Some(s) if !s.is_empty() => s,
            _ if (200..300).contains(&code) => "OK".to_string(),
            _ => "DOWN".to_string(),
        }
    }

    pub fn into_sample(self) -> Sample {
        let meta = SampleMeta {
            code: Some(self.code),
            status: Some(self.status),
            timing: self.timing,
        };
        Sample::new(self.time, self.latency).with_meta(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_conversion_needs_a_total() {
        assert!(percent_to_absolute(&[50.0, 25.0], 0.0).is_empty());
        assert_eq!(percent_to_absolute(&[50.0, 25.0], 16.0), vec![8.0, 4.0]);
    }

    #[test]
    fn status_falls_back_on_code() {
        assert_eq!(ProbeRecord::status_or_default(None, 204), "OK");
        assert_eq!(ProbeRecord::status_or_default(Some(String::new()), 503), "DOWN");
        assert_eq!(ProbeRecord::status_or_default(None, 0), "DOWN");
        assert_eq!(
            ProbeRecord::status_or_default(Some("301 Moved".into()), 301),
            "301 Moved"
        );
    }

    #[test]
    fn record_becomes_probe_sample() {
        let time = Local::now();
        let sample = ProbeRecord {
            time,
            latency: 88.0,
            code: 200,
            status: "OK".into(),
            timing: None,
        }
        .into_sample();
        assert_eq!(sample.value.as_f64(), 88.0);
        assert_eq!(sample.meta.code, Some(200));
        assert_eq!(sample.timestamp, time);
    }
}
