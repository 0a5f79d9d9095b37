//! JSON messages of the `pulsar.v1.MonitorService` API.
//!
//! The server uses the protobuf JSON mapping: field names are camelCase,
//! fields holding their default value are omitted, and 64-bit integers are
//! encoded as strings. Every field here is therefore optional and numbers
//! accept either form.

use chrono::{DateTime, Local, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::data::{MonitorTarget, ProbeRecord, ProbeTiming, SystemHistory, ThreadCounts, ThreadRecord};

/// A number encoded either as a JSON number or a decimal string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Float(f64),
    Text(String),
}

fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Number::deserialize(deserializer)? {
        Number::Float(v) => Ok(v),
        Number::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn flexible_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = flexible_f64(deserializer)?;
    if v.is_finite() && v >= 0.0 {
        Ok(v as u32)
    } else {
        Err(serde::de::Error::custom(format!("expected a count, got {}", v)))
    }
}

#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorIdRequest<'a> {
    pub monitor_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMonitorRequest<'a> {
    pub url: &'a str,
    pub interval_seconds: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListMonitorsResponse {
    #[serde(default)]
    pub monitors: Vec<MonitorTarget>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMonitorResponse {
    pub monitor: Option<MonitorTarget>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMonitorResponse {
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct GetMonitorStatsResponse {
    #[serde(default)]
    pub stats: Vec<MonitorStat>,
}

/// One stored probe.
#[derive(Debug, Deserialize)]
pub struct MonitorStat {
    #[serde(default, deserialize_with = "flexible_f64")]
    pub latency: f64,
    #[serde(default, deserialize_with = "flexible_u32")]
    pub code: u32,
    #[serde(default)]
    pub status: Option<String>,
    /// RFC 3339 time of the probe.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub timing: Option<ProbeTiming>,
}

impl MonitorStat {
    /// Convert to a history record. Records without a parsable time are
    /// dropped.
    pub fn into_record(self) -> Option<ProbeRecord> {
        let time = match DateTime::parse_from_rfc3339(&self.time) {
            Ok(t) => t.with_timezone(&Local),
            Err(e) => {
                debug!(time = %self.time, error = %e, "Skipping stat with bad time");
                return None;
            }
        };
        let code = u16::try_from(self.code).unwrap_or(0);
        Some(ProbeRecord {
            time,
            latency: self.latency,
            code,
            status: ProbeRecord::status_or_default(self.status, code),
            timing: self.timing,
        })
    }
}

impl GetMonitorStatsResponse {
    /// History records, newest first as the server sends them.
    pub fn into_records(self) -> Vec<ProbeRecord> {
        self.stats.into_iter().filter_map(MonitorStat::into_record).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceUsage {
    #[serde(default)]
    pub history: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadHistory {
    #[serde(default, deserialize_with = "flexible_u32")]
    pub running: u32,
    #[serde(default, deserialize_with = "flexible_u32")]
    pub sleeping: u32,
    #[serde(default, deserialize_with = "flexible_u32")]
    pub zombie: u32,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThreadUsage {
    #[serde(default)]
    pub history: Vec<ThreadHistory>,
}

/// First message of the `GetSystemStats` stream.
#[derive(Debug, Default, Deserialize)]
pub struct SystemStatsResponse {
    #[serde(default)]
    pub cpu: Option<ResourceUsage>,
    #[serde(default)]
    pub memory: Option<ResourceUsage>,
    #[serde(default)]
    pub disk: Option<ResourceUsage>,
    #[serde(default)]
    pub network: Option<ResourceUsage>,
    #[serde(default)]
    pub threads: Option<ThreadUsage>,
}

/// Parse a history time: RFC 3339, or a bare `HH:MM:SS` taken as today.
fn parse_history_time(raw: &str, today: DateTime<Local>) -> Option<DateTime<Local>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Local));
    }
    let time = NaiveTime::parse_from_str(raw, "%H:%M:%S").ok()?;
    today
        .date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()
}

impl SystemStatsResponse {
    /// Convert to a history batch.
    ///
    /// Returns `None` when the message carries no CPU history; the server
    /// only sends history when it has some.
    pub fn into_history(self, now: DateTime<Local>) -> Option<SystemHistory> {
        let history = |usage: Option<ResourceUsage>| usage.map(|u| u.history).unwrap_or_default();

        let cpu = history(self.cpu);
        if cpu.is_empty() {
            return None;
        }

        let threads = self
            .threads
            .map(|t| t.history)
            .unwrap_or_default()
            .into_iter()
            .map(|h| ThreadRecord {
                counts: ThreadCounts::from_states(h.running, h.sleeping, h.zombie),
                time: parse_history_time(&h.time, now),
            })
            .collect();

        Some(SystemHistory {
            cpu,
            ram_percent: history(self.memory),
            disk_percent: history(self.disk),
            network: history(self.network),
            threads,
        })
    }
}

/// Error body of a failed unary call or a stream's end message.
#[derive(Debug, Deserialize)]
pub struct ConnectErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Trailing message of a server stream.
#[derive(Debug, Default, Deserialize)]
pub struct EndStreamMessage {
    #[serde(default)]
    pub error: Option<ConnectErrorBody>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 18, 0, 0).unwrap()
    }

    #[test]
    fn stats_fill_in_missing_status() {
        let json = r#"{"stats":[
            {"latency":"120","code":200,"time":"2026-10-19T10:00:15Z","timing":{"dns":1,"tcp":2}},
            {"latency":30,"code":503,"status":"","time":"2026-10-19T10:00:00Z"},
            {"latency":1,"code":200,"time":"yesterday"}
        ]}"#;
        let response: GetMonitorStatsResponse = serde_json::from_str(json).unwrap();
        let records = response.into_records();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, "OK");
        assert_eq!(records[0].latency, 120.0);
        assert_eq!(records[0].timing.map(|t| t.connect), Some(2.0));
        assert_eq!(records[1].status, "DOWN");
        assert!(records[0].time > records[1].time);
    }

    #[test]
    fn system_history_requires_cpu() {
        let empty: SystemStatsResponse = serde_json::from_str(r#"{"cpu":{}}"#).unwrap();
        assert!(empty.into_history(now()).is_none());
    }

    #[test]
    fn system_history_converts_all_series() {
        let json = r#"{
            "cpu":{"history":[3,2,1]},
            "memory":{"history":[50,40]},
            "threads":{"history":[{"running":2,"sleeping":"300","time":"17:59:45"}]}
        }"#;
        let response: SystemStatsResponse = serde_json::from_str(json).unwrap();
        let history = response.into_history(now()).unwrap();

        assert_eq!(history.cpu, vec![3.0, 2.0, 1.0]);
        assert_eq!(history.ram_percent, vec![50.0, 40.0]);
        assert!(history.disk_percent.is_empty());
        let thread = history.threads[0];
        assert_eq!(thread.counts.total, 302);
        assert_eq!(thread.time.map(|t| t.minute()), Some(59));
    }

    #[test]
    fn monitors_use_camel_case() {
        let json = r#"{"monitors":[{"id":"1","url":"http://x.com","intervalSeconds":10}]}"#;
        let response: ListMonitorsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.monitors[0].interval_seconds, 10);
        assert!(!response.monitors[0].is_active);

        let body = serde_json::to_string(&CreateMonitorRequest {
            url: "http://x.com",
            interval_seconds: 5,
        })
        .unwrap();
        assert_eq!(body, r#"{"url":"http://x.com","intervalSeconds":5}"#);
    }
}
