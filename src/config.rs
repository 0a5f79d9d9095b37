//! Runtime settings.
//!
//! Settings are layered, lowest first: built-in defaults, an optional TOML
//! file, `PULSAR_*` environment variables, then command-line flags.
//!
//! ```toml
//! api_url = "http://pulsar.internal:8081"
//! refresh = "30s"
//! preferences = "/home/me/.config/pulsar-watch/prefs.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::api::DEFAULT_BASE_URL;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pulsar-watch.toml";

/// Suffix to milliseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[("ms", 1.0), ("s", 1_000.0), ("m", 60_000.0)];

/// Parse interval strings like "10s", "500ms", "1.5m". A bare number is
/// taken as seconds.
pub fn parse_interval(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            if !val.is_finite() || val <= 0.0 {
                bail!("Interval must be positive: {}", s);
            }
            return Ok(Duration::from_millis((val * multiplier) as u64));
        }
    }

    match s.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(Duration::from_secs_f64(secs)),
        _ => bail!("Unknown interval format: {}", s),
    }
}

/// Push endpoint belonging to an API address: same host, `ws` scheme, `/ws`.
pub fn derive_ws_url(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/ws", base)
}

/// Where push frames come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushSource {
    WebSocket(String),
    Tcp(String),
    Replay(PathBuf),
}

/// Values given on the command line. `None` leaves lower layers in effect.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub ws_url: Option<String>,
    pub tcp: Option<String>,
    pub replay: Option<PathBuf>,
    pub refresh: Option<String>,
    pub preferences: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

/// Resolved settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Pulsar API address.
    pub api_url: String,
    /// Push endpoint; derived from `api_url` when unset.
    #[serde(default)]
    pub ws_url: Option<String>,
    /// Read push frames from a TCP relay instead of WebSocket.
    #[serde(default)]
    pub tcp: Option<String>,
    /// Replay a capture file instead of connecting.
    #[serde(default)]
    pub replay: Option<PathBuf>,
    /// Target list refresh interval, e.g. "10s".
    pub refresh: String,
    /// File holding alert limits.
    pub preferences: PathBuf,
    /// Log output file (the terminal belongs to the UI).
    pub log_file: PathBuf,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Settings {
    /// Load settings from `file` (or the default file if present), the
    /// environment, and `overrides`.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let path_str = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());

        Config::builder()
            .set_default("api_url", DEFAULT_BASE_URL)?
            .set_default("refresh", "10s")?
            .set_default("preferences", "pulsar-prefs.json")?
            .set_default("log_file", "pulsar-watch.log")?
            .set_default("log_filter", "pulsar_watch=info")?
            .add_source(file_source)
            .add_source(Environment::with_prefix("PULSAR"))
            .set_override_option("api_url", overrides.api_url.clone())?
            .set_override_option("ws_url", overrides.ws_url.clone())?
            .set_override_option("tcp", overrides.tcp.clone())?
            .set_override_option("replay", path_str(&overrides.replay))?
            .set_override_option("refresh", overrides.refresh.clone())?
            .set_override_option("preferences", path_str(&overrides.preferences))?
            .set_override_option("log_file", path_str(&overrides.log_file))?
            .build()?
            .try_deserialize()
    }

    pub fn refresh_interval(&self) -> Result<Duration> {
        parse_interval(&self.refresh)
    }

    pub fn ws_url(&self) -> String {
        self.ws_url
            .clone()
            .unwrap_or_else(|| derive_ws_url(&self.api_url))
    }

    /// The push source to use: replay, then TCP, then WebSocket.
    pub fn push_source(&self) -> PushSource {
        if let Some(path) = &self.replay {
            PushSource::Replay(path.clone())
        } else if let Some(addr) = &self.tcp {
            PushSource::Tcp(addr.clone())
        } else {
            PushSource::WebSocket(self.ws_url())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn parses_intervals() {
        assert_eq!(parse_interval("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_interval("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_interval("1.5m").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_interval("3").unwrap(), Duration::from_secs(3));
        assert!(parse_interval("0s").is_err());
        assert!(parse_interval("soon").is_err());
    }

    #[test]
    fn ws_url_follows_api_scheme() {
        assert_eq!(derive_ws_url("http://localhost:8081"), "ws://localhost:8081/ws");
        assert_eq!(derive_ws_url("https://pulsar.io/"), "wss://pulsar.io/ws");
    }

    #[test]
    fn file_layer_and_overrides() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "api_url = \"http://file:1\"").unwrap();
        writeln!(file, "refresh = \"30s\"").unwrap();
        writeln!(file, "tcp = \"relay:9000\"").unwrap();

        let overrides = Overrides {
            refresh: Some("5s".into()),
            ..Default::default()
        };
        let settings = Settings::load(Some(file.path()), &overrides).unwrap();

        assert_eq!(settings.api_url, "http://file:1");
        assert_eq!(settings.refresh_interval().unwrap(), Duration::from_secs(5));
        assert_eq!(settings.push_source(), PushSource::Tcp("relay:9000".into()));
        assert_eq!(settings.preferences, PathBuf::from("pulsar-prefs.json"));
    }

    #[test]
    fn replay_wins_over_network_sources() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "tcp = \"relay:9000\"").unwrap();

        let overrides = Overrides {
            replay: Some(PathBuf::from("capture.jsonl")),
            ws_url: Some("ws://elsewhere/ws".into()),
            ..Default::default()
        };
        let settings = Settings::load(Some(file.path()), &overrides).unwrap();
        assert_eq!(
            settings.push_source(),
            PushSource::Replay(PathBuf::from("capture.jsonl"))
        );
        assert_eq!(settings.ws_url(), "ws://elsewhere/ws");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/pulsar.toml")), &Overrides::default());
        assert!(result.is_err());
    }
}
