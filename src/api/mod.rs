//! Request/response access to the Pulsar API.
//!
//! The dashboard needs five calls: list targets, fetch one target's probe
//! history, fetch recent host history, create a target, delete a target.
//! [`DashboardApi`] names them; [`ConnectClient`] implements them over HTTP.

mod connect;
mod error;
mod wire;

pub use connect::{
    decode_envelope, encode_envelope, ConnectClient, ConnectClientBuilder, Envelope,
    DEFAULT_BASE_URL, FLAG_COMPRESSED, FLAG_END_STREAM, MAX_ENVELOPE_LEN, SERVICE,
};
pub use error::ApiError;

use async_trait::async_trait;

use crate::data::{MonitorTarget, ProbeRecord, SystemHistory};

/// Calls the dashboard makes against the backend.
///
/// History batches are returned newest-first, as the server stores them.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Flat list of monitored targets.
    async fn list_targets(&self) -> Result<Vec<MonitorTarget>, ApiError>;

    /// Past probes of one target.
    async fn target_history(&self, id: &str) -> Result<Vec<ProbeRecord>, ApiError>;

    /// Recent host history, or `None` if the server has none yet.
    async fn system_history(&self) -> Result<Option<SystemHistory>, ApiError>;

    async fn create_target(&self, url: &str, interval_seconds: u32)
        -> Result<MonitorTarget, ApiError>;

    async fn delete_target(&self, id: &str) -> Result<(), ApiError>;
}
