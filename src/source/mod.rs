//! Push-channel abstraction.
//!
//! This module provides a trait-based abstraction for receiving raw push
//! frames from various transports (WebSocket, TCP streams, replay files,
//! in-process channels). Sources do not parse frames; that is the job of
//! [`UpdateRouter`](crate::data::UpdateRouter).

mod channel;
mod file;
mod stream;
mod websocket;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use stream::StreamSource;
pub use websocket::WsSource;

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;

/// Trait for receiving push frames from various transports.
///
/// # Example
///
/// ```
/// use pulsar_watch::{ChannelSource, EventSource};
///
/// let (tx, mut source) = ChannelSource::create("test");
/// tx.try_send(r#"{"type":"system","data":{}}"#.to_string()).unwrap();
/// assert!(source.poll().is_some());
/// ```
pub trait EventSource: Send + Debug {
    /// Take the next raw frame, if one is waiting.
    ///
    /// This method must not block.
    fn poll(&mut self) -> Option<String>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Whether the underlying transport is currently up.
    fn is_connected(&self) -> bool;

    /// The last transport error, if any.
    fn error(&self) -> Option<String>;

    /// Whether the source releases frames at its own pace.
    ///
    /// Callers take at most one frame per tick from a paced source instead
    /// of draining it.
    fn is_paced(&self) -> bool {
        false
    }
}

/// Connection state shared between a source and its background task.
#[derive(Debug, Clone, Default)]
pub struct LinkState {
    inner: Arc<Mutex<LinkInner>>,
}

#[derive(Debug, Default)]
struct LinkInner {
    connected: bool,
    error: Option<String>,
}

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self) {
        let mut inner = self.inner.lock();
        inner.connected = true;
        inner.error = None;
    }

    /// Mark the link down with a reason.
    pub fn set_error(&self, error: impl Into<String>) {
        let mut inner = self.inner.lock();
        inner.connected = false;
        inner.error = Some(error.into());
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    pub fn error(&self) -> Option<String> {
        self.inner.lock().error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_state_tracks_last_error() {
        let link = LinkState::new();
        assert!(!link.is_connected());

        link.set_connected();
        assert!(link.is_connected());

        let handle = link.clone();
        handle.set_error("Connection closed");
        assert!(!link.is_connected());
        assert_eq!(link.error().as_deref(), Some("Connection closed"));

        link.set_connected();
        assert!(link.error().is_none());
    }
}
