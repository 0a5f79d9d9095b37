//! WebSocket event source.
//!
//! Connects to the Pulsar push endpoint (`ws://host:port/ws`) and forwards
//! every text frame. A dropped connection is reported, not retried.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::{EventSource, LinkState};

/// Default push endpoint.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8081/ws";

/// An event source reading the push channel over WebSocket.
#[derive(Debug)]
pub struct WsSource {
    receiver: mpsc::Receiver<String>,
    description: String,
    link: LinkState,
}

impl WsSource {
    /// Start connecting to `url` on a background task.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn(url: &str) -> Self {
        let (tx, rx) = mpsc::channel(256);
        let link = LinkState::new();
        let task_link = link.clone();
        let target = url.to_string();

        tokio::spawn(async move {
            info!(url = %target, "Connecting to push channel");
            let mut ws = match connect_async(target.as_str()).await {
                Ok((ws, _)) => ws,
                Err(e) => {
                    warn!(url = %target, error = %e, "Push channel connect failed");
                    task_link.set_error(format!("Connect error: {}", e));
                    return;
                }
            };
            task_link.set_connected();

            while let Some(msg) = ws.next().await {
                let frame = match msg {
                    Ok(Message::Text(text)) => text.to_string(),
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            warn!("Dropping non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "Closed by server".to_string());
                        info!(reason = %reason, "Push channel closed");
                        task_link.set_error(reason);
                        return;
                    }
                    Ok(_) => {
                        debug!("Ignoring control frame");
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, "Push channel read failed");
                        task_link.set_error(format!("Read error: {}", e));
                        return;
                    }
                };
                if tx.send(frame).await.is_err() {
                    // Receiver dropped
                    return;
                }
            }
            task_link.set_error("Connection closed");
        });

        Self {
            receiver: rx,
            description: format!("ws: {}", url),
            link,
        }
    }
}

impl EventSource for WsSource {
    fn poll(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    fn error(&self) -> Option<String> {
        self.link.error()
    }
}
