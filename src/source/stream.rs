//! Stream-based event source.
//!
//! Receives newline-delimited push frames from an async byte stream, such as
//! a TCP connection to a relay of the push channel.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{EventSource, LinkState};

/// An event source that reads frames from an async stream.
///
/// A background task reads one frame per line and makes frames available via
/// `poll()`. Blank lines are skipped.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use pulsar_watch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"type\":\"system\",\"data\":{}}\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<String>,
    description: String,
    link: LinkState,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(256);
        let link = LinkState::new();
        link.set_connected();
        let task_link = link.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!("Stream reached EOF");
                        task_link.set_error("Connection closed");
                        break;
                    }
                    Ok(_) => {
                        let frame = line.trim();
                        if frame.is_empty() {
                            continue;
                        }
                        if tx.send(frame.to_string()).await.is_err() {
                            // Receiver dropped
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Stream read failed");
                        task_link.set_error(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            link,
        }
    }

    /// Connect to a TCP relay and read frames from it.
    pub async fn connect(addr: &str) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::spawn(stream, &format!("tcp://{}", addr)))
    }

    /// Create a StreamSource from a channel of raw bytes.
    ///
    /// Each message is one frame. Frames that are not UTF-8 are dropped.
    pub fn from_bytes_channel(mut rx: mpsc::Receiver<Vec<u8>>, description: &str) -> Self {
        let (tx, frame_rx) = mpsc::channel(256);
        let link = LinkState::new();
        link.set_connected();
        let task_link = link.clone();

        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                match String::from_utf8(bytes) {
                    Ok(frame) => {
                        if tx.send(frame).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Dropping non-UTF-8 frame");
                    }
                }
            }
            task_link.set_error("Channel closed");
        });

        Self {
            receiver: frame_rx,
            description: format!("stream: {}", description),
            link,
        }
    }
}

impl EventSource for StreamSource {
    fn poll(&mut self) -> Option<String> {
        match self.receiver.try_recv() {
            Ok(frame) => Some(frame),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                if self.link.is_connected() {
                    self.link.set_error("Stream disconnected");
                }
                None
            }
        }
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
