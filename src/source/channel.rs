//! Channel-based event source.
//!
//! Receives raw frames through a tokio mpsc channel. Useful for embedding
//! the dashboard core behind another transport, and in tests.

use tokio::sync::mpsc;

use super::EventSource;

const CHANNEL_CAPACITY: usize = 256;

/// An event source fed by an in-process channel.
///
/// The source counts as connected while any sender is alive.
///
/// # Example
///
/// ```
/// use pulsar_watch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("in-process");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<String>,
    description: String,
    closed: bool,
}

impl ChannelSource {
    /// Wrap the receiving end of a frame channel.
    pub fn new(receiver: mpsc::Receiver<String>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            closed: false,
        }
    }

    /// Create a sender and a source reading from it.
    pub fn create(source_description: &str) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (tx, Self::new(rx, source_description))
    }
}

impl EventSource for ChannelSource {
    fn poll(&mut self) -> Option<String> {
        match self.receiver.try_recv() {
            Ok(frame) => Some(frame),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_connected(&self) -> bool {
        !self.closed && !self.receiver.is_closed()
    }

    fn error(&self) -> Option<String> {
        self.closed.then(|| "Channel closed".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_frames_in_order() {
        let (tx, mut source) = ChannelSource::create("test");
        assert!(source.poll().is_none());

        tx.try_send("one".to_string()).unwrap();
        tx.try_send("two".to_string()).unwrap();

        assert_eq!(source.poll().as_deref(), Some("one"));
        assert_eq!(source.poll().as_deref(), Some("two"));
        assert!(source.poll().is_none());
        assert!(source.is_connected());
        assert_eq!(source.description(), "channel: test");
    }

    #[test]
    fn dropping_sender_disconnects() {
        let (tx, mut source) = ChannelSource::create("test");
        tx.try_send("last".to_string()).unwrap();
        drop(tx);

        // Buffered frames drain before the close is seen
        assert_eq!(source.poll().as_deref(), Some("last"));
        assert!(source.poll().is_none());
        assert!(!source.is_connected());
        assert_eq!(source.error().as_deref(), Some("Channel closed"));
    }
}
