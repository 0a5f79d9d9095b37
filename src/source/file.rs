//! File-based event source.
//!
//! Replays a capture of the push channel, one frame per line.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::info;

use super::EventSource;

/// Default gap between replayed frames. Series label samples by the second,
/// so faster replay would fold consecutive snapshots into one.
pub const DEFAULT_REPLAY_INTERVAL: Duration = Duration::from_secs(1);

/// A source that replays frames recorded in a file.
///
/// The file is read on the first poll. After that a poll yields the next
/// frame once `interval` has passed since the previous one. Blank lines are
/// skipped. Once loaded, the source reports itself as connected until every
/// frame has been handed out.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    frames: Option<VecDeque<String>>,
    interval: Duration,
    last_frame: Option<Instant>,
}

impl FileSource {
    /// Create a new replay source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("replay: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            frames: None,
            interval: DEFAULT_REPLAY_INTERVAL,
            last_frame: None,
        }
    }

    /// Set the gap between replayed frames.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames not yet handed out, if the file has been loaded.
    pub fn remaining(&self) -> Option<usize> {
        self.frames.as_ref().map(VecDeque::len)
    }

    fn load(&mut self) {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let frames: VecDeque<String> = content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
                info!(path = %self.path.display(), frames = frames.len(), "Loaded replay file");
                self.last_error = None;
                self.frames = Some(frames);
            }
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
            }
        }
    }
}

impl EventSource for FileSource {
    fn poll(&mut self) -> Option<String> {
        if self.frames.is_none() {
            self.load();
        }
        if self
            .last_frame
            .is_some_and(|at| at.elapsed() < self.interval)
        {
            return None;
        }
        let frame = self.frames.as_mut()?.pop_front()?;
        self.last_frame = Some(Instant::now());
        Some(frame)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_connected(&self) -> bool {
        self.frames.as_ref().is_some_and(|f| !f.is_empty())
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn is_paced(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn new_source_is_idle() {
        let source = FileSource::new("/tmp/capture.jsonl");
        assert_eq!(source.path(), Path::new("/tmp/capture.jsonl"));
        assert_eq!(source.description(), "replay: /tmp/capture.jsonl");
        assert!(source.error().is_none());
        assert!(!source.is_connected());
    }

    #[test]
    fn replays_one_frame_per_poll() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "first").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  second  ").unwrap();

        let mut source = FileSource::new(file.path()).with_interval(Duration::ZERO);
        assert_eq!(source.poll().as_deref(), Some("first"));
        assert!(source.is_connected());
        assert_eq!(source.remaining(), Some(1));
        assert_eq!(source.poll().as_deref(), Some("second"));
        assert!(source.poll().is_none());
        assert!(!source.is_connected());
    }

    #[test]
    fn holds_frames_until_interval_passes() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "first").unwrap();
        writeln!(file, "second").unwrap();

        let mut source = FileSource::new(file.path()).with_interval(Duration::from_secs(60));
        assert!(source.is_paced());
        assert_eq!(source.poll().as_deref(), Some("first"));
        assert!(source.poll().is_none());
        assert_eq!(source.remaining(), Some(1));
        assert!(source.is_connected());
    }

    #[test]
    fn missing_file_reports_error() {
        let mut source = FileSource::new("/nonexistent/path/capture.jsonl");
        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
        assert!(source.remaining().is_none());
    }
}
