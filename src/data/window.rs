//! Scrub cursor and live/history mode over a series buffer.

use super::sample::Sample;
use super::series::SeriesBuffer;

/// Tracks which fixed-size slice of a [`SeriesBuffer`] is visible.
///
/// In live mode the window follows the tail as the buffer grows. Scrubbing
/// back more than one step from the tail pins it (history mode); scrubbing to
/// the last or second-to-last position resumes live tailing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowController {
    cursor: usize,
    window_size: usize,
    len: usize,
    live: bool,
}

impl WindowController {
    /// Start in live mode over a buffer currently holding `len` samples.
    pub fn new(window_size: usize, len: usize) -> Self {
        Self {
            cursor: len.saturating_sub(window_size),
            window_size,
            len,
            live: true,
        }
    }

    /// Build a live controller sized for `buffer`'s series kind.
    pub fn for_buffer(buffer: &SeriesBuffer) -> Self {
        Self::new(buffer.kind().window_size(), buffer.len())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Largest valid cursor for the current buffer length.
    pub fn max_cursor(&self) -> usize {
        self.len.saturating_sub(self.window_size)
    }

    /// Record a new buffer length.
    ///
    /// Live windows snap to the tail. A pinned window keeps its cursor unless
    /// eviction shrank the buffer below it.
    pub fn on_buffer_grow(&mut self, len: usize) {
        self.len = len;
        if self.live {
            self.cursor = self.max_cursor();
        } else {
            self.cursor = self.cursor.min(self.max_cursor());
        }
    }

    /// Move the cursor to `target`, clamped into range, and derive the mode.
    pub fn on_scrub(&mut self, target: i64) {
        let max = self.max_cursor();
        let clamped = target.clamp(0, max as i64) as usize;
        self.cursor = clamped;
        self.live = clamped + 1 >= max;
    }

    pub fn scrub_by(&mut self, delta: i64) {
        self.on_scrub(self.cursor as i64 + delta);
    }

    pub fn jump_to_oldest(&mut self) {
        self.on_scrub(0);
    }

    pub fn jump_to_live(&mut self) {
        self.on_scrub(self.max_cursor() as i64);
    }

    /// Cursor position as a fraction of the scrub range, 1.0 at the tail.
    pub fn progress(&self) -> f64 {
        let max = self.max_cursor();
        if max == 0 {
            1.0
        } else {
            self.cursor as f64 / max as f64
        }
    }

    /// Index range of the visible window, clamped to the buffer.
    pub fn range(&self) -> (usize, usize) {
        let start = self.cursor.min(self.len);
        (start, (start + self.window_size).min(self.len))
    }

    /// The samples currently in view.
    pub fn visible_window<'a>(&self, buffer: &'a SeriesBuffer) -> Vec<&'a Sample> {
        buffer.slice(self.cursor, self.cursor + self.window_size)
    }

    /// Time label of the sample at `index`, used for ruler ticks.
    pub fn label_at(&self, buffer: &SeriesBuffer, index: usize) -> Option<String> {
        buffer.get(index).map(Sample::time_label)
    }
}
