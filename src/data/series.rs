//! Bounded, time-ordered sample storage for one metric series.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Local};

use super::sample::{Sample, SampleValue};

/// Maximum number of samples kept for a system metric series.
pub const SYSTEM_HISTORY_SIZE: usize = 100;

/// Maximum number of samples kept for a URL-probe series.
pub const PROBE_HISTORY_SIZE: usize = 1000;

/// Spacing of the synthetic timestamps given to backfilled values.
pub const DATA_INTERVAL_MS: i64 = 15_000;

/// Which family a series belongs to. Decides capacity, window size and
/// whether repeated display ticks collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    /// Host-level metric fed by system snapshots.
    System,
    /// Latency series of one monitored URL.
    Probe,
}

impl SeriesKind {
    pub fn capacity(self) -> usize {
        match self {
            SeriesKind::System => SYSTEM_HISTORY_SIZE,
            SeriesKind::Probe => PROBE_HISTORY_SIZE,
        }
    }

    /// Number of samples shown at once in the detail chart.
    pub fn window_size(self) -> usize {
        match self {
            SeriesKind::System => 50,
            SeriesKind::Probe => 40,
        }
    }

    /// Probe cadence may be faster than the display tick, so only system
    /// series drop samples that land on the tail's tick.
    fn collapses_ticks(self) -> bool {
        matches!(self, SeriesKind::System)
    }
}

/// Order of a bulk history batch as delivered by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOrder {
    OldestFirst,
    NewestFirst,
}

/// Ring buffer of samples, oldest first.
///
/// Holds at most `capacity` samples; when exceeded the oldest are evicted.
/// A bulk history batch can be prepended exactly once per buffer lifetime.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
    kind: SeriesKind,
    backfilled: bool,
}

impl SeriesBuffer {
    /// Create an empty buffer with the default capacity for `kind`.
    pub fn new(kind: SeriesKind) -> Self {
        Self::with_capacity(kind, kind.capacity())
    }

    pub fn with_capacity(kind: SeriesKind, capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity,
            kind,
            backfilled: false,
        }
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the one-shot history backfill has already run.
    pub fn is_backfilled(&self) -> bool {
        self.backfilled
    }

    /// Backfill raw values, stamping them backwards from now.
    ///
    /// Returns `true` if the batch was applied.
    pub fn prepend(&mut self, values: Vec<SampleValue>, order: BatchOrder) -> bool {
        self.prepend_at(values, order, Local::now())
    }

    /// Backfill raw values with synthetic timestamps ending at `now`.
    ///
    /// The newest value is stamped `now`, each older one `DATA_INTERVAL_MS`
    /// earlier. An empty batch is ignored and leaves the latch open.
    pub fn prepend_at(
        &mut self,
        mut values: Vec<SampleValue>,
        order: BatchOrder,
        now: DateTime<Local>,
    ) -> bool {
        if self.backfilled || values.is_empty() {
            return false;
        }
        if order == BatchOrder::NewestFirst {
            values.reverse();
        }

        let newest = values.len() as i64 - 1;
        let samples = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let offset = Duration::milliseconds((newest - i as i64) * DATA_INTERVAL_MS);
                Sample::new(now - offset, value)
            })
            .collect();

        self.merge_backfill(samples)
    }

    /// Backfill samples that already carry real timestamps.
    ///
    /// Shares the load-once latch with [`SeriesBuffer::prepend`].
    pub fn prepend_samples(&mut self, mut samples: Vec<Sample>, order: BatchOrder) -> bool {
        if self.backfilled || samples.is_empty() {
            return false;
        }
        if order == BatchOrder::NewestFirst {
            samples.reverse();
        }
        self.merge_backfill(samples)
    }

    /// Put an oldest-first batch in front of everything held. Live samples
    /// keep their place after it; timestamps are not reconciled.
    fn merge_backfill(&mut self, samples: Vec<Sample>) -> bool {
        for sample in samples.into_iter().rev() {
            self.samples.push_front(sample);
        }
        self.evict();
        self.backfilled = true;
        true
    }

    /// Append a live sample.
    ///
    /// System series drop a sample whose time label equals the tail's.
    /// Returns `true` if the sample was stored.
    pub fn append(&mut self, sample: Sample) -> bool {
        if self.kind.collapses_ticks() {
            if let Some(tail) = self.samples.back() {
                if tail.same_tick(&sample) {
                    return false;
                }
            }
        }

        self.samples.push_back(sample);
        self.evict();
        true
    }

    fn evict(&mut self) {
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Samples in `[start, end)`, clamped to what is held.
    pub fn slice(&self, start: usize, end: usize) -> Vec<&Sample> {
        let end = end.min(self.samples.len());
        let start = start.min(end);
        self.samples.range(start..end).collect()
    }

    /// The newest `n` samples, oldest first.
    pub fn tail(&self, n: usize) -> Vec<&Sample> {
        let len = self.samples.len();
        self.slice(len.saturating_sub(n), len)
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}
