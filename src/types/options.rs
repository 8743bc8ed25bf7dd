//! Builder-style options controlling index maintenance.

use std::time::Duration;

use crate::constants::{
    DEFAULT_COMPRESSION_LEVEL, DEFAULT_FLUSH_HIGH_WATER_BYTES, DEFAULT_MEMORY_CEILING_BYTES,
    DEFAULT_MONITOR_POLL_INTERVAL, DEFAULT_SNIPPET_WINDOW_CHARS,
};

/// Tunable options for an [`Indexer`](crate::Indexer).
///
/// Controls flush thresholds, memory backpressure, worker parallelism and
/// snippet shaping. Builders make it easy to set only what you need.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Appended-byte volume since the last flush that forces a flush
    /// before the next document is indexed.
    pub flush_high_water_bytes: usize,
    /// Process RSS ceiling; the memory monitor requests a flush above it.
    pub memory_ceiling_bytes: u64,
    /// Interval between memory monitor probes.
    pub monitor_poll_interval: Duration,
    /// Worker threads for token-group and flush parallelism.
    pub worker_threads: usize,
    /// Character width of the snippet window around a match.
    pub snippet_window_chars: usize,
    /// zstd level for postings chunks (0 disables, 3 balanced, 19 max).
    pub compression_level: i32,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            flush_high_water_bytes: DEFAULT_FLUSH_HIGH_WATER_BYTES,
            memory_ceiling_bytes: DEFAULT_MEMORY_CEILING_BYTES,
            monitor_poll_interval: DEFAULT_MONITOR_POLL_INTERVAL,
            worker_threads: num_cpus::get(),
            snippet_window_chars: DEFAULT_SNIPPET_WINDOW_CHARS,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl IndexOptions {
    /// Start a fluent builder for `IndexOptions`.
    #[must_use]
    pub fn builder() -> IndexOptionsBuilder {
        IndexOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexOptionsBuilder {
    inner: IndexOptions,
}

impl IndexOptionsBuilder {
    #[must_use]
    pub fn flush_high_water_bytes(mut self, bytes: usize) -> Self {
        self.inner.flush_high_water_bytes = bytes;
        self
    }

    #[must_use]
    pub fn memory_ceiling_bytes(mut self, bytes: u64) -> Self {
        self.inner.memory_ceiling_bytes = bytes;
        self
    }

    #[must_use]
    pub fn monitor_poll_interval(mut self, interval: Duration) -> Self {
        self.inner.monitor_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.inner.worker_threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn snippet_window_chars(mut self, chars: usize) -> Self {
        self.inner.snippet_window_chars = chars;
        self
    }

    #[must_use]
    pub fn compression_level(mut self, level: i32) -> Self {
        self.inner.compression_level = level;
        self
    }

    #[must_use]
    pub fn build(self) -> IndexOptions {
        self.inner
    }
}
