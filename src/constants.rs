//! Crate-wide tunable defaults. `IndexOptions` starts from these values.

use std::time::Duration;

/// File name of the term-dictionary snapshot inside the index directory.
pub const TERMS_SNAPSHOT_FILE: &str = "terms.json";

/// Sub-directory of the index directory holding per-term postings logs.
pub const POSTINGS_DIR: &str = "postings";

/// Extension (without the dot) of files accepted for indexing.
pub const TEXT_EXTENSION: &str = "txt";

/// Record separator between serialized postings in a term's blob.
pub const POSTING_SEPARATOR: char = '|';

/// Appended-byte volume that triggers a proactive flush before the next
/// document is indexed.
pub const DEFAULT_FLUSH_HIGH_WATER_BYTES: usize = 50 * 1024 * 1024;

/// Process RSS ceiling above which the memory monitor requests a flush.
pub const DEFAULT_MEMORY_CEILING_BYTES: u64 = 1024 * 1024 * 1024;

/// Interval between memory monitor probes.
pub const DEFAULT_MONITOR_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Character width of the text window captured around a match.
pub const DEFAULT_SNIPPET_WINDOW_CHARS: usize = 150;

/// zstd level used when writing postings chunks.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Delay between retries when a postings file is held by another writer.
pub const STORE_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Lock acquisition attempts before falling back to a blocking wait.
pub const STORE_RETRY_LIMIT: u32 = 8;
