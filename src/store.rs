//! Persistent term-id→blob postings store.
//!
//! Each term id owns one chunk-log file: every flush appends a single
//! frame of `[len: u32 LE][zstd-compressed text]`. Reads decompress and
//! concatenate every frame, so the full accumulated postings for a term
//! come back as one contiguous string, in flush order. Appending a chunk
//! never rewrites earlier chunks.
//!
//! Appends to the same term id are serialized by an exclusive file lock;
//! appends to distinct ids proceed independently. Lock contention is
//! transient by design — writers retry, then block.

use std::fs::{File, OpenOptions};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::constants::{STORE_RETRY_DELAY, STORE_RETRY_LIMIT};
use crate::error::{PhrasedexError, Result};

const CHUNK_HEADER_BYTES: usize = 4;

/// Append-only compressed postings storage under a single directory.
#[derive(Debug)]
pub struct PostingsStore {
    dir: PathBuf,
    compression_level: i32,
}

impl PostingsStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: &Path, compression_level: i32) -> Result<Self> {
        fs_err::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            compression_level,
        })
    }

    fn entry_path(&self, term_id: u32) -> PathBuf {
        self.dir.join(format!("{term_id}.post"))
    }

    /// Logically append `text` to the blob for `term_id`. Physically this
    /// writes one compressed chunk at the end of the term's log.
    pub fn append_entry(&self, term_id: u32, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let compressed = zstd::encode_all(text.as_bytes(), self.compression_level)
            .map_err(|err| PhrasedexError::Store {
                term_id,
                reason: format!("chunk compression failed: {err}"),
            })?;
        let chunk_len = u32::try_from(compressed.len()).map_err(|_| PhrasedexError::Store {
            term_id,
            reason: "chunk exceeds u32 framing".to_string(),
        })?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.entry_path(term_id))?;
        lock_with_retry(&file, term_id)?;

        // One write call for header + payload, so a torn append leaves at
        // most a truncated trailing frame for the reader to discard.
        let mut frame = Vec::with_capacity(CHUNK_HEADER_BYTES + compressed.len());
        frame.extend_from_slice(&chunk_len.to_le_bytes());
        frame.extend_from_slice(&compressed);

        let result = write_frame(&file, &frame);
        let _ = FileExt::unlock(&file);
        result?;

        tracing::debug!(
            term_id,
            chunk_bytes = compressed.len(),
            text_bytes = text.len(),
            "postings chunk appended"
        );
        Ok(())
    }

    /// Return the full accumulated postings text for `term_id`, or `None`
    /// if the term has never been flushed.
    pub fn get_entry(&self, term_id: u32) -> Result<Option<String>> {
        let path = self.entry_path(term_id);
        let bytes = match fs_err::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut text = String::new();
        let mut cursor = 0usize;
        while cursor + CHUNK_HEADER_BYTES <= bytes.len() {
            let header: [u8; CHUNK_HEADER_BYTES] = bytes[cursor..cursor + CHUNK_HEADER_BYTES]
                .try_into()
                .map_err(|_| PhrasedexError::CorruptPostings {
                    term_id,
                    offset: cursor as u64,
                    reason: "unreadable chunk header".to_string(),
                })?;
            let chunk_len = u32::from_le_bytes(header) as usize;
            let start = cursor + CHUNK_HEADER_BYTES;

            if chunk_len == 0 || start + chunk_len > bytes.len() {
                // A torn trailing frame from an interrupted append; the
                // chunks before it are intact and are all we return.
                tracing::warn!(
                    term_id,
                    offset = cursor,
                    "truncated postings chunk, returning prefix"
                );
                break;
            }

            let chunk = zstd::decode_all(Cursor::new(&bytes[start..start + chunk_len])).map_err(
                |err| PhrasedexError::CorruptPostings {
                    term_id,
                    offset: cursor as u64,
                    reason: format!("chunk decompression failed: {err}"),
                },
            )?;
            let chunk = String::from_utf8(chunk).map_err(|err| PhrasedexError::CorruptPostings {
                term_id,
                offset: cursor as u64,
                reason: format!("chunk is not utf-8: {err}"),
            })?;

            text.push_str(&chunk);
            cursor = start + chunk_len;
        }

        Ok(Some(text))
    }
}

/// Acquire an exclusive lock on a term's log, retrying through transient
/// contention and finally blocking rather than failing.
fn lock_with_retry(file: &File, term_id: u32) -> Result<()> {
    for attempt in 0..STORE_RETRY_LIMIT {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                tracing::debug!(term_id, attempt, "postings file contended, retrying");
                std::thread::sleep(STORE_RETRY_DELAY);
            }
            Err(err) => {
                return Err(PhrasedexError::Store {
                    term_id,
                    reason: format!("lock failed: {err}"),
                });
            }
        }
    }
    file.lock_exclusive().map_err(|err| PhrasedexError::Store {
        term_id,
        reason: format!("blocking lock failed: {err}"),
    })
}

fn write_frame(mut file: &File, frame: &[u8]) -> Result<()> {
    file.write_all(frame)?;
    file.sync_all()?;
    Ok(())
}
