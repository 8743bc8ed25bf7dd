//! Index maintenance: tokenize documents, group occurrences by term,
//! buffer serialized postings, and flush buffers to the store under
//! size or memory pressure.
//!
//! Invariants: at most one flush runs at a time; indexing workers pause
//! while a flush is in progress; a document that fails to index is
//! logged and skipped without failing the batch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use rayon::prelude::*;

use crate::constants::{POSTINGS_DIR, POSTING_SEPARATOR, TERMS_SNAPSHOT_FILE, TEXT_EXTENSION};
use crate::dictionary::TermDictionary;
use crate::error::{PhrasedexError, Result};
use crate::search::IndexSearcher;
use crate::store::PostingsStore;
use crate::tokenizer::tokenize;
use crate::types::{IndexOptions, Token};

/// Point-in-time counters for an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    /// Distinct terms known to the dictionary.
    pub term_count: usize,
    /// Bytes appended to term buffers since the last completed flush.
    pub buffered_bytes: usize,
}

/// Gate that admits at most one flush and lets indexing workers wait for
/// an in-progress flush to finish instead of spinning.
#[derive(Debug, Default)]
struct FlushGate {
    flushing: Mutex<bool>,
    idle: Condvar,
}

impl FlushGate {
    /// Claim the gate; `false` means a flush is already running and the
    /// caller's request is a no-op.
    fn try_begin(&self) -> bool {
        let mut flushing = self.flushing.lock().unwrap_or_else(PoisonError::into_inner);
        if *flushing {
            return false;
        }
        *flushing = true;
        true
    }

    fn end(&self) {
        let mut flushing = self.flushing.lock().unwrap_or_else(PoisonError::into_inner);
        *flushing = false;
        self.idle.notify_all();
    }

    /// Block until no flush is in progress.
    fn wait_until_idle(&self) {
        let mut flushing = self.flushing.lock().unwrap_or_else(PoisonError::into_inner);
        while *flushing {
            flushing = self
                .idle
                .wait(flushing)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Builds and maintains an inverted index rooted at a directory.
///
/// All methods take `&self`; the indexer is shared behind an [`Arc`] with
/// the memory monitor and any searcher handles.
#[derive(Debug)]
pub struct Indexer {
    index_dir: PathBuf,
    options: IndexOptions,
    dictionary: Arc<TermDictionary>,
    store: Arc<PostingsStore>,
    pool: rayon::ThreadPool,
    bytes_since_flush: AtomicUsize,
    gate: FlushGate,
}

impl Indexer {
    /// Open (creating if needed) the index at `index_dir`. A prior term
    /// snapshot is loaded if present; missing or corrupt state is a cold
    /// start, never an error.
    pub fn open(index_dir: &Path, options: IndexOptions) -> Result<Self> {
        fs_err::create_dir_all(index_dir)?;

        let dictionary = Arc::new(TermDictionary::load(&index_dir.join(TERMS_SNAPSHOT_FILE)));
        let store = Arc::new(PostingsStore::open(
            &index_dir.join(POSTINGS_DIR),
            options.compression_level,
        )?);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.worker_threads.max(1))
            .thread_name(|i| format!("phrasedex-worker-{i}"))
            .build()
            .map_err(|err| PhrasedexError::WorkerPool {
                reason: err.to_string(),
            })?;

        tracing::info!(
            index_dir = %index_dir.display(),
            terms = dictionary.len(),
            workers = options.worker_threads,
            "index opened"
        );

        Ok(Self {
            index_dir: index_dir.to_path_buf(),
            options,
            dictionary,
            store,
            pool,
            bytes_since_flush: AtomicUsize::new(0),
            gate: FlushGate::default(),
        })
    }

    #[must_use]
    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    #[must_use]
    pub fn dictionary(&self) -> &Arc<TermDictionary> {
        &self.dictionary
    }

    #[must_use]
    pub fn store(&self) -> &Arc<PostingsStore> {
        &self.store
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            term_count: self.dictionary.len(),
            buffered_bytes: self.bytes_since_flush.load(Ordering::Relaxed),
        }
    }

    /// A searcher sharing this index's dictionary and store.
    #[must_use]
    pub fn searcher(&self) -> IndexSearcher {
        IndexSearcher::new(
            Arc::clone(&self.dictionary),
            Arc::clone(&self.store),
            self.options.snippet_window_chars,
        )
    }

    /// Index every path in `paths`. Non-text files are skipped silently;
    /// a document that fails to read or tokenize is logged and skipped.
    /// Buffers are flushed proactively past the high-water mark and once,
    /// unconditionally, after the whole batch.
    pub fn index_documents(&self, paths: &[PathBuf]) -> Result<()> {
        let total = paths.len();
        for (i, path) in paths.iter().enumerate() {
            if self.bytes_since_flush.load(Ordering::Relaxed) > self.options.flush_high_water_bytes
            {
                tracing::info!("buffer high-water mark reached, flushing");
                self.flush()?;
            }

            tracing::info!(
                path = %path.display(),
                current = i + 1,
                total,
                "indexing document"
            );
            if let Err(err) = self.index_document(path) {
                tracing::warn!(path = %path.display(), error = %err, "document skipped");
            }
        }

        self.flush()?;
        tracing::info!(
            documents = total,
            terms = self.dictionary.len(),
            "indexing complete"
        );
        Ok(())
    }

    fn index_document(&self, path: &Path) -> Result<()> {
        if !is_text_file(path) {
            tracing::debug!(path = %path.display(), "not a text file, skipped");
            return Ok(());
        }

        // Cooperative backpressure: pause here, on the calling thread,
        // while a flush is in progress. Pool tasks themselves never block
        // on the gate, so a concurrent flush can always make progress on
        // the same pool.
        self.gate.wait_until_idle();

        let text = fs_err::read_to_string(path)?;
        let document_key = path.to_string_lossy().into_owned();
        let tokens = tokenize(&text, &document_key);
        tracing::debug!(path = %path.display(), tokens = tokens.len(), "tokenized");

        let groups = group_by_term(tokens);
        self.pool.install(|| {
            groups
                .par_iter()
                .try_for_each(|(term_text, occurrences)| self.append_group(term_text, occurrences))
        })
    }

    /// Serialize one term's occurrences and append them to its buffer.
    /// Appends racing a flush are harmless: the per-term lock serializes
    /// them against the flusher's snapshot, and anything appended after
    /// the snapshot rides the next flush.
    fn append_group(&self, term_text: &str, occurrences: &[Token]) -> Result<()> {
        let term = self.dictionary.get_or_create(term_text);
        let mut block = String::new();
        for token in occurrences {
            block.push_str(&serde_json::to_string(token)?);
            block.push(POSTING_SEPARATOR);
        }

        self.bytes_since_flush
            .fetch_add(block.len(), Ordering::Relaxed);
        term.append(&block);
        Ok(())
    }

    /// Persist every dirty term buffer to the store and write a fresh
    /// dictionary snapshot. Concurrent flush requests are no-ops.
    pub fn flush(&self) -> Result<()> {
        if !self.gate.try_begin() {
            tracing::debug!("flush already in progress, request ignored");
            return Ok(());
        }

        let result = self.flush_buffers();
        self.gate.end();
        result?;

        self.dictionary
            .save_snapshot(&self.index_dir.join(TERMS_SNAPSHOT_FILE))?;
        Ok(())
    }

    fn flush_buffers(&self) -> Result<()> {
        let terms = self.dictionary.terms();
        let flushed = AtomicUsize::new(0);

        self.pool.install(|| {
            terms.par_iter().try_for_each(|term| {
                let snapshot = term.take_buffer();
                if snapshot.is_empty() {
                    return Ok(());
                }
                match self.store.append_entry(term.id(), &snapshot) {
                    Ok(()) => {
                        flushed.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    }
                    Err(err) => {
                        // Put the snapshot back so nothing is lost; the
                        // next flush retries this term.
                        term.append(&snapshot);
                        Err(err)
                    }
                }
            })
        })?;

        self.bytes_since_flush.store(0, Ordering::Relaxed);
        tracing::debug!(terms_flushed = flushed.load(Ordering::Relaxed), "flush complete");
        Ok(())
    }
}

impl Drop for Indexer {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TEXT_EXTENSION))
}

/// Group tokens by term text, preserving token-processing order inside
/// each group. Group-to-group order is irrelevant: the query engine sorts
/// positions before matching.
fn group_by_term(tokens: Vec<Token>) -> Vec<(String, Vec<Token>)> {
    let mut groups: std::collections::HashMap<String, Vec<Token>> =
        std::collections::HashMap::new();
    for token in tokens {
        groups.entry(token.text.clone()).or_default().push(token);
    }
    groups.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_doc(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn non_text_files_are_skipped() {
        let docs = TempDir::new().unwrap();
        let index = TempDir::new().unwrap();
        let doc = write_doc(&docs, "notes.md", "cat sat");

        let indexer = Indexer::open(index.path(), IndexOptions::default()).unwrap();
        indexer.index_documents(&[doc]).unwrap();
        assert_eq!(indexer.stats().term_count, 0);
    }

    #[test]
    fn indexing_continues_past_unreadable_documents() {
        let docs = TempDir::new().unwrap();
        let index = TempDir::new().unwrap();
        let missing = docs.path().join("gone.txt");
        let good = write_doc(&docs, "good.txt", "cat sat");

        let indexer = Indexer::open(index.path(), IndexOptions::default()).unwrap();
        indexer.index_documents(&[missing, good]).unwrap();
        assert_eq!(indexer.stats().term_count, 2);
    }

    #[test]
    fn batch_end_flush_clears_buffers_and_persists() {
        let docs = TempDir::new().unwrap();
        let index = TempDir::new().unwrap();
        let doc = write_doc(&docs, "doc.txt", "cat sat on the mat");

        let indexer = Indexer::open(index.path(), IndexOptions::default()).unwrap();
        indexer.index_documents(&[doc]).unwrap();

        assert_eq!(indexer.stats().buffered_bytes, 0);
        let cat = indexer.dictionary().resolve("cat").expect("cat indexed");
        let blob = indexer.store().get_entry(cat).unwrap().expect("flushed");
        assert!(blob.contains("\"position\":1"));
        assert!(index.path().join(TERMS_SNAPSHOT_FILE).exists());
    }

    #[test]
    fn high_water_mark_forces_mid_batch_flush() {
        let docs = TempDir::new().unwrap();
        let index = TempDir::new().unwrap();
        let first = write_doc(&docs, "a.txt", "alpha beta");
        let second = write_doc(&docs, "b.txt", "gamma delta");

        let options = IndexOptions::builder().flush_high_water_bytes(1).build();
        let indexer = Indexer::open(index.path(), options).unwrap();
        indexer.index_documents(&[first, second]).unwrap();

        let alpha = indexer.dictionary().resolve("alpha").expect("alpha");
        assert!(indexer.store().get_entry(alpha).unwrap().is_some());
    }

    #[test]
    fn flush_gate_admits_one_flusher() {
        let gate = FlushGate::default();
        assert!(gate.try_begin());
        assert!(!gate.try_begin());
        gate.end();
        assert!(gate.try_begin());
        gate.end();
    }

    #[test]
    fn reindexing_same_path_accumulates_postings() {
        let docs = TempDir::new().unwrap();
        let index = TempDir::new().unwrap();
        let doc = write_doc(&docs, "doc.txt", "cat");

        let indexer = Indexer::open(index.path(), IndexOptions::default()).unwrap();
        indexer.index_documents(&[doc.clone()]).unwrap();
        indexer.index_documents(&[doc]).unwrap();

        let cat = indexer.dictionary().resolve("cat").unwrap();
        let blob = indexer.store().get_entry(cat).unwrap().unwrap();
        assert_eq!(blob.matches("documentKey").count(), 2);
    }
}
