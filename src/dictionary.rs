//! Term dictionary: concurrent text→id lookup plus an arena of term
//! records, each owning its postings buffer.
//!
//! Invariants: ids are dense (the arena index), assigned strictly in
//! creation order, and first-writer-wins under concurrent insertion. A
//! missing or corrupt snapshot yields an empty dictionary — startup never
//! fails on prior state.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};

use crate::error::{PhrasedexError, Result};

/// One dictionary entry: a distinct token text, its stable id, and the
/// in-memory postings accumulator that flushes to the store.
#[derive(Debug)]
pub struct Term {
    id: u32,
    text: String,
    buffer: Mutex<String>,
}

impl Term {
    fn new(id: u32, text: String) -> Self {
        Self {
            id,
            text,
            buffer: Mutex::new(String::new()),
        }
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Append serialized posting records to this term's buffer. Writers
    /// to the same term are serialized by the buffer lock; writers to
    /// distinct terms proceed independently.
    pub fn append(&self, records: &str) {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.push_str(records);
    }

    /// Snapshot-and-clear the buffer under its lock. The returned text is
    /// handed to the store outside the critical section so indexing
    /// workers are not blocked for the duration of store I/O.
    pub fn take_buffer(&self) -> String {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut buffer)
    }

    /// Buffered byte count, for stats and tests.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    id: u32,
}

/// Concurrent term registry. Lookup goes through the text→id map; the
/// arena (indexed by id) owns the `Term` records and their buffers.
#[derive(Debug, Default)]
pub struct TermDictionary {
    map: RwLock<HashMap<String, u32>>,
    arena: RwLock<Vec<Arc<Term>>>,
}

impl TermDictionary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dictionary from a snapshot file. Missing or unreadable
    /// snapshots are a cold start, not an error.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let raw = match fs_err::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "no term snapshot, cold start");
                return Self::new();
            }
        };

        let entries: HashMap<String, SnapshotEntry> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "corrupt term snapshot, cold start");
                return Self::new();
            }
        };

        Self::from_entries(entries).unwrap_or_else(|| {
            tracing::warn!(path = %path.display(), "term snapshot ids not dense, cold start");
            Self::new()
        })
    }

    /// Rebuild map and arena from snapshot entries. Ids must form the
    /// dense range `0..n`; anything else is treated as corruption.
    fn from_entries(entries: HashMap<String, SnapshotEntry>) -> Option<Self> {
        let count = entries.len();
        let mut slots: Vec<Option<Arc<Term>>> = (0..count).map(|_| None).collect();
        let mut map = HashMap::with_capacity(count);

        for (text, entry) in entries {
            let slot = slots.get_mut(entry.id as usize)?;
            if slot.is_some() {
                return None;
            }
            *slot = Some(Arc::new(Term::new(entry.id, text.clone())));
            map.insert(text, entry.id);
        }

        let arena: Option<Vec<Arc<Term>>> = slots.into_iter().collect();
        Some(Self {
            map: RwLock::new(map),
            arena: RwLock::new(arena?),
        })
    }

    /// Number of distinct terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a term text to its id, if known.
    #[must_use]
    pub fn resolve(&self, text: &str) -> Option<u32> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(text)
            .copied()
    }

    /// Fetch the arena record for an id.
    #[must_use]
    pub fn term(&self, id: u32) -> Option<Arc<Term>> {
        self.arena
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id as usize)
            .cloned()
    }

    /// Look up or create the term for `text`. The first writer for a
    /// given text wins the id; every concurrent caller observes the same
    /// record.
    pub fn get_or_create(&self, text: &str) -> Arc<Term> {
        if let Some(id) = self.resolve(text) {
            if let Some(term) = self.term(id) {
                return term;
            }
        }

        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        let mut arena = self.arena.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(&id) = map.get(text) {
            return Arc::clone(&arena[id as usize]);
        }

        let id = arena.len() as u32;
        let term = Arc::new(Term::new(id, text.to_string()));
        arena.push(Arc::clone(&term));
        map.insert(text.to_string(), id);
        term
    }

    /// Snapshot of every arena entry, for flush iteration.
    #[must_use]
    pub fn terms(&self) -> Vec<Arc<Term>> {
        self.arena
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persist the text→id mapping as `{ "term": { "id": n } }` JSON,
    /// written atomically so a crash never leaves a half-written file.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let entries: BTreeMap<String, SnapshotEntry> = {
            let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
            map.iter()
                .map(|(text, &id)| (text.clone(), SnapshotEntry { id }))
                .collect()
        };

        let json = serde_json::to_string(&entries)?;
        let mut file = AtomicWriteFile::options().open(path)?;
        file.write_all(json.as_bytes())?;
        file.commit().map_err(|err| PhrasedexError::Snapshot {
            reason: format!("commit of {} failed: {err}", path.display()),
        })?;

        tracing::debug!(path = %path.display(), terms = entries.len(), "term snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use tempfile::TempDir;

    #[test]
    fn same_text_yields_same_id() {
        let dict = TermDictionary::new();
        let first = dict.get_or_create("cat");
        let second = dict.get_or_create("cat");
        assert_eq!(first.id(), second.id());
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn ids_are_dense_and_increasing() {
        let dict = TermDictionary::new();
        for (expected, text) in ["a", "b", "c"].iter().enumerate() {
            assert_eq!(dict.get_or_create(text).id(), expected as u32);
        }
    }

    #[test]
    fn concurrent_creation_assigns_exactly_one_id() {
        let dict = Arc::new(TermDictionary::new());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dict = Arc::clone(&dict);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    dict.get_or_create("shared").id()
                })
            })
            .collect();

        let ids: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.iter().all(|&id| id == ids[0]));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn concurrent_distinct_terms_get_unique_ids() {
        let dict = Arc::new(TermDictionary::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let dict = Arc::clone(&dict);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|i| dict.get_or_create(&format!("t{worker}-{i}")).id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 400);
        assert_eq!(dict.len(), 400);
    }

    #[test]
    fn snapshot_roundtrip_preserves_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("terms.json");

        let dict = TermDictionary::new();
        let cat = dict.get_or_create("cat").id();
        let mat = dict.get_or_create("mat").id();
        dict.save_snapshot(&path).unwrap();

        let reloaded = TermDictionary::load(&path);
        assert_eq!(reloaded.resolve("cat"), Some(cat));
        assert_eq!(reloaded.resolve("mat"), Some(mat));
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn missing_snapshot_is_a_cold_start() {
        let dir = TempDir::new().unwrap();
        let dict = TermDictionary::load(&dir.path().join("terms.json"));
        assert!(dict.is_empty());
    }

    #[test]
    fn corrupt_snapshot_is_a_cold_start() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("terms.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(TermDictionary::load(&path).is_empty());
    }

    #[test]
    fn sparse_snapshot_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("terms.json");
        std::fs::write(&path, br#"{"cat":{"id":5}}"#).unwrap();
        assert!(TermDictionary::load(&path).is_empty());
    }

    #[test]
    fn take_buffer_clears_and_returns_content() {
        let dict = TermDictionary::new();
        let term = dict.get_or_create("cat");
        term.append("a|");
        term.append("b|");
        assert_eq!(term.take_buffer(), "a|b|");
        assert_eq!(term.buffered_bytes(), 0);
    }
}
