//! Integration tests for startup and recovery behavior.
//! Tests: missing/corrupt snapshot cold starts, snapshot/store drift.

use phrasedex::{IndexOptions, Indexer, TERMS_SNAPSHOT_FILE};
use tempfile::TempDir;

#[test]
fn open_on_an_empty_directory_succeeds() {
    let index = TempDir::new().unwrap();
    let indexer = Indexer::open(index.path(), IndexOptions::default()).unwrap();
    assert_eq!(indexer.stats().term_count, 0);
}

#[test]
fn corrupt_snapshot_opens_empty_and_stays_usable() {
    let docs = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    std::fs::write(index.path().join(TERMS_SNAPSHOT_FILE), b"}}}garbage{{").unwrap();

    let indexer = Indexer::open(index.path(), IndexOptions::default()).unwrap();
    assert_eq!(indexer.stats().term_count, 0);

    let doc = docs.path().join("doc.txt");
    std::fs::write(&doc, "fresh start").unwrap();
    indexer.index_documents(&[doc]).unwrap();

    assert_eq!(
        indexer.searcher().search("fresh start", 1).unwrap().len(),
        1
    );
}

#[test]
fn deleted_snapshot_makes_terms_unknown_but_open_succeeds() {
    let docs = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    let doc = docs.path().join("doc.txt");
    std::fs::write(&doc, "cat sat").unwrap();

    {
        let indexer = Indexer::open(index.path(), IndexOptions::default()).unwrap();
        indexer.index_documents(&[doc]).unwrap();
    }

    // Simulate a crash that lost the snapshot but kept the store: the
    // index opens cold and simply knows no terms until re-indexed.
    std::fs::remove_file(index.path().join(TERMS_SNAPSHOT_FILE)).unwrap();

    let reopened = Indexer::open(index.path(), IndexOptions::default()).unwrap();
    assert_eq!(reopened.stats().term_count, 0);
    assert!(reopened.searcher().search("cat sat", 1).unwrap().is_empty());
}

#[test]
fn snapshot_is_written_after_every_flush() {
    let docs = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    let doc = docs.path().join("doc.txt");
    std::fs::write(&doc, "cat sat").unwrap();

    let indexer = Indexer::open(index.path(), IndexOptions::default()).unwrap();
    indexer.index_documents(&[doc]).unwrap();

    let raw = std::fs::read_to_string(index.path().join(TERMS_SNAPSHOT_FILE)).unwrap();
    assert!(raw.contains("\"cat\""));
    assert!(raw.contains("\"sat\""));
    assert!(raw.contains("\"id\""));
}

#[test]
fn drop_persists_buffered_state() {
    let docs = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    let doc = docs.path().join("doc.txt");
    std::fs::write(&doc, "ember glow").unwrap();

    {
        let indexer = Indexer::open(index.path(), IndexOptions::default()).unwrap();
        // Buffer postings without an explicit flush; Drop must persist.
        let term = indexer.dictionary().get_or_create("ember");
        term.append(
            "{\"documentKey\":\"doc\",\"text\":\"ember\",\"position\":1,\"startIndex\":5}|",
        );
    }

    let reopened = Indexer::open(index.path(), IndexOptions::default()).unwrap();
    let id = reopened.dictionary().resolve("ember").expect("persisted");
    assert!(reopened.store().get_entry(id).unwrap().is_some());
}
