//! Error taxonomy for index maintenance and search.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PhrasedexError>;

#[derive(Debug, Error)]
pub enum PhrasedexError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("posting record codec failure: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("postings store failure for term {term_id}: {reason}")]
    Store { term_id: u32, reason: String },

    #[error("corrupt postings blob for term {term_id} at byte {offset}: {reason}")]
    CorruptPostings {
        term_id: u32,
        offset: u64,
        reason: String,
    },

    #[error("dictionary snapshot failure: {reason}")]
    Snapshot { reason: String },

    #[error("worker pool failure: {reason}")]
    WorkerPool { reason: String },
}
