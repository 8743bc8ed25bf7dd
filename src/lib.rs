#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal/self-documenting functions don't need
// extensive docs. Public APIs should still carry proper documentation.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Casts between offset/length types are bounded by real-world corpus sizes.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
//
// Index maintenance naturally produces long orchestration functions.
#![allow(clippy::too_many_lines)]
#![allow(clippy::similar_names)]

/// The phrasedex crate version (matches `Cargo.toml`).
pub const PHRASEDEX_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constants;
pub mod dictionary;
pub mod error;
pub mod indexer;
pub mod monitor;
pub mod search;
pub mod store;
pub mod tokenizer;
pub mod types;

pub use constants::*;
pub use dictionary::{Term, TermDictionary};
pub use error::{PhrasedexError, Result};
pub use indexer::{IndexStats, Indexer};
pub use monitor::MemoryMonitor;
pub use search::snippet::create_snippet;
pub use search::IndexSearcher;
pub use store::PostingsStore;
pub use tokenizer::tokenize;
pub use types::{IndexOptions, IndexOptionsBuilder, SearchResult, Token};
