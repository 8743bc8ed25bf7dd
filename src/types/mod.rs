//! Public types exposed by the `phrasedex` crate.

pub mod options;
pub mod search;
pub mod token;

pub use options::{IndexOptions, IndexOptionsBuilder};
pub use search::SearchResult;
pub use token::Token;
