//! One recorded occurrence of a term in a document.

use serde::{Deserialize, Serialize};

/// A single token produced by the tokenizer, and the unit stored in a
/// term's postings blob (one wire record per occurrence).
///
/// `position` is a 1-based counter of produced tokens: separators and
/// combining marks do not consume a position. `start_index` is the
/// character offset at which the token was recognized as complete — the
/// offset of the terminating character, not of the token's first
/// character. Snippet window arithmetic depends on that convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Source document identity; the file path as given to the indexer.
    /// Re-indexing the same path accumulates postings rather than
    /// replacing them.
    pub document_key: String,
    /// Normalized (lowercased) token text.
    pub text: String,
    pub position: u32,
    pub start_index: u32,
}
