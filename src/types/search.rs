//! Public search result types.

use serde::{Deserialize, Serialize};

/// One matched proximity sequence: the document it occurred in and a
/// highlighted snippet of the surrounding text.
///
/// Greedy matching may produce several results for the same document;
/// they are reported individually, not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_key: String,
    pub snippet: String,
}
