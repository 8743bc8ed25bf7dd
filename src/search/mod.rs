//! Query execution over a built index.
//!
//! Strict AND-of-terms semantics: every query term must be known to the
//! dictionary and present in a document for it to match. Unknown terms
//! and empty queries yield an empty result set, never an error.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::constants::POSTING_SEPARATOR;
use crate::dictionary::TermDictionary;
use crate::error::Result;
use crate::store::PostingsStore;
use crate::types::{SearchResult, Token};

mod proximity;
pub mod snippet;

use proximity::consecutive_sequences;
use snippet::create_snippet;

/// Read-side handle over an index's dictionary and postings store.
///
/// Obtained from [`Indexer::searcher`](crate::Indexer::searcher); it
/// shares the live dictionary, so terms flushed after creation are
/// immediately visible.
#[derive(Debug)]
pub struct IndexSearcher {
    dictionary: Arc<TermDictionary>,
    store: Arc<PostingsStore>,
    snippet_window_chars: usize,
}

impl IndexSearcher {
    #[must_use]
    pub fn new(
        dictionary: Arc<TermDictionary>,
        store: Arc<PostingsStore>,
        snippet_window_chars: usize,
    ) -> Self {
        Self {
            dictionary,
            store,
            snippet_window_chars,
        }
    }

    /// Find every proximity match for `query`, allowing up to `max_slop`
    /// positions between consecutive query terms.
    ///
    /// Query terms are whitespace-separated and looked up verbatim.
    /// Results carry one highlighted snippet per matched sequence;
    /// overlapping sequences from different anchors are all reported.
    pub fn search(&self, query: &str, max_slop: u32) -> Result<Vec<SearchResult>> {
        let start_time = Instant::now();
        let terms: Vec<&str> = query.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        // Resolve every term up front; one unknown term empties the result.
        let mut resolved: Vec<(String, u32)> = Vec::new();
        let mut seen = HashSet::new();
        for term in &terms {
            let Some(id) = self.dictionary.resolve(term) else {
                tracing::debug!(term, "unknown query term, no results");
                return Ok(Vec::new());
            };
            if seen.insert(*term) {
                resolved.push(((*term).to_string(), id));
            }
        }
        // A repeated query term can never satisfy the distinct-terms
        // requirement checked per document below.
        if resolved.len() < terms.len() {
            return Ok(Vec::new());
        }

        let mut by_document: BTreeMap<String, Vec<Token>> = BTreeMap::new();
        for (_, id) in &resolved {
            for token in self.load_postings(*id)? {
                by_document
                    .entry(token.document_key.clone())
                    .or_default()
                    .push(token);
            }
        }

        let mut results = Vec::new();
        for (document_key, tokens) in by_document {
            let mut by_term: HashMap<String, Vec<Token>> = HashMap::new();
            for token in tokens {
                by_term.entry(token.text.clone()).or_default().push(token);
            }
            if by_term.len() < terms.len() {
                continue;
            }

            // One occurrence list per query term, in query order.
            let Some(term_lists) = resolved
                .iter()
                .map(|(text, _)| by_term.remove(text))
                .collect::<Option<Vec<_>>>()
            else {
                continue;
            };

            let sequences = consecutive_sequences(term_lists, max_slop);
            if sequences.is_empty() {
                continue;
            }

            let text = match fs_err::read_to_string(&document_key) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(
                        document = %document_key,
                        error = %err,
                        "matched document unreadable, skipped"
                    );
                    continue;
                }
            };
            for sequence in sequences {
                results.push(SearchResult {
                    document_key: document_key.clone(),
                    snippet: create_snippet(&text, &sequence, self.snippet_window_chars),
                });
            }
        }

        tracing::debug!(
            query,
            max_slop,
            results = results.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "search complete"
        );
        Ok(results)
    }

    /// Load and parse the full postings list for one term. Blank
    /// fragments between separators are ignored; a record that fails to
    /// parse is logged and skipped.
    fn load_postings(&self, term_id: u32) -> Result<Vec<Token>> {
        let Some(blob) = self.store.get_entry(term_id)? else {
            return Ok(Vec::new());
        };

        let mut postings = Vec::new();
        for record in blob.split(POSTING_SEPARATOR) {
            if record.is_empty() {
                continue;
            }
            match serde_json::from_str::<Token>(record) {
                Ok(token) => postings.push(token),
                Err(err) => {
                    tracing::warn!(term_id, error = %err, "malformed posting record skipped");
                }
            }
        }
        Ok(postings)
    }
}
