//! Greedy consecutive-term proximity matching.

use crate::types::Token;

/// Find every valid consecutive sequence across `term_lists`, one list
/// per query term in query order, within `max_slop` positions between
/// neighbours.
///
/// Each occurrence of the first term anchors a greedy walk: for every
/// following term the earliest occurrence at or after the previous
/// matched position, and no more than `max_slop` past it, is taken. A
/// dead end abandons the anchor. Greedy-first-fit, not minimal-span:
/// different anchors may produce overlapping sequences, and none are
/// deduplicated.
pub(crate) fn consecutive_sequences(
    mut term_lists: Vec<Vec<Token>>,
    max_slop: u32,
) -> Vec<Vec<Token>> {
    for list in &mut term_lists {
        list.sort_by_key(|t| t.position);
    }

    let Some((first, rest)) = term_lists.split_first() else {
        return Vec::new();
    };

    let mut sequences = Vec::new();
    for anchor in first {
        let mut last_position = anchor.position;
        let mut current = vec![anchor.clone()];

        for list in rest {
            let next = list
                .iter()
                .find(|t| t.position >= last_position && t.position - last_position <= max_slop);
            match next {
                Some(token) => {
                    last_position = token.position;
                    current.push(token.clone());
                }
                None => break,
            }
        }

        if current.len() == term_lists.len() {
            sequences.push(current);
        }
    }

    tracing::debug!(sequences = sequences.len(), "proximity pass complete");
    sequences
}
