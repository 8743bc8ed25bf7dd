//! Text-to-token scanning.
//!
//! Pure single pass over the normalized input; restartable, no state.
//! Offsets are character offsets into the normalized text, and a token's
//! `start_index` is the offset of the character that terminated it.

use unicode_normalization::char::is_combining_mark;

use crate::types::Token;

/// Split `text` into an ordered token stream attributed to `document_key`.
///
/// Normalization first replaces every doubled single-quote pair with one
/// double-quote character, then lowercases. During the scan:
///
/// * letters and digits extend the current word;
/// * an apostrophe inside a word is kept (contraction marks);
/// * a double quote inside a word is held pending and only materialized
///   if a letter or digit follows, otherwise dropped as a terminator;
/// * non-spacing combining marks are skipped entirely — they neither
///   terminate the word nor appear in it, and consume no position;
/// * any other character terminates the word.
///
/// A word still pending at end of input is emitted with the current
/// position counter, which is not advanced afterwards.
#[must_use]
pub fn tokenize(text: &str, document_key: &str) -> Vec<Token> {
    let normalized = text.replace("''", "\"").to_lowercase();

    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut pending_quote = false;
    let mut position: u32 = 1;
    let mut current_index: u32 = 0;

    for c in normalized.chars() {
        if c.is_alphanumeric() {
            if pending_quote {
                word.push('"');
                pending_quote = false;
            }
            word.push(c);
            in_word = true;
        } else if in_word && c == '\'' {
            word.push(c);
        } else if in_word && c == '"' {
            pending_quote = true;
        } else if !is_combining_mark(c) {
            if !word.is_empty() {
                tokens.push(Token {
                    document_key: document_key.to_string(),
                    text: std::mem::take(&mut word),
                    position,
                    start_index: current_index,
                });
                position += 1;
            }
            pending_quote = false;
            in_word = false;
        }

        current_index += 1;
    }

    if !word.is_empty() {
        tokens.push(Token {
            document_key: document_key.to_string(),
            text: word,
            position,
            start_index: current_index,
        });
    }

    tokens
}
