//! Snippet extraction and highlight markup.

use regex::RegexBuilder;

use crate::types::Token;

/// Extract a whole-word window of `text` around `matched` tokens and wrap
/// every case-insensitive occurrence of any matched term in angle
/// brackets.
///
/// Offsets are character offsets, matching the tokenizer: the window is
/// anchored on `start_index` values, widened by `window / 2` on each
/// side, clamped to the text, then pushed outward to the nearest
/// whitespace so the snippet never begins or ends mid-word. Every
/// occurrence of a matched term inside the window is highlighted, not
/// only the matched positions.
#[must_use]
pub fn create_snippet(text: &str, matched: &[Token], window: usize) -> String {
    let mut tokens: Vec<&Token> = matched.iter().collect();
    tokens.sort_by_key(|t| t.start_index);
    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return String::new();
    };

    let chars: Vec<char> = text.chars().collect();
    let mut start = (first.start_index as usize)
        .saturating_sub(window / 2)
        .min(chars.len());
    let mut end = ((last.start_index as usize) + last.text.chars().count() + window / 2)
        .min(chars.len());

    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    while end < chars.len() && !chars[end].is_whitespace() {
        end += 1;
    }

    let snippet: String = chars[start..end].iter().collect();
    highlight(&snippet, &tokens)
}

fn highlight(snippet: &str, tokens: &[&Token]) -> String {
    let mut literals: Vec<String> = Vec::new();
    for token in tokens {
        let escaped = regex::escape(&token.text);
        if !literals.contains(&escaped) {
            literals.push(escaped);
        }
    }

    let pattern = literals.join("|");
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.replace_all(snippet, "<$0>").into_owned(),
        Err(err) => {
            tracing::warn!(error = %err, "highlight pattern rejected, returning plain snippet");
            snippet.to_string()
        }
    }
}
