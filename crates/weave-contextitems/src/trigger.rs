//! Trigger keyword matching: normalizes to lower-case, folds whitespace and
//! punctuation, and pre-compiles each item's keyword list once per turn.

use std::collections::HashSet;

/// Case-insensitive, whole-word token set of `text`. Close enough to
/// Unicode-normalization for this purpose: `to_lowercase()` already folds
/// case across scripts, and splitting on non-alphanumeric boundaries removes
/// punctuation/whitespace noise without pulling in a dedicated
/// Unicode-normalization crate the reference codebase does not otherwise use.
pub fn tokenize_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Whole-word substring match for multi-word keyword phrases (single-word
/// keywords are matched via the token set instead, which is cheaper).
fn phrase_present(haystack_lower: &str, phrase: &str) -> bool {
    let bytes = haystack_lower.as_bytes();
    let mut start = 0usize;
    while let Some(pos) = haystack_lower[start..].find(phrase) {
        let abs = start + pos;
        let before_ok = abs == 0 || !is_word_byte(bytes[abs - 1]);
        let after = abs + phrase.len();
        let after_ok = after >= bytes.len() || !is_word_byte(bytes[after]);
        if before_ok && after_ok {
            return true;
        }
        start = abs + 1;
        if start >= haystack_lower.len() {
            break;
        }
    }
    false
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// Returns the distinct keywords (from `keywords`) that match somewhere in
/// the scan corpus, given its pre-tokenized word set and lower-cased text.
pub fn matched_keywords(
    keywords: &[String],
    corpus_tokens: &HashSet<String>,
    corpus_text_lower: &str,
) -> Vec<String> {
    let mut matched = Vec::new();
    for keyword in keywords {
        let is_match = if keyword.split_whitespace().count() <= 1 {
            corpus_tokens.contains(keyword)
        } else {
            phrase_present(corpus_text_lower, keyword)
        };
        if is_match && !matched.contains(keyword) {
            matched.push(keyword.clone());
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_keyword_matches_via_token_set() {
        let corpus = "What's the weather like today?";
        let tokens = tokenize_words(corpus);
        let matched = matched_keywords(
            &["weather".to_string(), "rain".to_string()],
            &tokens,
            &corpus.to_lowercase(),
        );
        assert_eq!(matched, vec!["weather".to_string()]);
    }

    #[test]
    fn multi_word_keyword_phrase_matches_on_whole_word_boundaries() {
        let corpus = "she felt a deep sense of loss today";
        let tokens = tokenize_words(corpus);
        let matched = matched_keywords(
            &["sense of loss".to_string()],
            &tokens,
            &corpus.to_lowercase(),
        );
        assert_eq!(matched, vec!["sense of loss".to_string()]);
    }

    #[test]
    fn partial_word_does_not_spuriously_match() {
        let corpus = "the rainbow was beautiful";
        let tokens = tokenize_words(corpus);
        let matched = matched_keywords(&["rain".to_string()], &tokens, &corpus.to_lowercase());
        assert!(matched.is_empty());
    }
}
