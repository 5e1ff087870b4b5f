/// Case-insensitive term matching shared by the rule classifier and the
/// scoring criteria. Callers lowercase the text once; terms are expected
/// lowercase already.

/// Check whether `term` occurs in `text`. Single-token terms must match on
/// word boundaries ("ai" must not hit "maintain"); multi-word terms match as
/// substrings.
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    if term.chars().any(|c| !c.is_ascii_alphanumeric()) {
        return text.contains(term);
    }
    contains_word(text, term)
}

/// Count how many of `terms` occur in `text`.
pub fn count_terms(text: &str, terms: &[String]) -> usize {
    terms.iter().filter(|term| contains_term(text, term)).count()
}

/// True if any of `terms` occurs in `text`.
pub fn contains_any(text: &str, terms: &[String]) -> bool {
    terms.iter().any(|term| contains_term(text, term))
}

/// Truncate to at most `max_chars` characters without splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn contains_word(text: &str, word: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = text[start..].find(word) {
        let begin = start + pos;
        let end = begin + word.len();
        let boundary_before =
            begin == 0 || !text.as_bytes()[begin - 1].is_ascii_alphanumeric();
        let boundary_after =
            end == text.len() || !text.as_bytes()[end].is_ascii_alphanumeric();
        if boundary_before && boundary_after {
            return true;
        }
        start = end;
    }
    false
}
