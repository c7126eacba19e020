//! Text canonicalization for equality comparisons

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("static pattern compiles"));

/// Canonicalize free text for duplicate-equivalence comparisons.
///
/// Decomposes (NFKD) and drops combining marks, lowercases, turns every
/// character that is neither a word character nor whitespace into a
/// separator, then collapses whitespace runs and trims.
pub fn normalize(text: &str) -> String {
    let lowered = strip_diacritics(text).to_lowercase();
    let words = NON_WORD.replace_all(&lowered, " ");
    words.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keyword-style folding used for fuzzy title lookups: the whole text as one
/// token, lowercased, diacritics dropped, everything but letters and digits
/// removed.
pub fn fold_compact(text: &str) -> String {
    strip_diacritics(text)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn strip_diacritics(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}
