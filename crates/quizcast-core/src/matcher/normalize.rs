//! Canonical comparison form for chat text.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("Failed to compile non-word regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

/// Produces the canonical comparison form of `text`.
///
/// The text is upper-cased, decomposed so that accents become separate
/// combining marks, stripped of those marks and of anything that is neither
/// a word character nor whitespace, and finally whitespace-collapsed and
/// trimmed. `normalize(normalize(x)) == normalize(x)` holds for every input.
///
/// ```rust
/// use quizcast_core::normalize;
///
/// assert_eq!(normalize("  ¡Café,  con leche! "), "CAFE CON LECHE");
/// assert_eq!(normalize("café"), normalize("CAFE"));
/// ```
pub fn normalize(text: &str) -> String {
    let upper = text.to_uppercase();
    let stripped: String = upper
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    let words_only = NON_WORD.replace_all(&stripped, "");
    WHITESPACE_RUN
        .replace_all(&words_only, " ")
        .trim()
        .to_string()
}
