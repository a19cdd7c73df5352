// src/language.rs
//! Deterministic title language classification (Spanish vs English).
//!
//! Signals: Spanish-only letters and punctuation, plus stop-word hits on each
//! side. A tie (including no signal at all) is inconclusive and returns `None`;
//! callers then fall back to an advisory hint or the configured default.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::model::Language;

/// Weight of one Spanish-specific character versus one stop-word hit.
const MARKER_WEIGHT: u32 = 2;

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}+").expect("word regex"));

static ES_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "el", "la", "los", "las", "del", "que", "y", "por", "para", "con", "una", "un", "es",
        "se", "como", "pero", "su", "sus", "lo", "al", "más", "mas", "este", "esta", "sobre",
        "qué", "cómo", "porque", "ya", "hoy", "entre", "sin", "muy", "hay", "son", "ante",
        "todo", "nueva", "nuevo", "mundo", "guerra", "ahora", "desde", "hasta", "contra",
    ]
    .into_iter()
    .collect()
});

static EN_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "of", "to", "is", "for", "with", "on", "what", "how", "why", "this",
        "that", "are", "from", "it", "you", "your", "will", "be", "about", "after", "new",
        "world", "war", "now", "just", "who", "we", "our", "they", "their", "has", "have",
    ]
    .into_iter()
    .collect()
});

/// Spanish and English scores for a title.
pub fn score_title(title: &str) -> (u32, u32) {
    let lower = title.to_lowercase();

    let markers = lower
        .chars()
        .filter(|c| matches!(c, 'á' | 'é' | 'í' | 'ó' | 'ú' | 'ñ' | 'ü' | '¿' | '¡'))
        .count() as u32;

    let mut es = markers * MARKER_WEIGHT;
    let mut en = 0u32;
    for w in RE_WORD.find_iter(&lower) {
        let w = w.as_str();
        if ES_WORDS.contains(w) {
            es += 1;
        }
        if EN_WORDS.contains(w) {
            en += 1;
        }
    }
    (es, en)
}

/// `Some(lang)` when one side clearly wins, `None` on a tie.
pub fn classify_title(title: &str) -> Option<Language> {
    let (es, en) = score_title(title);
    match es.cmp(&en) {
        std::cmp::Ordering::Greater => Some(Language::Es),
        std::cmp::Ordering::Less => Some(Language::En),
        std::cmp::Ordering::Equal => None,
    }
}

/// Title signal first, then the advisory hint, then the default.
pub fn resolve_language(title: &str, hint: Option<Language>, default: Language) -> Language {
    classify_title(title).or(hint).unwrap_or(default)
}
