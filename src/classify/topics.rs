// src/classify/topics.rs
// Keyword ranking by plain term frequency.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

// Tokens shorter than this (in characters) are never topics.
// Two-letter words survive ("go", "ai"); the common two-letter function
// words are in the stopword list instead.
const MIN_TOKEN_CHARS: usize = 2;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "of", "to", "in", "a", "for", "is", "on", "with", "as", "by", "at", "from",
        "that", "this", "it", "an", "be", "or", "are", "was", "will", "has", "have", "had", "but",
        "not", "your", "you", "we", "our",
    ]
    .into_iter()
    .collect()
});

// Returns up to `n` of the most frequent words in `text`.
//
// Ties are broken by ascending token, so the output is fully determined by
// the input. n == 0 gives an empty list.
pub fn top_topics(text: &str, n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for token in lowered.split(|c: char| !c.is_alphanumeric()) {
        if token.chars().count() < MIN_TOKEN_CHARS || STOPWORDS.contains(token) {
            continue;
        }
        *counts.entry(token).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(n)
        .map(|(token, _)| token.to_string())
        .collect()
}
