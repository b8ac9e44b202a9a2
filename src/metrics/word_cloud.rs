use std::collections::HashMap;

use crate::heuristics::{Lexicon, normalize_words};
use crate::models::WordCloudEntry;

/// Default number of word cloud entries
pub const WORD_CLOUD_SIZE: usize = 30;

/// Words shorter than this are never interesting enough for the cloud
const MIN_WORD_CHARS: usize = 3;

/// Most frequent non-trivial words in the text
///
/// Entries are ordered by count, ties alphabetically, and weighted relative to the most
/// frequent word.
pub fn build_word_cloud(text: &str, lexicon: &Lexicon, limit: usize) -> Vec<WordCloudEntry> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for word in normalize_words(text) {
        if word.chars().count() < MIN_WORD_CHARS {
            continue;
        }
        if lexicon.stop_words.iter().any(|s| *s == word) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);

    let max_count = ranked.first().map(|(_, c)| *c).unwrap_or(1) as f64;
    ranked
        .into_iter()
        .map(|(word, count)| WordCloudEntry {
            word,
            count,
            weight: count as f64 / max_count,
        })
        .collect()
}
