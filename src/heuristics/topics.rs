use crate::models::TopicMention;

use super::{Lexicon, keyword_pattern};

/// Recompute percentages for a backend topic list
///
/// Backend percentages are never trusted: shares are derived from mention counts. Entries
/// without a name are dropped and zero counts are raised to one, since a listed topic was
/// mentioned at least once. Returns `None` when nothing usable remains.
pub fn normalize_topics(topics: &[TopicMention]) -> Option<Vec<TopicMention>> {
    let cleaned: Vec<(String, u32)> = topics
        .iter()
        .filter(|t| !t.name.trim().is_empty())
        .map(|t| (t.name.trim().to_string(), t.mentions.max(1)))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Some(with_percentages(cleaned))
}

/// Count whole-word taxonomy keyword hits in the transcript
///
/// Topics are ordered by mention count, then by taxonomy order. Topics without a hit
/// are omitted, so the result may be empty.
pub fn match_topics(transcript: &str, lexicon: &Lexicon) -> Vec<TopicMention> {
    let mut counts: Vec<(usize, String, u32)> = Vec::new();

    for (order, topic) in lexicon.topics.iter().enumerate() {
        let Some(pattern) = keyword_pattern(&topic.keywords) else {
            continue;
        };
        let hits = pattern.find_iter(transcript).count() as u32;
        if hits > 0 {
            counts.push((order, topic.name.clone(), hits));
        }
    }

    counts.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
    if counts.is_empty() {
        return Vec::new();
    }

    with_percentages(
        counts
            .into_iter()
            .map(|(_, name, hits)| (name, hits))
            .collect(),
    )
}

/// The single synthetic topic used when nothing else is available
pub fn fallback_topics(lexicon: &Lexicon) -> Vec<TopicMention> {
    vec![TopicMention::new(lexicon.fallback_topic.clone(), 1, 100.0)]
}

fn with_percentages(counts: Vec<(String, u32)>) -> Vec<TopicMention> {
    // Summed as f64: backend counts can be anywhere up to u32::MAX
    let total: f64 = counts.iter().map(|(_, c)| f64::from(*c)).sum();
    counts
        .into_iter()
        .map(|(name, mentions)| {
            let percentage = f64::from(mentions) / total * 100.0;
            TopicMention::new(name, mentions, percentage)
        })
        .collect()
}
