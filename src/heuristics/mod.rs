pub mod highlights;
pub mod sentiment;
pub mod topics;

pub use highlights::*;
pub use sentiment::*;
pub use topics::*;

use regex::Regex;
use tracing::warn;

/// A discussion category and the keywords that signal it
#[derive(Debug, Clone, PartialEq)]
pub struct TopicDefinition {
    pub name: String,
    pub keywords: Vec<String>,
}

impl TopicDefinition {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: to_owned_list(keywords),
        }
    }
}

/// Word lists driving every transcript heuristic
///
/// Injected into the pipeline rather than hard-coded so that tests and other locales can
/// substitute their own vocabulary.
#[derive(Debug, Clone)]
pub struct Lexicon {
    /// Keywords that locate the customer's issue
    pub issue_keywords: Vec<String>,
    /// Keywords that locate the resolution
    pub resolution_keywords: Vec<String>,
    /// Words in the resolution text that imply first-call resolution
    pub resolved_markers: Vec<String>,
    /// Words scoring +0.1 per hit
    pub positive_words: Vec<String>,
    /// Words scoring -0.1 per hit
    pub negative_words: Vec<String>,
    /// Boilerplate highlight values treated as missing
    pub placeholders: Vec<String>,
    /// Words excluded from the word cloud
    pub stop_words: Vec<String>,
    /// Topic taxonomy, in tie-break order
    pub topics: Vec<TopicDefinition>,
    /// Topic emitted when nothing in the taxonomy matches
    pub fallback_topic: String,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            issue_keywords: to_owned_list(&[
                "problem", "issue", "complaint", "concern", "wrong", "error", "mistake",
            ]),
            resolution_keywords: to_owned_list(&[
                "resolved", "fixed", "solved", "completed", "done", "agreed", "confirmed",
            ]),
            resolved_markers: to_owned_list(&["resolved", "fixed", "solved"]),
            positive_words: to_owned_list(&[
                "thank", "thanks", "great", "good", "excellent", "happy", "perfect",
                "appreciate", "wonderful", "helpful", "resolved", "glad", "pleased",
                "awesome", "love", "satisfied",
            ]),
            negative_words: to_owned_list(&[
                "problem", "issue", "angry", "frustrated", "bad", "terrible", "wrong",
                "broken", "disappointed", "unhappy", "complaint", "upset", "awful",
                "horrible", "annoyed", "worst",
            ]),
            placeholders: to_owned_list(&[
                "Issue identified in call",
                "Resolution discussed",
                "Call summary",
            ]),
            stop_words: to_owned_list(&[
                "the", "and", "for", "are", "but", "not", "you", "all", "can", "her",
                "was", "one", "our", "out", "day", "get", "has", "him", "his", "how",
                "its", "may", "new", "now", "old", "see", "two", "who", "boy", "did",
                "she", "use", "way", "too", "any", "had", "let", "put", "say", "yes",
                "this", "that", "with", "have", "from", "they", "will", "would",
                "there", "their", "what", "about", "which", "when", "make", "like",
                "time", "just", "know", "take", "into", "your", "some", "could",
                "them", "than", "then", "look", "only", "come", "over", "think",
                "also", "back", "after", "well", "very", "been", "were", "here",
                "okay", "yeah", "want", "need", "dont", "cant", "ill", "thats",
                "going", "agent", "customer",
            ]),
            topics: vec![
                TopicDefinition::new(
                    "Product Quality",
                    &["quality", "defective", "broken", "damaged", "faulty", "product"],
                ),
                TopicDefinition::new(
                    "Delivery Time",
                    &["delivery", "shipping", "shipped", "late", "delayed", "arrive", "tracking"],
                ),
                TopicDefinition::new(
                    "Price",
                    &["price", "cost", "expensive", "cheap", "discount", "deal"],
                ),
                TopicDefinition::new(
                    "Billing",
                    &["bill", "billing", "charge", "charged", "invoice", "payment", "refund"],
                ),
                TopicDefinition::new(
                    "Technical Support",
                    &["technical", "error", "crash", "bug", "install", "reset", "software"],
                ),
                TopicDefinition::new(
                    "Customer Service",
                    &["service", "help", "support", "representative", "manager"],
                ),
                TopicDefinition::new(
                    "Warranty",
                    &["warranty", "guarantee", "replacement", "repair"],
                ),
                TopicDefinition::new(
                    "Account",
                    &["account", "login", "password", "profile", "username"],
                ),
            ],
            fallback_topic: "Customer Service".to_string(),
        }
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Lowercase words with punctuation stripped
pub fn normalize_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Substring by character positions, clamped to the text
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |pos: usize| {
        text.char_indices()
            .nth(pos)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };
    let start_byte = byte_at(start);
    let end_byte = byte_at(end.max(start));
    &text[start_byte..end_byte]
}

/// Case-insensitive whole-word alternation over the keywords
///
/// Returns `None` when no keyword is usable.
pub fn keyword_pattern(keywords: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| regex::escape(k.trim()))
        .collect();
    if alternatives.is_empty() {
        return None;
    }

    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Skipping keywords that do not form a valid pattern: {}", e);
            None
        }
    }
}

/// Truncate to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    slice_chars(text, 0, max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_words() {
        let words = normalize_words("Hello, World! It's   GREAT.");
        assert_eq!(words, vec!["hello", "world", "its", "great"]);
    }

    #[test]
    fn test_slice_chars_is_char_safe() {
        let text = "héllo wörld";
        assert_eq!(slice_chars(text, 0, 5), "héllo");
        assert_eq!(slice_chars(text, 6, 100), "wörld");
        assert_eq!(slice_chars(text, 50, 60), "");
        assert_eq!(truncate_chars(text, 2), "hé");
    }

    #[test]
    fn test_keyword_pattern_whole_words() {
        let re = keyword_pattern(&["done".to_string(), " ".to_string()]).unwrap();
        assert!(re.is_match("All DONE now"));
        assert!(!re.is_match("The order was abandoned in London"));
        assert!(keyword_pattern(&[String::new()]).is_none());
    }

    #[test]
    fn test_default_lexicon_shape() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.topics.len(), 8);
        assert!(lexicon.stop_words.len() >= 80);
        assert!(
            lexicon
                .topics
                .iter()
                .any(|t| t.name == lexicon.fallback_topic)
        );
    }
}
