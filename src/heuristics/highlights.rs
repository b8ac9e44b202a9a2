use super::{Lexicon, collapse_whitespace, keyword_pattern, slice_chars, truncate_chars};

/// Characters kept before a keyword match
const WINDOW_BEFORE: usize = 50;
/// Characters kept after the start of a keyword match
const WINDOW_AFTER: usize = 100;
/// Length of head, tail and midpoint windows
const EXCERPT_CHARS: usize = 150;
/// Maximum summary length
const SUMMARY_MAX_CHARS: usize = 300;

/// Whether a highlight value carries no information
///
/// Empty strings and the boilerplate the backend emits when it has nothing to say both
/// count as missing.
pub fn is_placeholder(value: &str, lexicon: &Lexicon) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || lexicon
            .placeholders
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(trimmed))
}

/// Excerpt around the first issue keyword, else the opening of the transcript
pub fn extract_issue(transcript: &str, lexicon: &Lexicon) -> Option<String> {
    let text = collapse_whitespace(transcript);
    if text.is_empty() {
        return None;
    }

    let excerpt = match find_first_keyword(&text, &lexicon.issue_keywords) {
        Some(pos) => keyword_window(&text, pos),
        None => truncate_chars(&text, EXCERPT_CHARS).to_string(),
    };
    non_empty(excerpt)
}

/// Excerpt around the first resolution keyword, else around the transcript midpoint
pub fn extract_resolution(transcript: &str, lexicon: &Lexicon) -> Option<String> {
    let text = collapse_whitespace(transcript);
    if text.is_empty() {
        return None;
    }

    let excerpt = match find_first_keyword(&text, &lexicon.resolution_keywords) {
        Some(pos) => keyword_window(&text, pos),
        None => {
            let mid = text.chars().count() / 2;
            let half = EXCERPT_CHARS / 2;
            slice_chars(&text, mid.saturating_sub(half), mid + half)
                .trim()
                .to_string()
        }
    };
    non_empty(excerpt)
}

/// First two sentences plus the last one, or head and tail excerpts for short transcripts
pub fn extract_summary(transcript: &str) -> Option<String> {
    let text = collapse_whitespace(transcript);
    if text.is_empty() {
        return None;
    }

    let sentences = split_sentences(&text);
    let summary = if sentences.len() > 3 {
        let joined = format!(
            "{} {} {}",
            sentences[0],
            sentences[1],
            sentences[sentences.len() - 1]
        );
        truncate_chars(&joined, SUMMARY_MAX_CHARS).trim().to_string()
    } else {
        let len = text.chars().count();
        if len <= EXCERPT_CHARS * 2 {
            text.clone()
        } else {
            let head = slice_chars(&text, 0, EXCERPT_CHARS).trim();
            let tail = slice_chars(&text, len - EXCERPT_CHARS, len).trim();
            format!("{} ... {}", head, tail)
        }
    };
    non_empty(summary)
}

/// Whether the resolution text reports the issue as settled
///
/// Markers match whole words only, so "unresolved" does not count.
pub fn implies_resolution(resolution: &str, lexicon: &Lexicon) -> bool {
    keyword_pattern(&lexicon.resolved_markers).is_some_and(|re| re.is_match(resolution))
}

/// Character position of the earliest whole-word keyword occurrence
fn find_first_keyword(text: &str, keywords: &[String]) -> Option<usize> {
    let found = keyword_pattern(keywords)?.find(text)?;
    Some(text[..found.start()].chars().count())
}

fn keyword_window(text: &str, char_pos: usize) -> String {
    slice_chars(
        text,
        char_pos.saturating_sub(WINDOW_BEFORE),
        char_pos + WINDOW_AFTER,
    )
    .trim()
    .to_string()
}

/// Split on sentence-ending punctuation followed by whitespace or end of text
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
            if at_boundary {
                let sentence = current.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                current.clear();
            }
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        let lexicon = Lexicon::default();
        assert!(is_placeholder("", &lexicon));
        assert!(is_placeholder("   ", &lexicon));
        assert!(is_placeholder("Call summary", &lexicon));
        assert!(is_placeholder(" call SUMMARY ", &lexicon));
        assert!(is_placeholder("Issue identified in call", &lexicon));
        assert!(!is_placeholder("Customer was double charged", &lexicon));
    }

    #[test]
    fn test_issue_window_around_keyword() {
        let lexicon = Lexicon::default();
        let transcript = "Hello and welcome. I have a problem with my order.";
        let issue = extract_issue(transcript, &lexicon).unwrap();
        assert!(issue.contains("problem"));
        assert!(issue.starts_with("Hello"));
    }

    #[test]
    fn test_issue_picks_earliest_keyword() {
        let lexicon = Lexicon::default();
        let filler = "x".repeat(200);
        let transcript = format!("There was an error at checkout. {} Another problem.", filler);
        let issue = extract_issue(&transcript, &lexicon).unwrap();
        assert!(issue.contains("error"));
        assert!(!issue.contains("problem"));
    }

    #[test]
    fn test_issue_without_keyword_uses_opening() {
        let lexicon = Lexicon::default();
        let transcript = "a".repeat(400);
        let issue = extract_issue(&transcript, &lexicon).unwrap();
        assert_eq!(issue.chars().count(), 150);
    }

    #[test]
    fn test_resolution_without_keyword_uses_midpoint() {
        let lexicon = Lexicon::default();
        let transcript = format!("{}MIDDLE{}", "a".repeat(300), "b".repeat(300));
        let resolution = extract_resolution(&transcript, &lexicon).unwrap();
        assert!(resolution.contains("MIDDLE"));
        assert_eq!(resolution.chars().count(), 150);
    }

    #[test]
    fn test_resolution_keyword() {
        let lexicon = Lexicon::default();
        let transcript = "Let me check. Okay, the refund is confirmed for tomorrow.";
        let resolution = extract_resolution(transcript, &lexicon).unwrap();
        assert!(resolution.contains("confirmed"));
    }

    #[test]
    fn test_summary_long_transcript() {
        let transcript = "First sentence. Second sentence! Third one? Fourth here. Final words.";
        let summary = extract_summary(transcript).unwrap();
        assert_eq!(summary, "First sentence. Second sentence! Final words.");
    }

    #[test]
    fn test_summary_is_truncated() {
        let long = "word ".repeat(100);
        let transcript = format!("{}. {}. {}. {}.", long, long, long, long);
        let summary = extract_summary(&transcript).unwrap();
        assert!(summary.chars().count() <= 300);
    }

    #[test]
    fn test_summary_short_transcript_uses_head_and_tail() {
        let transcript = format!("{} {}", "a".repeat(200), "b".repeat(200));
        let summary = extract_summary(&transcript).unwrap();
        assert!(summary.starts_with("aaa"));
        assert!(summary.ends_with("bbb"));
        assert!(summary.contains(" ... "));
    }

    #[test]
    fn test_empty_transcript_yields_nothing() {
        let lexicon = Lexicon::default();
        assert!(extract_issue("", &lexicon).is_none());
        assert!(extract_resolution("  \n ", &lexicon).is_none());
        assert!(extract_summary("").is_none());
    }

    #[test]
    fn test_split_sentences_ignores_decimals() {
        let sentences = split_sentences("It costs 9.99 today. Thanks!");
        assert_eq!(sentences, vec!["It costs 9.99 today.", "Thanks!"]);
    }

    #[test]
    fn test_implies_resolution() {
        let lexicon = Lexicon::default();
        assert!(implies_resolution("The billing issue was Resolved.", &lexicon));
        assert!(!implies_resolution("Customer will call back.", &lexicon));
        assert!(!implies_resolution("The ticket is still unresolved.", &lexicon));
    }

    #[test]
    fn test_keywords_inside_words_are_ignored() {
        let lexicon = Lexicon::default();
        let transcript = "The parcel was abandoned in London. Later we agreed on a new date.";
        // "done" hides inside "abandoned"; "agreed" is the first real hit
        assert_eq!(
            find_first_keyword(transcript, &lexicon.resolution_keywords),
            Some(45)
        );
    }
}
