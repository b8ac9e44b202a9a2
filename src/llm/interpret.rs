use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{Sentiment, TopicMention, TrendPoint};

/// How the backend reply was decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// A JSON object decoded structurally
    Structured,
    /// `label: value` patterns recovered from prose
    TextAnchors,
    /// Nothing usable in the reply
    Unusable,
}

/// Typed values recovered from a backend reply
///
/// Every field is optional: a malformed or missing value in one field never affects the
/// others. Range checks are left to the resolver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendFields {
    pub overall: Option<Sentiment>,
    pub score: Option<f64>,
    pub issue: Option<String>,
    pub resolution: Option<String>,
    pub summary: Option<String>,
    pub rating: Option<f64>,
    pub professionalism: Option<String>,
    pub efficiency: Option<String>,
    pub sentiment_trend: Option<Vec<TrendPoint>>,
    pub topics: Option<Vec<TopicMention>>,
    pub greeting: Option<f64>,
    pub problem_solving: Option<f64>,
    pub closing: Option<f64>,
    pub detected_language: Option<String>,
    pub agent_sentiment: Option<String>,
    pub first_call_resolution: Option<bool>,
}

impl BackendFields {
    pub fn is_empty(&self) -> bool {
        *self == BackendFields::default()
    }
}

/// Result of interpreting one backend reply
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub source: PayloadSource,
    pub fields: BackendFields,
}

impl Interpretation {
    /// Neither a structural decode nor text anchors produced anything
    pub fn is_total_failure(&self) -> bool {
        self.source == PayloadSource::Unusable
    }
}

static FENCED_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```[A-Za-z0-9_+\-]*[^\S\n]*\n?([\s\S]*?)```").expect("Invalid regex")
});

static SENTIMENT_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(agent[\s_]+)?sentiment(?:[\s_]+score)?\s*[:=]\s*["']?(positive|neutral|negative)\b"#,
    )
    .expect("Invalid regex")
});

/// `score: 0.7`, `sentiment score: 0.7` or `agent score: 8`
static SCORE_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(agent[\s_]+)?(sentiment[\s_]+)?score\s*[:=]\s*["']?(-?\d+(?:\.\d+)?)"#,
    )
    .expect("Invalid regex")
});
static RATING_ANCHOR: Lazy<Regex> = Lazy::new(|| number_anchor("rating"));
static GREETING_ANCHOR: Lazy<Regex> = Lazy::new(|| number_anchor("greeting"));
static PROBLEM_SOLVING_ANCHOR: Lazy<Regex> =
    Lazy::new(|| number_anchor(r"problem[\s_\-]*solving"));
static CLOSING_ANCHOR: Lazy<Regex> = Lazy::new(|| number_anchor("closing"));

static FCR_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bfirst[\s_\-]*call[\s_\-]*resolution\s*[:=]\s*["']?(yes|no|true|false)\b"#,
    )
    .expect("Invalid regex")
});

static ISSUE_ANCHOR: Lazy<Regex> = Lazy::new(|| line_anchor("issue"));
static RESOLUTION_ANCHOR: Lazy<Regex> = Lazy::new(|| line_anchor("resolution"));
static SUMMARY_ANCHOR: Lazy<Regex> = Lazy::new(|| line_anchor("summary"));
static PROFESSIONALISM_ANCHOR: Lazy<Regex> = Lazy::new(|| line_anchor("professionalism"));
static EFFICIENCY_ANCHOR: Lazy<Regex> = Lazy::new(|| line_anchor("efficiency"));
static LANGUAGE_ANCHOR: Lazy<Regex> =
    Lazy::new(|| line_anchor(r"(?:detected[\s_]+)?language"));
static TOPICS_ANCHOR: Lazy<Regex> = Lazy::new(|| line_anchor("topics"));

/// `label: 8.5` anywhere in the text
fn number_anchor(label: &str) -> Regex {
    Regex::new(&format!(
        r#"(?i)\b{}\s*[:=]\s*["']?(-?\d+(?:\.\d+)?)"#,
        label
    ))
    .expect("Invalid regex")
}

/// `label: free text` at the start of a line, tolerating list and emphasis markup
fn line_anchor(label: &str) -> Regex {
    Regex::new(&format!(
        r"(?im)^[\s*#>\-]*\**{}\**\s*[:=]\s*(.+?)\s*$",
        label
    ))
    .expect("Invalid regex")
}

/// Pick the part of a reply that should hold the JSON payload
///
/// The content of the first fenced block wins, with or without a language tag; otherwise
/// the whole reply is the candidate.
pub fn extract_candidate(text: &str) -> &str {
    match FENCED_BLOCK_RE.captures(text).and_then(|caps| caps.get(1)) {
        Some(block) => block.as_str().trim(),
        None => text.trim(),
    }
}

/// Interpret a freeform backend reply
///
/// Never fails: an undecodable reply falls through to text-anchor extraction, and a
/// reply with no anchors either is reported as [`PayloadSource::Unusable`].
pub fn interpret_response(text: &str) -> Interpretation {
    let candidate = extract_candidate(text);

    let object = decode_object(candidate)
        .or_else(|| find_embedded_object(text).and_then(|s| decode_object(&s)));
    if let Some(object) = object {
        debug!("Backend reply decoded as JSON object with {} keys", object.len());
        return Interpretation {
            source: PayloadSource::Structured,
            fields: fields_from_object(&object),
        };
    }

    if text.trim().is_empty() {
        debug!("Backend reply is empty");
    } else {
        warn!("Backend reply is not a JSON object, falling back to text anchors");
    }

    let fields = fields_from_anchors(text);
    let source = if fields.is_empty() {
        PayloadSource::Unusable
    } else {
        PayloadSource::TextAnchors
    };
    Interpretation { source, fields }
}

fn decode_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// First brace-balanced `{...}` span in the text
fn find_embedded_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let s = &text[start..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(s[..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn fields_from_object(obj: &Map<String, Value>) -> BackendFields {
    let mut fields = BackendFields::default();

    match get(obj, &["sentimentScore", "sentiment_score", "sentiment"]) {
        Some(Value::Object(score)) => {
            fields.overall = string_at(score, &["overall", "label", "sentiment"])
                .and_then(|s| Sentiment::parse(&s));
            fields.score = number_at(score, &["score", "value"]);
        }
        Some(Value::String(label)) => fields.overall = Sentiment::parse(label),
        _ => {}
    }

    if let Some(Value::Object(highlights)) = get(obj, &["keyHighlights", "key_highlights"]) {
        fields.issue = string_at(highlights, &["issue"]);
        fields.resolution = string_at(highlights, &["resolution"]);
        fields.summary = string_at(highlights, &["summary"]);
    }

    if let Some(Value::Object(agent)) = get(obj, &["agentScore", "agent_score"]) {
        fields.rating = number_at(agent, &["rating", "score"]);
        fields.professionalism = string_at(agent, &["professionalism"]);
        fields.efficiency = string_at(agent, &["efficiency"]);
    }

    if let Some(Value::Array(points)) = get(obj, &["sentimentTrend", "sentiment_trend"]) {
        let points: Vec<TrendPoint> = points
            .iter()
            .filter_map(|p| serde_json::from_value::<WirePoint>(p.clone()).ok())
            .filter(|p| p.time.is_finite() && p.value.is_finite())
            .map(|p| TrendPoint {
                time: p.time,
                value: p.value,
            })
            .collect();
        if !points.is_empty() {
            fields.sentiment_trend = Some(points);
        }
    }

    if let Some(Value::Array(topics)) = get(obj, &["topics"]) {
        let topics: Vec<TopicMention> = topics.iter().filter_map(decode_topic).collect();
        if !topics.is_empty() {
            fields.topics = Some(topics);
        }
    }

    if let Some(Value::Object(perf)) = get(obj, &["agentPerformance", "agent_performance"]) {
        fields.greeting = number_at(perf, &["greeting"]);
        fields.problem_solving = number_at(perf, &["problemSolving", "problem_solving"]);
        fields.closing = number_at(perf, &["closing"]);
    }

    fields.detected_language =
        string_at(obj, &["detectedLanguage", "detected_language", "language"]);
    fields.agent_sentiment = string_at(obj, &["agentSentiment", "agent_sentiment"]);
    fields.first_call_resolution = get(obj, &["firstCallResolution", "first_call_resolution"])
        .and_then(as_bool);

    fields
}

#[derive(Deserialize)]
struct WirePoint {
    #[serde(alias = "timestamp", alias = "t")]
    time: f64,
    #[serde(alias = "score", alias = "sentiment")]
    value: f64,
}

fn decode_topic(value: &Value) -> Option<TopicMention> {
    match value {
        Value::String(name) if !name.trim().is_empty() => {
            Some(TopicMention::new(name.trim(), 1, 0.0))
        }
        Value::Object(topic) => {
            let name = string_at(topic, &["name", "topic"])?;
            let mentions = number_at(topic, &["mentions", "count"])
                .map(|n| n.round().max(0.0) as u32)
                .unwrap_or(1);
            let percentage = number_at(topic, &["percentage"]).unwrap_or(0.0);
            Some(TopicMention::new(name, mentions, percentage))
        }
        _ => None,
    }
}

fn get<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

/// Non-blank string value
fn string_at(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Finite number, accepting numeric strings
fn number_at(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(as_number)
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => parse_yes_no(s),
        _ => None,
    }
}

fn parse_yes_no(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

fn fields_from_anchors(text: &str) -> BackendFields {
    let mut fields = BackendFields::default();

    for caps in SENTIMENT_ANCHOR.captures_iter(text) {
        let label = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        if caps.get(1).is_some() {
            if fields.agent_sentiment.is_none() {
                fields.agent_sentiment = Sentiment::parse(label).map(|s| s.as_str().to_string());
            }
        } else if fields.overall.is_none() {
            fields.overall = Sentiment::parse(label);
        }
    }

    let mut agent_score = None;
    for caps in SCORE_ANCHOR.captures_iter(text) {
        let Some(value) = caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok()) else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }
        match (caps.get(1).is_some(), caps.get(2).is_some()) {
            (false, _) => {
                fields.score.get_or_insert(value);
            }
            // Agent score is the rating; agent sentiment score has no numeric field
            (true, false) => {
                agent_score.get_or_insert(value);
            }
            (true, true) => {}
        }
    }
    fields.rating = capture_number(&RATING_ANCHOR, text).or(agent_score);
    fields.greeting = capture_number(&GREETING_ANCHOR, text);
    fields.problem_solving = capture_number(&PROBLEM_SOLVING_ANCHOR, text);
    fields.closing = capture_number(&CLOSING_ANCHOR, text);

    fields.issue = capture_text(&ISSUE_ANCHOR, text);
    fields.resolution = capture_text(&RESOLUTION_ANCHOR, text);
    fields.summary = capture_text(&SUMMARY_ANCHOR, text);
    fields.professionalism = capture_text(&PROFESSIONALISM_ANCHOR, text);
    fields.efficiency = capture_text(&EFFICIENCY_ANCHOR, text);
    fields.detected_language = capture_text(&LANGUAGE_ANCHOR, text);

    fields.first_call_resolution = FCR_ANCHOR
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_yes_no(m.as_str()));

    fields.topics = capture_text(&TOPICS_ANCHOR, text).and_then(|list| {
        let topics: Vec<TopicMention> = list
            .split([',', ';'])
            .map(clean_value)
            .filter(|name| !name.is_empty())
            .map(|name| TopicMention::new(name, 1, 0.0))
            .collect();
        (!topics.is_empty()).then_some(topics)
    });

    fields
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

fn capture_text(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_value(m.as_str()))
        .filter(|s| !s.is_empty())
}

/// Strip quoting, markup and trailing separators from an anchored value
fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_end_matches([',', ';'])
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '*' || c == '[' || c == ']')
        .trim()
        .to_string()
}
