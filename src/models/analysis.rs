use serde::{Deserialize, Serialize};

/// Overall call polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Parse a polarity label, ignoring case and surrounding whitespace
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }

    /// Score used when only the label is known
    pub fn nominal_score(&self) -> f64 {
        match self {
            Sentiment::Positive => 0.8,
            Sentiment::Neutral => 0.5,
            Sentiment::Negative => 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub overall: Sentiment,
    /// Confidence-weighted score in [0, 1]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyHighlights {
    pub issue: String,
    pub resolution: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentScore {
    /// Rating in [1, 10]
    pub rating: u8,
    pub professionalism: String,
    pub efficiency: String,
}

/// A point on a time-indexed chart series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Seconds from the start of the call
    pub time: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkTimeRatio {
    pub agent_percentage: f64,
    pub customer_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicMention {
    pub name: String,
    #[serde(alias = "count")]
    pub mentions: u32,
    pub percentage: f64,
}

impl TopicMention {
    pub fn new(name: impl Into<String>, mentions: u32, percentage: f64) -> Self {
        Self {
            name: name.into(),
            mentions,
            percentage,
        }
    }
}

/// Per-phase agent performance, each in [0, 10]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    pub greeting: f64,
    pub problem_solving: f64,
    pub closing: f64,
}

impl AgentPerformance {
    pub fn uniform(value: f64) -> Self {
        Self {
            greeting: value,
            problem_solving: value,
            closing: value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCloudEntry {
    pub word: String,
    pub count: u32,
    /// count / max count, in (0, 1]
    pub weight: f64,
}

/// Complete analytics record for one call
///
/// Always built wholesale by the analysis pipeline; every field is present and range
/// valid regardless of what the generation backend returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAnalysis {
    pub sentiment_score: SentimentScore,
    pub key_highlights: KeyHighlights,
    pub agent_score: AgentScore,
    pub sentiment_trend: Vec<TrendPoint>,
    pub talk_time_ratio: TalkTimeRatio,
    pub topics: Vec<TopicMention>,
    pub agent_performance: AgentPerformance,
    pub agent_talk_seconds: f64,
    pub customer_talk_seconds: f64,
    pub detected_language: String,
    pub agent_sentiment: String,
    pub word_cloud: Vec<WordCloudEntry>,
    pub loudness_trend: Vec<TrendPoint>,
    pub first_call_resolution: Option<bool>,
}

impl CallAnalysis {
    /// Agent share minus customer share, in percentage points
    pub fn talk_time_balance(&self) -> f64 {
        self.talk_time_ratio.agent_percentage - self.talk_time_ratio.customer_percentage
    }
}
