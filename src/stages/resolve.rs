use std::borrow::Cow;

use tracing::{debug, warn};

use crate::heuristics::{
    Lexicon, TrendConfig, extract_issue, extract_resolution, extract_summary, fallback_topics,
    implies_resolution, is_placeholder, match_topics, normalize_topics, pad_trend,
    synthesize_trend,
};
use crate::llm::{BackendFields, Interpretation, PayloadSource, interpret_response};
use crate::metrics::{TalkTime, WORD_CLOUD_SIZE, build_word_cloud, loudness_trend};
use crate::models::{
    AgentPerformance, AgentScore, CallAnalysis, KeyHighlights, Sentiment, SentimentScore,
    TopicMention, TranscriptMessage, TrendPoint,
};

use super::{check_completeness, segment};

const DEFAULT_RATING: u8 = 7;
const FAILURE_RATING: u8 = 5;
const DEFAULT_PERFORMANCE: f64 = 7.0;
const FAILURE_PERFORMANCE: f64 = 5.0;
const DEFAULT_LANGUAGE: &str = "English";
const DEFAULT_AGENT_SENTIMENT: &str = "Neutral";
const GENERIC_PROFESSIONALISM: &str = "Agent maintained a professional manner";
const GENERIC_EFFICIENCY: &str = "Call handled in a reasonable time";
const DEFAULT_ISSUE: &str = "No specific issue identified";
const DEFAULT_RESOLUTION: &str = "No resolution recorded";
const DEFAULT_SUMMARY: &str = "No transcript content available";

/// Tunables for the analysis engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Vocabulary for every transcript heuristic
    pub lexicon: Lexicon,
    /// Seconds assumed for a message without timing metadata
    pub default_message_secs: f64,
    /// Sampling bounds for synthesized sentiment trends
    pub trend: TrendConfig,
    /// Word cloud entries to keep (never more than 30)
    pub word_cloud_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lexicon: Lexicon::default(),
            default_message_secs: 5.0,
            trend: TrendConfig::default(),
            word_cloud_size: WORD_CLOUD_SIZE,
        }
    }
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Typed value from the backend reply
    Backend,
    /// Reconstructed from the transcript
    Heuristic,
    /// Fixed safe default
    Default,
}

/// A value together with the stage of the chain that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub provenance: Provenance,
}

/// Ordered resolution chain: backend value, then heuristic, then default
struct Chain<T> {
    found: Option<Resolved<T>>,
}

impl<T> Chain<T> {
    fn backend(value: Option<T>) -> Self {
        Self {
            found: value.map(|value| Resolved {
                value,
                provenance: Provenance::Backend,
            }),
        }
    }

    fn or_heuristic(self, heuristic: impl FnOnce() -> Option<T>) -> Self {
        match self.found {
            Some(_) => self,
            None => Self {
                found: heuristic().map(|value| Resolved {
                    value,
                    provenance: Provenance::Heuristic,
                }),
            },
        }
    }

    fn or_default(self, default: impl FnOnce() -> T) -> Resolved<T> {
        self.found.unwrap_or_else(|| Resolved {
            value: default(),
            provenance: Provenance::Default,
        })
    }
}

/// Which path each field group took
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionReport {
    pub payload: PayloadSource,
    pub sentiment_score: Provenance,
    pub issue: Provenance,
    pub resolution: Provenance,
    pub summary: Provenance,
    pub agent_score: Provenance,
    pub sentiment_trend: Provenance,
    pub topics: Provenance,
    pub agent_performance: Provenance,
    pub detected_language: Provenance,
    pub agent_sentiment: Provenance,
    pub first_call_resolution: Provenance,
}

/// A complete analysis plus its audit trail
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub analysis: CallAnalysis,
    pub report: ResolutionReport,
}

struct Context<'a> {
    transcript: &'a str,
    messages: &'a [TranscriptMessage],
    config: &'a EngineConfig,
    talk_time: TalkTime,
    total_failure: bool,
}

/// Turn a backend reply into a complete, range-valid analysis
///
/// Pure and deterministic: the same transcript, messages and reply always produce the
/// same analysis. Malformed content is never an error.
pub fn resolve_analysis(
    transcript: &str,
    messages: &[TranscriptMessage],
    reply: &str,
    config: &EngineConfig,
) -> Resolution {
    let interpretation = interpret_response(reply);
    resolve_interpretation(transcript, messages, &interpretation, config)
}

/// Resolve an already interpreted reply
pub fn resolve_interpretation(
    transcript: &str,
    messages: &[TranscriptMessage],
    interpretation: &Interpretation,
    config: &EngineConfig,
) -> Resolution {
    let messages = effective_messages(transcript, messages);
    let ctx = Context {
        transcript,
        messages: &messages,
        config,
        talk_time: TalkTime::from_messages(&messages, config.default_message_secs),
        total_failure: interpretation.is_total_failure(),
    };
    let fields = &interpretation.fields;
    let lexicon = &config.lexicon;

    let sentiment_score = resolve_sentiment_score(fields);
    let issue = resolve_highlight(fields.issue.as_deref(), lexicon, DEFAULT_ISSUE, || {
        extract_issue(ctx.transcript, lexicon)
    });
    let resolution = resolve_highlight(
        fields.resolution.as_deref(),
        lexicon,
        DEFAULT_RESOLUTION,
        || extract_resolution(ctx.transcript, lexicon),
    );
    let summary = resolve_highlight(fields.summary.as_deref(), lexicon, DEFAULT_SUMMARY, || {
        extract_summary(ctx.transcript)
    });
    let agent_score = resolve_agent_score(fields, &ctx);
    let sentiment_trend = resolve_sentiment_trend(fields, &ctx);
    let topics = resolve_topics(fields, &ctx);
    let agent_performance = resolve_agent_performance(fields, &ctx);
    let detected_language =
        resolve_label(fields.detected_language.as_deref(), DEFAULT_LANGUAGE);
    let agent_sentiment =
        resolve_label(fields.agent_sentiment.as_deref(), DEFAULT_AGENT_SENTIMENT);
    let first_call_resolution = Chain::backend(fields.first_call_resolution)
        .or_heuristic(|| Some(implies_resolution(&resolution.value, lexicon)))
        .or_default(|| false);

    let report = ResolutionReport {
        payload: interpretation.source,
        sentiment_score: sentiment_score.provenance,
        issue: issue.provenance,
        resolution: resolution.provenance,
        summary: summary.provenance,
        agent_score: agent_score.provenance,
        sentiment_trend: sentiment_trend.provenance,
        topics: topics.provenance,
        agent_performance: agent_performance.provenance,
        detected_language: detected_language.provenance,
        agent_sentiment: agent_sentiment.provenance,
        first_call_resolution: first_call_resolution.provenance,
    };
    debug!("Field resolution: {:?}", report);

    let analysis = CallAnalysis {
        sentiment_score: sentiment_score.value,
        key_highlights: KeyHighlights {
            issue: issue.value,
            resolution: resolution.value,
            summary: summary.value,
        },
        agent_score: agent_score.value,
        sentiment_trend: sentiment_trend.value,
        talk_time_ratio: ctx.talk_time.ratio(),
        topics: topics.value,
        agent_performance: agent_performance.value,
        agent_talk_seconds: ctx.talk_time.agent_secs,
        customer_talk_seconds: ctx.talk_time.customer_secs,
        detected_language: detected_language.value,
        agent_sentiment: agent_sentiment.value,
        word_cloud: build_word_cloud(
            &word_source(ctx.transcript, ctx.messages),
            lexicon,
            config.word_cloud_size.min(WORD_CLOUD_SIZE),
        ),
        loudness_trend: loudness_trend(ctx.messages, config.default_message_secs, lexicon),
        first_call_resolution: Some(first_call_resolution.value),
    };

    let check = check_completeness(&analysis, lexicon);
    if !check.is_complete {
        warn!("Resolved analysis failed completeness check: {:?}", check.violations);
    }

    Resolution { analysis, report }
}

/// Segment the raw transcript when the caller supplied no messages
fn effective_messages<'a>(
    transcript: &str,
    messages: &'a [TranscriptMessage],
) -> Cow<'a, [TranscriptMessage]> {
    if messages.is_empty() && !transcript.trim().is_empty() {
        Cow::Owned(segment(transcript))
    } else {
        Cow::Borrowed(messages)
    }
}

fn word_source(transcript: &str, messages: &[TranscriptMessage]) -> String {
    if messages.is_empty() {
        transcript.to_string()
    } else {
        messages
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn resolve_sentiment_score(fields: &BackendFields) -> Resolved<SentimentScore> {
    let backend = match (fields.overall, fields.score) {
        (Some(overall), score) => Some(SentimentScore {
            overall,
            score: score
                .map(|s| s.clamp(0.0, 1.0))
                .unwrap_or_else(|| overall.nominal_score()),
        }),
        (None, Some(score)) => {
            let score = score.clamp(0.0, 1.0);
            let overall = if score > 0.6 {
                Sentiment::Positive
            } else if score < 0.4 {
                Sentiment::Negative
            } else {
                Sentiment::Neutral
            };
            Some(SentimentScore { overall, score })
        }
        (None, None) => None,
    };

    Chain::backend(backend).or_default(|| SentimentScore {
        overall: Sentiment::Neutral,
        score: 0.5,
    })
}

fn resolve_highlight(
    backend: Option<&str>,
    lexicon: &Lexicon,
    default: &str,
    heuristic: impl FnOnce() -> Option<String>,
) -> Resolved<String> {
    let backend = backend
        .filter(|v| !is_placeholder(v, lexicon))
        .map(|v| v.trim().to_string());

    Chain::backend(backend)
        .or_heuristic(|| heuristic().filter(|v| !is_placeholder(v, lexicon)))
        .or_default(|| default.to_string())
}

fn resolve_agent_score(fields: &BackendFields, ctx: &Context<'_>) -> Resolved<AgentScore> {
    let has_backend =
        fields.rating.is_some() || fields.professionalism.is_some() || fields.efficiency.is_some();
    let fallback_rating = if ctx.total_failure {
        FAILURE_RATING
    } else {
        DEFAULT_RATING
    };

    let backend = has_backend.then(|| AgentScore {
        rating: fields
            .rating
            .map(clamp_rating)
            .unwrap_or(fallback_rating),
        professionalism: fields
            .professionalism
            .clone()
            .unwrap_or_else(|| GENERIC_PROFESSIONALISM.to_string()),
        efficiency: fields
            .efficiency
            .clone()
            .unwrap_or_else(|| GENERIC_EFFICIENCY.to_string()),
    });

    Chain::backend(backend).or_default(|| AgentScore {
        rating: fallback_rating,
        professionalism: GENERIC_PROFESSIONALISM.to_string(),
        efficiency: GENERIC_EFFICIENCY.to_string(),
    })
}

fn clamp_rating(rating: f64) -> u8 {
    rating.round().clamp(1.0, 10.0) as u8
}

fn resolve_sentiment_trend(
    fields: &BackendFields,
    ctx: &Context<'_>,
) -> Resolved<Vec<TrendPoint>> {
    let backend = fields.sentiment_trend.as_ref().map(|points| {
        let mut points: Vec<TrendPoint> = points
            .iter()
            .map(|p| TrendPoint {
                time: p.time.max(0.0),
                value: p.value.clamp(-1.0, 1.0),
            })
            .collect();
        points.sort_by(|a, b| a.time.total_cmp(&b.time));
        pad_trend(points)
    });

    Chain::backend(backend)
        .or_heuristic(|| {
            Some(synthesize_trend(
                ctx.messages,
                ctx.talk_time.total_secs(),
                &ctx.config.trend,
                &ctx.config.lexicon,
            ))
        })
        .or_default(|| pad_trend(Vec::new()))
}

fn resolve_topics(fields: &BackendFields, ctx: &Context<'_>) -> Resolved<Vec<TopicMention>> {
    let lexicon = &ctx.config.lexicon;
    Chain::backend(fields.topics.as_deref().and_then(normalize_topics))
        .or_heuristic(|| {
            let matched = match_topics(ctx.transcript, lexicon);
            (!matched.is_empty()).then_some(matched)
        })
        .or_default(|| fallback_topics(lexicon))
}

fn resolve_agent_performance(
    fields: &BackendFields,
    ctx: &Context<'_>,
) -> Resolved<AgentPerformance> {
    let has_backend =
        fields.greeting.is_some() || fields.problem_solving.is_some() || fields.closing.is_some();
    let fallback = if ctx.total_failure {
        FAILURE_PERFORMANCE
    } else {
        DEFAULT_PERFORMANCE
    };
    let score = |v: Option<f64>| v.map(|v| v.clamp(0.0, 10.0)).unwrap_or(fallback);

    let backend = has_backend.then(|| AgentPerformance {
        greeting: score(fields.greeting),
        problem_solving: score(fields.problem_solving),
        closing: score(fields.closing),
    });

    Chain::backend(backend).or_default(|| AgentPerformance::uniform(fallback))
}

fn resolve_label(backend: Option<&str>, default: &str) -> Resolved<String> {
    let backend = backend
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    Chain::backend(backend).or_default(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALL: &str = "[00:00:00] AGENT: Thank you for calling Acme, how can I help?\n\
                        [00:00:06] CUSTOMER: My invoice is wrong, I was charged twice.\n\
                        [00:00:15] AGENT: I am sorry about that. Let me check the billing.\n\
                        [00:00:30] AGENT: I have issued a refund, the duplicate charge is resolved.\n\
                        [00:00:41] CUSTOMER: Great, thanks for the help!\n";

    fn resolve(reply: &str) -> Resolution {
        let messages = segment(CALL);
        resolve_analysis(CALL, &messages, reply, &EngineConfig::default())
    }

    #[test]
    fn test_total_failure_uses_heuristics_and_failure_defaults() {
        let resolution = resolve("");
        let a = &resolution.analysis;
        let r = &resolution.report;

        assert_eq!(r.payload, PayloadSource::Unusable);
        assert_eq!(a.sentiment_score.overall, Sentiment::Neutral);
        assert_eq!(a.sentiment_score.score, 0.5);
        assert_eq!(a.agent_score.rating, 5);
        assert_eq!(a.agent_performance, AgentPerformance::uniform(5.0));
        assert_eq!(r.issue, Provenance::Heuristic);
        assert!(a.key_highlights.issue.contains("wrong"));
        assert!(a.key_highlights.resolution.contains("resolved"));
        assert_eq!(a.first_call_resolution, Some(true));
        assert_eq!(r.topics, Provenance::Heuristic);
        assert_eq!(a.topics[0].name, "Billing");
        assert_eq!(a.detected_language, "English");
        assert_eq!(a.agent_sentiment, "Neutral");
    }

    #[test]
    fn test_structured_reply_is_used() {
        let reply = r#"{
            "sentimentScore": {"overall": "Positive", "score": 0.85},
            "keyHighlights": {"issue": "Duplicate charge", "resolution": "Refund issued", "summary": "Billing fix"},
            "agentScore": {"rating": 9, "professionalism": "Courteous", "efficiency": "Fast"},
            "topics": [{"name": "Billing", "mentions": 3, "percentage": 10}],
            "agentPerformance": {"greeting": 9, "problemSolving": 8, "closing": 9},
            "detectedLanguage": "English",
            "agentSentiment": "Positive",
            "firstCallResolution": false
        }"#;
        let resolution = resolve(reply);
        let a = &resolution.analysis;

        assert_eq!(resolution.report.payload, PayloadSource::Structured);
        assert_eq!(a.sentiment_score.score, 0.85);
        assert_eq!(a.key_highlights.summary, "Billing fix");
        assert_eq!(a.agent_score.rating, 9);
        assert_eq!(a.topics, vec![TopicMention::new("Billing", 3, 100.0)]);
        assert_eq!(a.agent_performance.problem_solving, 8.0);
        assert_eq!(a.first_call_resolution, Some(false));
        // Not in the reply, so synthesized from the transcript
        assert_eq!(resolution.report.sentiment_trend, Provenance::Heuristic);
    }

    #[test]
    fn test_placeholder_highlights_are_reconstructed() {
        let reply = r#"{"keyHighlights": {"issue": "Issue identified in call", "resolution": "", "summary": "Call summary"}}"#;
        let resolution = resolve(reply);
        let h = &resolution.analysis.key_highlights;

        assert_ne!(h.summary, "Call summary");
        assert_ne!(h.issue, "Issue identified in call");
        assert!(!h.resolution.is_empty());
        assert_eq!(resolution.report.summary, Provenance::Heuristic);
        assert_eq!(resolution.report.issue, Provenance::Heuristic);
        assert_eq!(resolution.report.resolution, Provenance::Heuristic);
    }

    #[test]
    fn test_out_of_range_backend_values_are_clamped() {
        let reply = r#"{
            "sentimentScore": {"overall": "Negative", "score": 7},
            "agentScore": {"rating": 42},
            "agentPerformance": {"greeting": -3, "closing": 11},
            "sentimentTrend": [{"time": 10, "value": 4}, {"time": 0, "value": -9}]
        }"#;
        let a = resolve(reply).analysis;

        assert_eq!(a.sentiment_score.score, 1.0);
        assert_eq!(a.agent_score.rating, 10);
        assert_eq!(a.agent_score.professionalism, GENERIC_PROFESSIONALISM);
        assert_eq!(a.agent_performance.greeting, 0.0);
        assert_eq!(a.agent_performance.problem_solving, DEFAULT_PERFORMANCE);
        assert_eq!(a.agent_performance.closing, 10.0);
        assert_eq!(a.sentiment_trend.len(), 3);
        assert_eq!(a.sentiment_trend[0], TrendPoint { time: 0.0, value: -1.0 });
        assert_eq!(a.sentiment_trend[1], TrendPoint { time: 10.0, value: 1.0 });
        assert_eq!(a.sentiment_trend[2], TrendPoint { time: 20.0, value: 1.0 });
    }

    #[test]
    fn test_agent_score_anchor_is_not_sentiment() {
        let resolution = resolve("Agent score: 3\nThe agent was unhelpful.");
        let a = &resolution.analysis;

        assert_eq!(resolution.report.payload, PayloadSource::TextAnchors);
        assert_eq!(a.sentiment_score.overall, Sentiment::Neutral);
        assert_eq!(a.sentiment_score.score, 0.5);
        assert_eq!(resolution.report.sentiment_score, Provenance::Default);
        assert_eq!(a.agent_score.rating, 3);
    }

    #[test]
    fn test_huge_topic_counts() {
        let reply = r#"{"topics": [
            {"name": "Billing", "mentions": 4000000000},
            {"name": "Price", "mentions": 4000000000}
        ]}"#;
        let a = resolve(reply).analysis;
        assert_eq!(a.topics.len(), 2);
        assert_eq!(a.topics[0].percentage, 50.0);
        assert_eq!(a.topics[1].percentage, 50.0);
    }

    #[test]
    fn test_decoded_but_empty_object_is_not_total_failure() {
        let a = resolve("{}").analysis;
        assert_eq!(a.agent_score.rating, DEFAULT_RATING);
        assert_eq!(a.agent_performance, AgentPerformance::uniform(DEFAULT_PERFORMANCE));
    }

    #[test]
    fn test_score_only_infers_label() {
        let a = resolve(r#"{"sentimentScore": {"score": 0.2}}"#).analysis;
        assert_eq!(a.sentiment_score.overall, Sentiment::Negative);
        assert_eq!(a.sentiment_score.score, 0.2);
    }

    #[test]
    fn test_talk_time_is_local() {
        let reply = r#"{"talkTimeRatio": {"agentPercentage": 99, "customerPercentage": 1}}"#;
        let a = resolve(reply).analysis;
        // Durations come from marker gaps; the last message uses the 5s default
        assert_eq!(a.agent_talk_seconds, 6.0 + 15.0 + 11.0);
        assert_eq!(a.customer_talk_seconds, 9.0 + 5.0);
        let sum = a.talk_time_ratio.agent_percentage + a.talk_time_ratio.customer_percentage;
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_messages_segmented_when_missing() {
        let config = EngineConfig::default();
        let with = resolve_analysis(CALL, &segment(CALL), "", &config);
        let without = resolve_analysis(CALL, &[], "", &config);
        assert_eq!(with, without);
    }

    #[test]
    fn test_word_cloud_size_is_capped() {
        let config = EngineConfig {
            word_cloud_size: 100,
            ..EngineConfig::default()
        };
        let text: String = (0..60).map(|i| format!("token{:02} ", i)).collect();
        let a = resolve_analysis(&text, &[], "", &config).analysis;
        assert_eq!(a.word_cloud.len(), 30);
    }

    #[test]
    fn test_chain_order() {
        let r = Chain::backend(Some(1))
            .or_heuristic(|| Some(2))
            .or_default(|| 3);
        assert_eq!(r, Resolved { value: 1, provenance: Provenance::Backend });

        let r = Chain::backend(None)
            .or_heuristic(|| Some(2))
            .or_default(|| 3);
        assert_eq!(r.provenance, Provenance::Heuristic);

        let r = Chain::<i32>::backend(None)
            .or_heuristic(|| None)
            .or_default(|| 3);
        assert_eq!(r, Resolved { value: 3, provenance: Provenance::Default });
    }
}
