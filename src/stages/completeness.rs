use crate::heuristics::{Lexicon, MIN_TREND_POINTS, is_placeholder};
use crate::metrics::WORD_CLOUD_SIZE;
use crate::models::CallAnalysis;

/// Tolerance for percentage sums
const PERCENT_TOLERANCE: f64 = 0.01;

/// Outcome of a completeness check
#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessCheck {
    pub is_complete: bool,
    pub violations: Vec<String>,
}

impl CompletenessCheck {
    fn from_violations(violations: Vec<String>) -> Self {
        Self {
            is_complete: violations.is_empty(),
            violations,
        }
    }
}

/// Check every structural and range guarantee of a [`CallAnalysis`]
pub fn check_completeness(analysis: &CallAnalysis, lexicon: &Lexicon) -> CompletenessCheck {
    let mut violations = Vec::new();

    // 1. Scalar ranges
    let score = analysis.sentiment_score.score;
    if !(0.0..=1.0).contains(&score) {
        violations.push(format!("Sentiment score {} outside [0, 1]", score));
    }
    let rating = analysis.agent_score.rating;
    if !(1..=10).contains(&rating) {
        violations.push(format!("Agent rating {} outside [1, 10]", rating));
    }
    let perf = &analysis.agent_performance;
    for (name, value) in [
        ("greeting", perf.greeting),
        ("problemSolving", perf.problem_solving),
        ("closing", perf.closing),
    ] {
        if !(0.0..=10.0).contains(&value) {
            violations.push(format!("Agent performance {} = {} outside [0, 10]", name, value));
        }
    }
    if analysis.agent_talk_seconds < 0.0 || analysis.customer_talk_seconds < 0.0 {
        violations.push("Negative talk time".to_string());
    }

    // 2. Highlights must carry information
    let highlights = &analysis.key_highlights;
    for (name, value) in [
        ("issue", &highlights.issue),
        ("resolution", &highlights.resolution),
        ("summary", &highlights.summary),
    ] {
        if is_placeholder(value, lexicon) {
            violations.push(format!("Highlight {} is empty or a placeholder", name));
        }
    }

    // 3. Series
    if analysis.sentiment_trend.len() < MIN_TREND_POINTS {
        violations.push(format!(
            "Sentiment trend has {} points, need at least {}",
            analysis.sentiment_trend.len(),
            MIN_TREND_POINTS
        ));
    }
    if analysis
        .sentiment_trend
        .iter()
        .any(|p| !(-1.0..=1.0).contains(&p.value))
    {
        violations.push("Sentiment trend value outside [-1, 1]".to_string());
    }
    if analysis.loudness_trend.len() % 2 != 0 {
        violations.push("Loudness trend points are not paired".to_string());
    }
    if analysis
        .loudness_trend
        .iter()
        .any(|p| !(0.0..=1.0).contains(&p.value))
    {
        violations.push("Loudness value outside [0, 1]".to_string());
    }

    // 4. Distributions
    if analysis.topics.is_empty() {
        violations.push("No topics".to_string());
    } else {
        let sum: f64 = analysis.topics.iter().map(|t| t.percentage).sum();
        if (sum - 100.0).abs() > PERCENT_TOLERANCE {
            violations.push(format!("Topic percentages sum to {}", sum));
        }
    }
    let ratio = &analysis.talk_time_ratio;
    let ratio_sum = ratio.agent_percentage + ratio.customer_percentage;
    if (ratio_sum - 100.0).abs() > PERCENT_TOLERANCE {
        violations.push(format!("Talk time percentages sum to {}", ratio_sum));
    }
    if analysis.word_cloud.len() > WORD_CLOUD_SIZE {
        violations.push(format!(
            "Word cloud has {} entries, limit is {}",
            analysis.word_cloud.len(),
            WORD_CLOUD_SIZE
        ));
    }

    // 5. Labels
    if analysis.detected_language.trim().is_empty() {
        violations.push("Detected language is empty".to_string());
    }
    if analysis.agent_sentiment.trim().is_empty() {
        violations.push("Agent sentiment is empty".to_string());
    }

    CompletenessCheck::from_violations(violations)
}
