use crate::models::{TranscriptMessage, TrendPoint};

use super::{Lexicon, normalize_words};

/// Score change per keyword hit
const HIT_WEIGHT: f64 = 0.1;
/// Charting needs at least this many trend points
pub const MIN_TREND_POINTS: usize = 3;
/// Time offset between padding points, in seconds
const PAD_STEP_SECS: f64 = 10.0;

/// Keyword polarity of a piece of text, in [-1, 1]
///
/// Each whole-word positive hit adds 0.1 and each negative hit subtracts 0.1. Equal
/// counts resolve to exactly zero.
pub fn message_sentiment(text: &str, lexicon: &Lexicon) -> f64 {
    let mut positive = 0usize;
    let mut negative = 0usize;

    for word in normalize_words(text) {
        if lexicon.positive_words.iter().any(|w| *w == word) {
            positive += 1;
        }
        if lexicon.negative_words.iter().any(|w| *w == word) {
            negative += 1;
        }
    }

    if positive == negative {
        return 0.0;
    }
    let raw = (positive as f64 - negative as f64) * HIT_WEIGHT;
    raw.clamp(-1.0, 1.0)
}

/// Sampling bounds for synthesized trends
#[derive(Debug, Clone, Copy)]
pub struct TrendConfig {
    pub min_points: usize,
    pub max_points: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_points: MIN_TREND_POINTS,
            max_points: 20,
        }
    }
}

/// Build a sentiment trend from the transcript alone
///
/// Messages are sampled evenly down to at most `max_points` and spread evenly across
/// `total_secs`. The result is padded to at least three points.
pub fn synthesize_trend(
    messages: &[TranscriptMessage],
    total_secs: f64,
    config: &TrendConfig,
    lexicon: &Lexicon,
) -> Vec<TrendPoint> {
    let count = messages.len();
    let target = count
        .clamp(config.min_points, config.max_points.max(config.min_points))
        .min(count);

    let total = if total_secs.is_finite() && total_secs > 0.0 {
        total_secs
    } else {
        0.0
    };

    let points: Vec<TrendPoint> = (0..target)
        .map(|i| {
            let message = &messages[i * count / target];
            TrendPoint {
                time: total * i as f64 / target as f64,
                value: message_sentiment(&message.text, lexicon),
            }
        })
        .collect();

    pad_trend(points)
}

/// Extend a trend to the charting minimum by repeating its last value
pub fn pad_trend(mut points: Vec<TrendPoint>) -> Vec<TrendPoint> {
    if points.len() >= MIN_TREND_POINTS {
        return points;
    }

    let last = points.last().copied().unwrap_or(TrendPoint {
        time: 0.0,
        value: 0.0,
    });
    if points.is_empty() {
        points.push(last);
    }

    let mut step = 1.0;
    while points.len() < MIN_TREND_POINTS {
        points.push(TrendPoint {
            time: last.time + PAD_STEP_SECS * step,
            value: last.value,
        });
        step += 1.0;
    }
    points
}
