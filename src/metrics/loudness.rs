use crate::heuristics::{Lexicon, message_sentiment};
use crate::models::{TranscriptMessage, TrendPoint};

const BASE_LOUDNESS: f64 = 0.3;
const LONG_MESSAGE_CHARS: usize = 100;
const LONG_MESSAGE_BOOST: f64 = 0.2;
const NEGATIVE_BOOST: f64 = 0.3;
const CUSTOMER_BOOST: f64 = 0.1;

/// Text-derived vocal intensity proxy in [0, 1]
///
/// No audio is involved: long messages, negative wording and customer turns are assumed
/// to be louder.
pub fn message_loudness(message: &TranscriptMessage, sentiment: f64) -> f64 {
    let mut level = BASE_LOUDNESS;
    if message.text.chars().count() > LONG_MESSAGE_CHARS {
        level += LONG_MESSAGE_BOOST;
    }
    if sentiment < 0.0 {
        level += NEGATIVE_BOOST;
    }
    if !message.is_agent() {
        level += CUSTOMER_BOOST;
    }
    level.clamp(0.0, 1.0)
}

/// Step-function loudness series: a start and an end point per message
pub fn loudness_trend(
    messages: &[TranscriptMessage],
    default_duration_secs: f64,
    lexicon: &Lexicon,
) -> Vec<TrendPoint> {
    messages
        .iter()
        .flat_map(|msg| {
            let sentiment = msg
                .sentiment
                .unwrap_or_else(|| message_sentiment(&msg.text, lexicon));
            let value = message_loudness(msg, sentiment);
            [
                TrendPoint {
                    time: msg.timestamp,
                    value,
                },
                TrendPoint {
                    time: msg.end(default_duration_secs),
                    value,
                },
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_agent_loudness() {
        let msg = TranscriptMessage::new("agent", "Hello there", 0.0);
        assert_eq!(message_loudness(&msg, 0.0), 0.3);
    }

    #[test]
    fn test_all_boosts() {
        let text = "x".repeat(101);
        let msg = TranscriptMessage::new("customer", text, 0.0);
        let level = message_loudness(&msg, -0.5);
        assert!((level - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_trend_pairs() {
        let lexicon = Lexicon::default();
        let messages = vec![
            TranscriptMessage::new("agent", "Welcome", 0.0).with_duration(4.0),
            TranscriptMessage::new("customer", "This is terrible", 4.0),
        ];
        let trend = loudness_trend(&messages, 5.0, &lexicon);

        assert_eq!(trend.len(), 4);
        assert_eq!(trend[0], TrendPoint { time: 0.0, value: 0.3 });
        assert_eq!(trend[1], TrendPoint { time: 4.0, value: 0.3 });
        assert_eq!(trend[2].time, 4.0);
        assert_eq!(trend[3].time, 9.0);
        assert!((trend[2].value - 0.7).abs() < 1e-12);
        assert_eq!(trend[2].value, trend[3].value);
    }

    #[test]
    fn test_empty_messages() {
        let lexicon = Lexicon::default();
        assert!(loudness_trend(&[], 5.0, &lexicon).is_empty());
    }
}
