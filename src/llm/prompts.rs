use serde::Serialize;

use crate::metrics::TalkTime;
use crate::models::TranscriptMessage;

/// System prompt for the analysis backend
pub const SYSTEM_PROMPT: &str = r#"You are a call-center quality analyst. You read customer service call transcripts and return structured analytics.

RULES:
1. Output MUST be a single JSON object matching the schema in the request. No prose outside it.
2. Use the talk-time figures provided. Do not recompute them.
3. Quote or paraphrase the transcript for highlights. Do not invent details.
4. If something cannot be determined, omit the field rather than guessing."#;

/// JSON shape the backend is asked to produce
const RESPONSE_SCHEMA: &str = r#"{
  "sentimentScore": {"overall": "Positive|Neutral|Negative", "score": <0.0-1.0>},
  "keyHighlights": {"issue": "...", "resolution": "...", "summary": "..."},
  "agentScore": {"rating": <1-10>, "professionalism": "...", "efficiency": "..."},
  "sentimentTrend": [{"time": <seconds>, "value": <-1.0-1.0>}],
  "topics": [{"name": "...", "mentions": <count>, "percentage": <0-100>}],
  "agentPerformance": {"greeting": <0-10>, "problemSolving": <0-10>, "closing": <0-10>},
  "detectedLanguage": "...",
  "agentSentiment": "Positive|Neutral|Negative",
  "firstCallResolution": true|false
}"#;

/// Build the analysis request for one call
///
/// Talk time is computed locally and stated in the prompt so that the backend's view of
/// the call is anchored to the same figures the dashboard shows.
pub fn build_analysis_prompt(
    transcript: &str,
    messages: &[TranscriptMessage],
    talk_time: &TalkTime,
) -> String {
    let ratio = talk_time.ratio();
    let mut prompt = String::new();

    prompt.push_str("# Call Transcript\n");
    prompt.push_str("```\n");
    prompt.push_str(transcript.trim());
    prompt.push_str("\n```\n\n");

    if !messages.is_empty() {
        prompt.push_str(&format!("## Message Breakdown ({} messages)\n", messages.len()));
        prompt.push_str("```json\n");
        prompt.push_str(&format_messages(messages));
        prompt.push_str("\n```\n\n");
    }

    prompt.push_str("## Talk Time (pre-computed, authoritative)\n");
    prompt.push_str(&format!(
        "- Agent: {:.1}s ({:.1}%)\n",
        talk_time.agent_secs, ratio.agent_percentage
    ));
    prompt.push_str(&format!(
        "- Customer: {:.1}s ({:.1}%)\n\n",
        talk_time.customer_secs, ratio.customer_percentage
    ));

    prompt.push_str("## Instructions\n");
    prompt.push_str("Analyze the call and respond with JSON in exactly this shape:\n");
    prompt.push_str("```json\n");
    prompt.push_str(RESPONSE_SCHEMA);
    prompt.push_str("\n```\n");
    prompt.push_str("Focus on:\n");
    prompt.push_str("- The customer's concrete issue and how (or whether) it was resolved\n");
    prompt.push_str("- How the agent opened, handled and closed the call\n");
    prompt.push_str("- How the customer's tone changed over the call\n");

    prompt
}

/// Format messages as JSON for the prompt
fn format_messages(messages: &[TranscriptMessage]) -> String {
    let display: Vec<MessageDisplay> = messages
        .iter()
        .map(|m| MessageDisplay {
            speaker: &m.speaker,
            text: &m.text,
            timestamp: m.timestamp,
        })
        .collect();

    serde_json::to_string_pretty(&display).unwrap_or_else(|_| "[]".to_string())
}

#[derive(Serialize)]
struct MessageDisplay<'a> {
    speaker: &'a str,
    text: &'a str,
    timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_anchored_talk_time() {
        let messages = vec![
            TranscriptMessage::new("agent", "Hello, how can I help?", 0.0).with_duration(30.0),
            TranscriptMessage::new("customer", "My bill is wrong.", 30.0).with_duration(10.0),
        ];
        let talk_time = TalkTime::from_messages(&messages, 5.0);
        let prompt = build_analysis_prompt("AGENT: Hello\nCUSTOMER: My bill", &messages, &talk_time);

        assert!(prompt.contains("Agent: 30.0s (75.0%)"));
        assert!(prompt.contains("Customer: 10.0s (25.0%)"));
        assert!(prompt.contains("\"speaker\": \"customer\""));
        assert!(prompt.contains("My bill is wrong."));
        assert!(prompt.contains("firstCallResolution"));
    }

    #[test]
    fn test_prompt_without_messages() {
        let prompt = build_analysis_prompt("", &[], &TalkTime::default());
        assert!(!prompt.contains("Message Breakdown"));
        assert!(prompt.contains("Agent: 0.0s (50.0%)"));
    }
}
