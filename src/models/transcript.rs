use serde::{Deserialize, Serialize};

/// Speaker tag used for the call-center agent
pub const AGENT_SPEAKER: &str = "agent";

/// Speaker tag given to unstructured transcripts
pub const DEFAULT_SPEAKER: &str = "unknown";

/// One attributed utterance in a call transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessage {
    /// Lowercase speaker tag; `agent` for the agent, anything else is the customer side
    pub speaker: String,
    /// Utterance text, possibly spanning several source lines
    pub text: String,
    /// Offset from the start of the call in seconds
    pub timestamp: f64,
    /// Utterance length in seconds, when timing metadata is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Keyword sentiment in [-1, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
    /// Loudness proxy in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loudness: Option<f64>,
}

impl TranscriptMessage {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>, timestamp: f64) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            timestamp,
            duration: None,
            sentiment: None,
            loudness: None,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn is_agent(&self) -> bool {
        self.speaker.eq_ignore_ascii_case(AGENT_SPEAKER)
    }

    /// Duration in seconds, falling back to `default_secs` when absent or invalid
    pub fn effective_duration(&self, default_secs: f64) -> f64 {
        match self.duration {
            Some(d) if d.is_finite() && d >= 0.0 => d,
            _ => default_secs,
        }
    }

    /// End offset in seconds
    pub fn end(&self, default_secs: f64) -> f64 {
        self.timestamp + self.effective_duration(default_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_duration() {
        let msg = TranscriptMessage::new("agent", "hello", 2.0);
        assert_eq!(msg.effective_duration(5.0), 5.0);
        assert_eq!(msg.end(5.0), 7.0);

        let msg = msg.with_duration(3.5);
        assert_eq!(msg.effective_duration(5.0), 3.5);
        assert_eq!(msg.end(5.0), 5.5);
    }

    #[test]
    fn test_negative_duration_uses_default() {
        let msg = TranscriptMessage::new("customer", "hi", 0.0).with_duration(-1.0);
        assert_eq!(msg.effective_duration(4.0), 4.0);
    }

    #[test]
    fn test_is_agent() {
        assert!(TranscriptMessage::new("agent", "", 0.0).is_agent());
        assert!(TranscriptMessage::new("AGENT", "", 0.0).is_agent());
        assert!(!TranscriptMessage::new("customer", "", 0.0).is_agent());
        assert!(!TranscriptMessage::new(DEFAULT_SPEAKER, "", 0.0).is_agent());
    }
}
