use crate::models::{TalkTimeRatio, TranscriptMessage};

/// Seconds attributed to each side of a call
///
/// Computed once per analysis from message durations and reused wherever talk time is
/// shown, so percentages and absolute seconds always agree.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TalkTime {
    pub agent_secs: f64,
    pub customer_secs: f64,
}

impl TalkTime {
    /// Sum message durations by speaker; anything not tagged `agent` counts as customer
    pub fn from_messages(messages: &[TranscriptMessage], default_duration_secs: f64) -> Self {
        messages.iter().fold(TalkTime::default(), |mut acc, msg| {
            let duration = msg.effective_duration(default_duration_secs);
            if msg.is_agent() {
                acc.agent_secs += duration;
            } else {
                acc.customer_secs += duration;
            }
            acc
        })
    }

    pub fn total_secs(&self) -> f64 {
        self.agent_secs + self.customer_secs
    }

    /// Percentage split; 50/50 when nobody spoke
    pub fn ratio(&self) -> TalkTimeRatio {
        let total = self.total_secs();
        if total <= 0.0 || !total.is_finite() {
            return TalkTimeRatio {
                agent_percentage: 50.0,
                customer_percentage: 50.0,
            };
        }
        TalkTimeRatio {
            agent_percentage: self.agent_secs / total * 100.0,
            customer_percentage: self.customer_secs / total * 100.0,
        }
    }
}
