use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::models::{AGENT_SPEAKER, DEFAULT_SPEAKER, TranscriptMessage};

/// `[hh:mm:ss] SPEAKER: text`, also accepting `[mm:ss]`
static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\[(\d{1,2}):(\d{2})(?::(\d{2}))?\]\s*([^:\[\]]+?)\s*:\s?(.*)$")
        .expect("Invalid regex")
});

/// Speaker labels that identify the agent side
const AGENT_ALIASES: &[&str] = &["agent", "representative", "rep"];

/// Split a raw transcript into ordered messages
///
/// A line with a timestamp and speaker marker starts a new message; following unmarked
/// lines are appended to it. Text before the first marker joins the first message.
/// A transcript without any marker becomes a single message from an unknown speaker,
/// and an empty transcript yields no messages.
///
/// Durations are inferred from the gap to the next marker; the last message has none.
pub fn segment(transcript: &str) -> Vec<TranscriptMessage> {
    if transcript.trim().is_empty() {
        return Vec::new();
    }

    let mut messages: Vec<TranscriptMessage> = Vec::new();
    let mut current: Option<TranscriptMessage> = None;
    let mut preamble: Vec<&str> = Vec::new();

    for line in transcript.lines() {
        if let Some(caps) = MARKER_RE.captures(line) {
            if let Some(done) = current.take() {
                messages.push(done);
            }

            let mut text = caps
                .get(5)
                .map(|m| m.as_str().trim())
                .unwrap_or_default()
                .to_string();
            if messages.is_empty() && !preamble.is_empty() {
                let lead = preamble.join(" ");
                text = if text.is_empty() {
                    lead
                } else {
                    format!("{} {}", lead, text)
                };
                preamble.clear();
            }

            current = Some(TranscriptMessage::new(
                normalize_speaker(&caps[4]),
                text,
                marker_seconds(&caps),
            ));
        } else {
            let extra = line.trim();
            if extra.is_empty() {
                continue;
            }
            match current.as_mut() {
                Some(msg) => {
                    if !msg.text.is_empty() {
                        msg.text.push(' ');
                    }
                    msg.text.push_str(extra);
                }
                None => preamble.push(extra),
            }
        }
    }

    if let Some(done) = current.take() {
        messages.push(done);
    }

    if messages.is_empty() {
        return vec![TranscriptMessage::new(DEFAULT_SPEAKER, transcript.trim(), 0.0)];
    }

    infer_durations(&mut messages);
    messages
}

/// Lowercase tag, folding agent aliases into `agent`
fn normalize_speaker(raw: &str) -> String {
    let tag = raw.trim().to_lowercase();
    if AGENT_ALIASES.contains(&tag.as_str()) {
        AGENT_SPEAKER.to_string()
    } else {
        tag
    }
}

fn marker_seconds(caps: &Captures<'_>) -> f64 {
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    let total = match caps.get(3) {
        Some(_) => part(1) * 3600 + part(2) * 60 + part(3),
        None => part(1) * 60 + part(2),
    };
    total as f64
}

fn infer_durations(messages: &mut [TranscriptMessage]) {
    for i in 0..messages.len().saturating_sub(1) {
        let gap = messages[i + 1].timestamp - messages[i].timestamp;
        if gap > 0.0 {
            messages[i].duration = Some(gap);
        }
    }
}
