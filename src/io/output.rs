use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::{CallscopeError, Result};
use crate::models::{CallAnalysis, TranscriptMessage};

/// Write any serializable value as pretty-printed JSON
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| CallscopeError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

/// Human-readable call analysis report
pub struct AnalysisReport<'a> {
    analysis: &'a CallAnalysis,
    messages: &'a [TranscriptMessage],
}

impl<'a> AnalysisReport<'a> {
    pub fn new(analysis: &'a CallAnalysis, messages: &'a [TranscriptMessage]) -> Self {
        Self { analysis, messages }
    }

    /// Format the analysis as plain text
    pub fn format(&self) -> String {
        let a = self.analysis;
        let mut output = String::new();

        output.push_str("CALL ANALYSIS\n=============\n\n");
        output.push_str(&format!(
            "Sentiment:   {} ({:.2})\n",
            a.sentiment_score.overall.as_str(),
            a.sentiment_score.score
        ));
        output.push_str(&format!("Agent score: {}/10\n", a.agent_score.rating));
        output.push_str(&format!("Language:    {}\n", a.detected_language));
        let resolved = match a.first_call_resolution {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unknown",
        };
        output.push_str(&format!("Resolved:    {}\n", resolved));
        output.push_str(&format!(
            "Talk time:   agent {} ({:.1}%), customer {} ({:.1}%)\n\n",
            format_timestamp(a.agent_talk_seconds),
            a.talk_time_ratio.agent_percentage,
            format_timestamp(a.customer_talk_seconds),
            a.talk_time_ratio.customer_percentage
        ));

        for (title, text) in [
            ("Issue", &a.key_highlights.issue),
            ("Resolution", &a.key_highlights.resolution),
            ("Summary", &a.key_highlights.summary),
        ] {
            output.push_str(&format!("{}:\n", title));
            output.push_str(&indent(&wrap_text(text, 76), "  "));
            output.push_str("\n\n");
        }

        let perf = &a.agent_performance;
        output.push_str("Agent performance:\n");
        output.push_str(&format!("  Greeting        {:.1}\n", perf.greeting));
        output.push_str(&format!("  Problem solving {:.1}\n", perf.problem_solving));
        output.push_str(&format!("  Closing         {:.1}\n", perf.closing));
        output.push_str(&format!("  Professionalism: {}\n", a.agent_score.professionalism));
        output.push_str(&format!("  Efficiency:      {}\n\n", a.agent_score.efficiency));

        output.push_str("Topics:\n");
        for topic in &a.topics {
            output.push_str(&format!(
                "  {:<20} {:>3} mentions ({:.1}%)\n",
                topic.name, topic.mentions, topic.percentage
            ));
        }

        if !a.word_cloud.is_empty() {
            let words: Vec<String> = a
                .word_cloud
                .iter()
                .take(10)
                .map(|w| format!("{} ({})", w.word, w.count))
                .collect();
            output.push_str("\nTop words:\n");
            output.push_str(&indent(&wrap_text(&words.join(", "), 76), "  "));
            output.push('\n');
        }

        if !self.messages.is_empty() {
            output.push_str("\nTRANSCRIPT\n==========\n\n");
            for msg in self.messages {
                output.push_str(&format!(
                    "[{}] {}:\n",
                    format_timestamp(msg.timestamp),
                    msg.speaker.to_uppercase()
                ));
                output.push_str(&wrap_text(&msg.text, 80));
                output.push_str("\n\n");
            }
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let write_err = |source| CallscopeError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut file = std::fs::File::create(path).map_err(write_err)?;
        write!(file, "{}", self.format()).map_err(write_err)?;
        Ok(())
    }
}

/// Format seconds as MM:SS
pub fn format_timestamp(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len + word_len + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word_len;
    }

    result
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}
