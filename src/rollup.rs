use std::collections::BTreeMap;

use chrono::Datelike;
use tracing::debug;

use crate::models::{
    AggregateMetrics, BucketStats, CallAnalysis, CallRecording, GroupStats, TalkTimeCorrelation,
};

const UNKNOWN_LANGUAGE: &str = "Unknown";
const UNASSIGNED_DEPARTMENT: &str = "Unassigned";
const UNKNOWN_AGENT: &str = "Unknown";

/// Rollup tunables
#[derive(Debug, Clone)]
pub struct RollupConfig {
    /// Talk-time balance, in percentage points, still counted as balanced
    pub dead_band: f64,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self { dead_band: 10.0 }
    }
}

/// Fleet statistics over a set of recordings, with default settings
pub fn aggregate(recordings: &[CallRecording]) -> AggregateMetrics {
    aggregate_with(recordings, &RollupConfig::default())
}

/// Fleet statistics over a set of recordings
///
/// Recomputed from scratch on every call. Talk-time averages only consider analyzed
/// calls with a strictly positive value; the resolution rate is over all recordings.
pub fn aggregate_with(recordings: &[CallRecording], config: &RollupConfig) -> AggregateMetrics {
    let mut metrics = AggregateMetrics {
        total_calls: recordings.len(),
        ..AggregateMetrics::default()
    };

    let mut agent_talk = Mean::default();
    let mut customer_talk = Mean::default();
    let mut resolved = 0usize;
    let mut by_language: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
    let mut by_department: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
    let mut by_week: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
    let mut by_agent: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
    let mut agent_dominant = Mean::default();
    let mut customer_dominant = Mean::default();
    let mut balanced = Mean::default();

    for recording in recordings {
        metrics.duration_buckets.record(recording.duration);

        if let Some(analysis) = &recording.analysis {
            metrics.analyzed_calls += 1;
            if analysis.agent_talk_seconds > 0.0 {
                agent_talk.add(analysis.agent_talk_seconds);
            }
            if analysis.customer_talk_seconds > 0.0 {
                customer_talk.add(analysis.customer_talk_seconds);
            }
            if is_resolved(analysis) {
                resolved += 1;
            }

            let balance = analysis.talk_time_balance();
            let bucket = if balance > config.dead_band {
                &mut agent_dominant
            } else if balance < -config.dead_band {
                &mut customer_dominant
            } else {
                &mut balanced
            };
            bucket.add(analysis.sentiment_score.score);
        }

        by_language
            .entry(language_key(recording))
            .or_default()
            .add(recording);
        by_department
            .entry(department_key(recording))
            .or_default()
            .add(recording);
        by_week.entry(week_key(recording)).or_default().add(recording);
        by_agent.entry(agent_key(recording)).or_default().add(recording);
    }

    metrics.avg_agent_talk_sec = agent_talk.value();
    metrics.avg_customer_talk_sec = customer_talk.value();
    metrics.first_call_resolution_rate = ratio(resolved, recordings.len());
    metrics.by_language = finish_groups(by_language);
    metrics.by_department = finish_groups(by_department);
    metrics.by_week = finish_groups(by_week);
    metrics.by_agent = finish_groups(by_agent);
    metrics.talk_time_sentiment = TalkTimeCorrelation {
        agent_dominant: agent_dominant.bucket(),
        customer_dominant: customer_dominant.bucket(),
        balanced: balanced.bucket(),
    };

    debug!(
        "Aggregated {} recordings ({} analyzed)",
        metrics.total_calls, metrics.analyzed_calls
    );
    metrics
}

fn is_resolved(analysis: &CallAnalysis) -> bool {
    analysis.first_call_resolution.unwrap_or(false)
}

fn language_key(recording: &CallRecording) -> String {
    recording
        .metadata
        .as_ref()
        .and_then(|m| non_blank(m.language.as_deref()))
        .or_else(|| {
            recording
                .analysis
                .as_ref()
                .and_then(|a| non_blank(Some(&a.detected_language)))
        })
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
}

fn department_key(recording: &CallRecording) -> String {
    recording
        .metadata
        .as_ref()
        .and_then(|m| non_blank(m.department.as_deref()))
        .unwrap_or_else(|| UNASSIGNED_DEPARTMENT.to_string())
}

fn agent_key(recording: &CallRecording) -> String {
    recording
        .metadata
        .as_ref()
        .and_then(|m| non_blank(m.agent.as_deref()))
        .unwrap_or_else(|| UNKNOWN_AGENT.to_string())
}

/// ISO week of the creation time, as `YYYY-Www`
fn week_key(recording: &CallRecording) -> String {
    let week = recording.created_at.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[derive(Debug, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn bucket(&self) -> BucketStats {
        BucketStats {
            calls: self.count,
            avg_sentiment_score: self.value(),
        }
    }
}

#[derive(Debug, Default)]
struct GroupAccumulator {
    calls: usize,
    resolved: usize,
    sentiment: Mean,
    duration: Mean,
}

impl GroupAccumulator {
    fn add(&mut self, recording: &CallRecording) {
        self.calls += 1;
        self.duration.add(recording.duration);
        if let Some(analysis) = &recording.analysis {
            self.sentiment.add(analysis.sentiment_score.score);
            if is_resolved(analysis) {
                self.resolved += 1;
            }
        }
    }

    fn finish(&self) -> GroupStats {
        GroupStats {
            calls: self.calls,
            analyzed_calls: self.sentiment.count,
            avg_sentiment_score: self.sentiment.value(),
            first_call_resolution_rate: ratio(self.resolved, self.calls),
            avg_duration_sec: self.duration.value(),
        }
    }
}

fn finish_groups(groups: BTreeMap<String, GroupAccumulator>) -> BTreeMap<String, GroupStats> {
    groups
        .into_iter()
        .map(|(key, acc)| (key, acc.finish()))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{RecordingMetadata, TalkTimeRatio};
    use crate::stages::{EngineConfig, resolve_analysis};

    fn analysis(agent_secs: f64, customer_secs: f64, score: f64, resolved: bool) -> CallAnalysis {
        let mut a = resolve_analysis("", &[], "", &EngineConfig::default()).analysis;
        a.agent_talk_seconds = agent_secs;
        a.customer_talk_seconds = customer_secs;
        let total = agent_secs + customer_secs;
        a.talk_time_ratio = if total > 0.0 {
            TalkTimeRatio {
                agent_percentage: agent_secs / total * 100.0,
                customer_percentage: customer_secs / total * 100.0,
            }
        } else {
            TalkTimeRatio {
                agent_percentage: 50.0,
                customer_percentage: 50.0,
            }
        };
        a.sentiment_score.score = score;
        a.first_call_resolution = Some(resolved);
        a
    }

    fn recording(duration: f64, analysis: Option<CallAnalysis>) -> CallRecording {
        let mut r = CallRecording::new("file:///call.wav", duration)
            .with_created_at(Utc.with_ymd_and_hms(2026, 10, 12, 9, 0, 0).unwrap());
        r.analysis = analysis;
        r
    }

    #[test]
    fn test_zero_talk_time_excluded_from_average() {
        let recordings = vec![
            recording(100.0, Some(analysis(40.0, 60.0, 0.8, true))),
            recording(100.0, Some(analysis(20.0, 80.0, 0.4, false))),
            recording(10.0, Some(analysis(0.0, 10.0, 0.5, false))),
        ];
        let metrics = aggregate(&recordings);

        assert_eq!(metrics.total_calls, 3);
        assert_eq!(metrics.avg_agent_talk_sec, 30.0);
        assert_eq!(metrics.avg_customer_talk_sec, 50.0);
        assert!((metrics.first_call_resolution_rate - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_unanalyzed_calls() {
        let recordings = vec![
            recording(45.0, None),
            recording(130.0, Some(analysis(30.0, 30.0, 0.6, true))),
        ];
        let metrics = aggregate(&recordings);

        assert_eq!(metrics.analyzed_calls, 1);
        assert_eq!(metrics.avg_agent_talk_sec, 30.0);
        assert_eq!(metrics.first_call_resolution_rate, 0.5);
        assert_eq!(metrics.duration_buckets.from_30_to_50s, 1);
        assert_eq!(metrics.duration_buckets.over_120s, 1);
    }

    #[test]
    fn test_empty_input() {
        let metrics = aggregate(&[]);
        assert_eq!(metrics, AggregateMetrics::default());
    }

    #[test]
    fn test_talk_time_correlation_dead_band() {
        let recordings = vec![
            // 70/30: agent dominant
            recording(60.0, Some(analysis(70.0, 30.0, 0.9, true))),
            // 54/46: inside the dead band
            recording(60.0, Some(analysis(54.0, 46.0, 0.5, true))),
            // 25/75: customer dominant
            recording(60.0, Some(analysis(25.0, 75.0, 0.2, false))),
            recording(60.0, Some(analysis(20.0, 80.0, 0.4, false))),
        ];
        let correlation = aggregate(&recordings).talk_time_sentiment;

        assert_eq!(correlation.agent_dominant.calls, 1);
        assert_eq!(correlation.agent_dominant.avg_sentiment_score, 0.9);
        assert_eq!(correlation.balanced.calls, 1);
        assert_eq!(correlation.customer_dominant.calls, 2);
        assert!((correlation.customer_dominant.avg_sentiment_score - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_group_keys() {
        let tagged = recording(40.0, Some(analysis(10.0, 10.0, 0.8, true))).with_metadata(
            RecordingMetadata {
                language: Some("Spanish".to_string()),
                department: Some("Billing".to_string()),
                agent: Some("Dana".to_string()),
                status: None,
            },
        );
        let detected = recording(80.0, Some(analysis(10.0, 10.0, 0.4, false)));
        let bare = recording(20.0, None);
        let metrics = aggregate(&[tagged, detected, bare]);

        assert_eq!(metrics.by_language["Spanish"].calls, 1);
        assert_eq!(metrics.by_language["English"].calls, 1);
        assert_eq!(metrics.by_language["Unknown"].calls, 1);
        assert_eq!(metrics.by_department["Billing"].calls, 1);
        assert_eq!(metrics.by_department["Unassigned"].calls, 2);
        assert_eq!(metrics.by_agent["Dana"].first_call_resolution_rate, 1.0);

        let unknown = &metrics.by_agent["Unknown"];
        assert_eq!(unknown.calls, 2);
        assert_eq!(unknown.analyzed_calls, 1);
        assert_eq!(unknown.avg_sentiment_score, 0.4);
        assert_eq!(unknown.avg_duration_sec, 50.0);
    }

    #[test]
    fn test_iso_week_key() {
        // 2027-01-01 falls in ISO week 53 of 2026
        let r = recording(10.0, None)
            .with_created_at(Utc.with_ymd_and_hms(2027, 1, 1, 12, 0, 0).unwrap());
        let metrics = aggregate(&[r]);
        assert!(metrics.by_week.contains_key("2026-W53"));

        let metrics = aggregate(&[recording(10.0, None)]);
        assert!(metrics.by_week.contains_key("2026-W42"));
    }
}
