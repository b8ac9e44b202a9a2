use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Call counts per duration range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationBuckets {
    /// Shorter than 30s
    pub under_30s: usize,
    /// 30s up to (not including) 50s
    pub from_30_to_50s: usize,
    /// 50s up to (not including) 90s
    pub from_50_to_90s: usize,
    /// 90s to 120s inclusive
    pub from_90_to_120s: usize,
    /// Longer than 120s
    pub over_120s: usize,
}

impl DurationBuckets {
    pub fn record(&mut self, duration_secs: f64) {
        if duration_secs < 30.0 {
            self.under_30s += 1;
        } else if duration_secs < 50.0 {
            self.from_30_to_50s += 1;
        } else if duration_secs < 90.0 {
            self.from_50_to_90s += 1;
        } else if duration_secs <= 120.0 {
            self.from_90_to_120s += 1;
        } else {
            self.over_120s += 1;
        }
    }
}

/// Statistics for one group-by key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub calls: usize,
    pub analyzed_calls: usize,
    pub avg_sentiment_score: f64,
    pub first_call_resolution_rate: f64,
    pub avg_duration_sec: f64,
}

/// Statistics for one talk-time dominance bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStats {
    pub calls: usize,
    pub avg_sentiment_score: f64,
}

/// Sentiment grouped by who dominated the conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkTimeCorrelation {
    pub agent_dominant: BucketStats,
    pub customer_dominant: BucketStats,
    pub balanced: BucketStats,
}

/// Fleet-level statistics over a collection of recordings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    pub total_calls: usize,
    pub analyzed_calls: usize,
    pub avg_agent_talk_sec: f64,
    pub avg_customer_talk_sec: f64,
    pub first_call_resolution_rate: f64,
    pub duration_buckets: DurationBuckets,
    pub by_language: BTreeMap<String, GroupStats>,
    pub by_department: BTreeMap<String, GroupStats>,
    pub by_week: BTreeMap<String, GroupStats>,
    pub by_agent: BTreeMap<String, GroupStats>,
    pub talk_time_sentiment: TalkTimeCorrelation,
}
