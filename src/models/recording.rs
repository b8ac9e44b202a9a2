use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CallAnalysis;

/// Caller-owned descriptive fields attached to a recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A recorded call
///
/// Owned by the caller. The analysis pipeline only ever replaces `analysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecording {
    pub id: String,
    pub audio_url: String,
    /// Call length in seconds
    pub duration: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub analysis: Option<CallAnalysis>,
    #[serde(default)]
    pub metadata: Option<RecordingMetadata>,
}

impl CallRecording {
    pub fn new(audio_url: impl Into<String>, duration: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            audio_url: audio_url.into(),
            duration,
            created_at: Utc::now(),
            transcript: None,
            analysis: None,
            metadata: None,
        }
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    pub fn with_metadata(mut self, metadata: RecordingMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_analysis(mut self, analysis: CallAnalysis) -> Self {
        self.analysis = Some(analysis);
        self
    }

    /// Swap in a freshly built analysis, returning the previous one
    pub fn replace_analysis(&mut self, analysis: CallAnalysis) -> Option<CallAnalysis> {
        self.analysis.replace(analysis)
    }

    pub fn is_analyzed(&self) -> bool {
        self.analysis.is_some()
    }
}
