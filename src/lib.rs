pub mod error;
pub mod heuristics;
pub mod io;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod rollup;
pub mod stages;

pub use error::{CallscopeError, Result};
pub use heuristics::Lexicon;
pub use io::{AnalysisReport, read_recordings_file, read_transcript_file, write_json};
pub use llm::{AnthropicClient, AnthropicConfig, Generator, OfflineGenerator};
pub use models::{AggregateMetrics, CallAnalysis, CallRecording, TranscriptMessage};
pub use rollup::{RollupConfig, aggregate, aggregate_with};
pub use stages::{Analyzer, EngineConfig, annotate_messages, resolve_analysis, segment};
