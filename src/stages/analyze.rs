use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{CallscopeError, Result};
use crate::heuristics::{Lexicon, message_sentiment};
use crate::llm::{Generator, build_analysis_prompt};
use crate::metrics::{TalkTime, message_loudness};
use crate::models::{CallAnalysis, CallRecording, TranscriptMessage};

use super::{EngineConfig, Resolution, resolve_analysis, segment};

/// Call analysis pipeline over a generation backend
///
/// Each analysis awaits the backend exactly once; everything else is synchronous text
/// processing. Backend failures propagate unchanged and are not retried.
pub struct Analyzer<G> {
    generator: G,
    config: EngineConfig,
}

impl<G: Generator> Analyzer<G> {
    pub fn new(generator: G) -> Self {
        Self::with_config(generator, EngineConfig::default())
    }

    pub fn with_config(generator: G, config: EngineConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze one transcript
    ///
    /// Returns an error only when the backend request itself fails.
    pub async fn analyze(
        &self,
        transcript: &str,
        messages: &[TranscriptMessage],
    ) -> Result<CallAnalysis> {
        Ok(self.analyze_detailed(transcript, messages).await?.analysis)
    }

    /// Analyze one transcript, keeping the per-field resolution report
    pub async fn analyze_detailed(
        &self,
        transcript: &str,
        messages: &[TranscriptMessage],
    ) -> Result<Resolution> {
        let segmented;
        let messages = if messages.is_empty() && !transcript.trim().is_empty() {
            segmented = segment(transcript);
            segmented.as_slice()
        } else {
            messages
        };

        let talk_time = TalkTime::from_messages(messages, self.config.default_message_secs);
        let prompt = build_analysis_prompt(transcript, messages, &talk_time);
        debug!(
            "Requesting analysis for {} messages ({} prompt chars)",
            messages.len(),
            prompt.len()
        );

        let reply = self.generator.generate(&prompt).await?;
        let resolution = resolve_analysis(transcript, messages, &reply, &self.config);

        info!(
            "Analysis complete: payload={:?}, sentiment={}, {} topics",
            resolution.report.payload,
            resolution.analysis.sentiment_score.overall.as_str(),
            resolution.analysis.topics.len()
        );
        Ok(resolution)
    }

    /// Re-analyze a recording and swap the result in
    ///
    /// The new analysis is built completely before it replaces the old one, so a failed
    /// request leaves the recording untouched. Concurrent re-analysis of the same
    /// recording is last-write-wins.
    pub async fn analyze_recording(&self, recording: &mut CallRecording) -> Result<()> {
        let transcript = recording.transcript.clone().unwrap_or_default();
        let messages = segment(&transcript);
        let analysis = self.analyze(&transcript, &messages).await?;
        recording.replace_analysis(analysis);
        Ok(())
    }
}

impl<G: Generator + 'static> Analyzer<G> {
    /// Analyze independent recordings in parallel
    ///
    /// At most `concurrency` backend requests are in flight. Results are returned in input
    /// order; a failure for one recording does not affect the others.
    pub async fn analyze_batch(
        self: Arc<Self>,
        recordings: Vec<CallRecording>,
        concurrency: usize,
    ) -> Vec<(CallRecording, Result<()>)> {
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let total = recordings.len();

        for (index, mut recording) in recordings.into_iter().enumerate() {
            let analyzer = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => analyzer.analyze_recording(&mut recording).await,
                    Err(e) => Err(CallscopeError::Task(e.to_string())),
                };
                (index, recording, result)
            });
        }

        let mut results: Vec<Option<(CallRecording, Result<()>)>> =
            (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, recording, result)) => {
                    if let Err(e) = &result {
                        warn!("Recording {} failed: {}", recording.id, e);
                    }
                    results[index] = Some((recording, result));
                }
                Err(e) => warn!("Analysis task panicked: {}", e),
            }
        }

        let done = results.iter().filter(|r| r.is_some()).count();
        info!("Batch complete: {} of {} recordings returned", done, total);
        results.into_iter().flatten().collect()
    }
}

/// Copies of the messages with keyword sentiment and loudness filled in
pub fn annotate_messages(
    messages: &[TranscriptMessage],
    lexicon: &Lexicon,
) -> Vec<TranscriptMessage> {
    messages
        .iter()
        .map(|msg| {
            let sentiment = message_sentiment(&msg.text, lexicon);
            TranscriptMessage {
                sentiment: Some(sentiment),
                loudness: Some(message_loudness(msg, sentiment)),
                ..msg.clone()
            }
        })
        .collect()
}
