use async_trait::async_trait;

use crate::error::Result;

/// Text-generation backend used for call analysis.
///
/// This is the pipeline's only suspension point. Implementations return the raw reply;
/// everything downstream of it is pure. Errors are reserved for infrastructure failures
/// such as transport errors or timeouts, and are never retried internally.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Backend that always replies with nothing, yielding a heuristics-only analysis
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

#[async_trait]
impl Generator for OfflineGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(String::new())
    }
}

/// Backend that replies with fixed text, for replaying stored responses
#[derive(Debug, Clone, Default)]
pub struct CannedGenerator {
    pub reply: String,
}

impl CannedGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}
