use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Infrastructure failures surfaced to the caller.
///
/// Malformed or incomplete backend content never shows up here: it is absorbed by the
/// resolver in [`crate::stages::resolve`].
#[derive(Error, Debug)]
pub enum CallscopeError {
    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("Generation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Analysis task failed: {0}")]
    Task(String),
}

impl CallscopeError {
    /// Whether a caller-side retry has a reasonable chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            CallscopeError::Timeout(_) => true,
            CallscopeError::Http(e) => e.is_timeout() || e.is_connect(),
            CallscopeError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CallscopeError>;
