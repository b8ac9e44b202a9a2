use std::path::Path;

use crate::error::{CallscopeError, Result};
use crate::models::CallRecording;

/// Read a plain-text transcript file
pub fn read_transcript_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CallscopeError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a JSON array of recordings
pub fn read_recordings_file(path: &Path) -> Result<Vec<CallRecording>> {
    let content = read_transcript_file(path)?;
    parse_recordings_json(&content)
}

/// Parse a JSON array of recordings
pub fn parse_recordings_json(json: &str) -> Result<Vec<CallRecording>> {
    Ok(serde_json::from_str(json)?)
}
