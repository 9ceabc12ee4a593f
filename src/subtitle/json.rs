//! Enriched JSON result writing.

use crate::transcription::types::TranscriptionOutput;
use std::path::Path;
use thiserror::Error;

/// Errors from JSON result writing
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write json result: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize result: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write the full result (segments plus language metadata) pretty-printed.
///
/// # Errors
/// Returns error on serialization or write failure.
pub fn write_result(path: &Path, output: &TranscriptionOutput) -> Result<(), WriteError> {
    let rendered = serde_json::to_string_pretty(output)?;
    std::fs::write(path, rendered)?;
    Ok(())
}
