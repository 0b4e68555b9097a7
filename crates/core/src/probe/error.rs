//! Error types for the probe module.
//!
//! These never escape [`MediaProbe::probe`](super::MediaProbe::probe); they are
//! logged as "probe degraded" diagnostics and the descriptor falls back to
//! unknown.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a probe could not inspect a file.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// FFprobe ran but reported failure.
    #[error("ffprobe exited with code {code:?}: {stderr}")]
    ToolFailed { code: Option<i32>, stderr: String },

    /// FFprobe did not finish in time.
    #[error("ffprobe timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Output was not the JSON document we asked for.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// I/O error while running ffprobe.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Creates a new parse error.
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Self::ParseError {
            reason: reason.into(),
        }
    }
}
