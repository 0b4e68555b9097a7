//! Error types for job building.

use std::path::PathBuf;
use thiserror::Error;

use crate::settings::SettingsError;

/// Errors that prevent a job from being built. None of these ever spawn a
/// subprocess.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Input file does not exist.
    #[error("Input file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Output container id is not one we can produce.
    #[error("Unsupported output container: {container}")]
    UnsupportedContainer { container: String },

    /// Probe could not classify the input and `force` was not given.
    #[error("Could not identify media in {path} (use force to convert anyway)")]
    UnknownInput { path: PathBuf },

    /// Trim bounds are inconsistent with each other or the input.
    #[error("Invalid trim range: {reason}")]
    InvalidRange { reason: String },

    /// Settings could not be resolved.
    #[error(transparent)]
    InvalidConfig(#[from] SettingsError),
}

impl BuildError {
    /// Creates a new invalid range error.
    pub fn invalid_range(reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            reason: reason.into(),
        }
    }

    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "file_not_found",
            Self::UnsupportedContainer { .. } => "unsupported_container",
            Self::UnknownInput { .. } => "unknown_input",
            Self::InvalidRange { .. } => "invalid_range",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}
