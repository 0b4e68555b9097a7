//! Error types for settings resolution.

use thiserror::Error;

/// Errors raised while resolving encode settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A token or combination of tokens is not acceptable.
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },
}

impl SettingsError {
    /// Creates a new invalid config error.
    pub fn invalid_config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
