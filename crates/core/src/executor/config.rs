//! Configuration for the executor module.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for running ffmpeg jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Timeout for a single conversion job in seconds. 0 disables the timeout.
    #[serde(default)]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional ffmpeg arguments placed just before the output path.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,

    /// How much trailing tool output is kept for error details.
    #[serde(default = "default_max_error_detail_bytes")]
    pub max_error_detail_bytes: usize,

    /// Progress denominator used when the media length is unknown.
    #[serde(default = "default_unknown_duration")]
    pub unknown_duration_secs: f64,
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_max_error_detail_bytes() -> usize {
    4096
}

fn default_unknown_duration() -> f64 {
    60.0
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
            max_error_detail_bytes: default_max_error_detail_bytes(),
            unknown_duration_secs: default_unknown_duration(),
        }
    }
}

impl ExecutorConfig {
    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the placeholder duration for inputs of unknown length.
    pub fn with_unknown_duration(mut self, secs: f64) -> Self {
        self.unknown_duration_secs = secs;
        self
    }

    /// The configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.timeout_secs, 0);
        assert!(config.timeout().is_none());
        assert_eq!(config.ffmpeg_log_level, "warning");
        assert_eq!(config.max_error_detail_bytes, 4096);
        assert_eq!(config.unknown_duration_secs, 60.0);
    }

    #[test]
    fn test_config_builder() {
        let config = ExecutorConfig::default()
            .with_timeout(7200)
            .with_unknown_duration(30.0);
        assert_eq!(config.timeout(), Some(Duration::from_secs(7200)));
        assert_eq!(config.unknown_duration_secs, 30.0);
    }

    #[test]
    fn test_config_serialization() {
        let config = ExecutorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ExecutorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_error_detail_bytes, config.max_error_detail_bytes);
    }
}
