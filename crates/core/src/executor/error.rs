//! Error types for the executor module.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::job::JobStatus;

/// Why a running job was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller cancelled.
    Requested,
    /// `executor.timeout_secs` elapsed.
    TimedOut,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("cancelled by request"),
            Self::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Errors that can occur while executing a job.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Job was not in the pending state.
    #[error("Job is {status}, only pending jobs can be executed")]
    NotPending { status: JobStatus },

    /// Output path appeared after the job was built.
    #[error("Output file already exists: {path}")]
    OutputExists { path: PathBuf },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// FFmpeg could not be started.
    #[error("Failed to start {program}: {reason}")]
    SpawnFailed { program: PathBuf, reason: String },

    /// FFmpeg exited with a failure status.
    #[error("FFmpeg {}", describe_exit(.code))]
    ExitedNonZero { code: Option<i32>, detail: String },

    /// FFmpeg reported success but no output file can be found.
    #[error("FFmpeg finished but produced no output at {expected}")]
    OutputArtifactMissing { expected: PathBuf, detail: String },

    /// Job was stopped before finishing.
    #[error("Conversion {reason}")]
    Cancelled { reason: CancelReason, detail: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

impl ExecutionError {
    /// A stop with no captured tool output.
    pub fn cancelled(reason: CancelReason) -> Self {
        Self::Cancelled {
            reason,
            detail: String::new(),
        }
    }

    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotPending { .. } => "not_pending",
            Self::OutputExists { .. } => "output_exists",
            Self::OutputDirectoryFailed { .. } => "output_directory_failed",
            Self::SpawnFailed { .. } => "spawn_failed",
            Self::ExitedNonZero { .. } => "exited_non_zero",
            Self::OutputArtifactMissing { .. } => "output_artifact_missing",
            Self::Cancelled {
                reason: CancelReason::Requested,
                ..
            } => "cancelled",
            Self::Cancelled {
                reason: CancelReason::TimedOut,
                ..
            } => "timed_out",
            Self::Io(_) => "io",
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Cancelled {
                reason: CancelReason::TimedOut,
                ..
            } | Self::Io(_)
        )
    }

    /// Whether the caller asked for this stop.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::Cancelled {
                reason: CancelReason::Requested,
                ..
            }
        )
    }

    /// Text stored in the job's `error_detail`: the message followed by the
    /// tool's trailing output, when any was captured.
    pub fn detail(&self) -> String {
        match self {
            Self::ExitedNonZero { detail, .. }
            | Self::OutputArtifactMissing { detail, .. }
            | Self::Cancelled { detail, .. }
                if !detail.is_empty() =>
            {
                format!("{}\n{}", self, detail)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ExecutionError::cancelled(CancelReason::TimedOut).is_retryable());
        assert!(!ExecutionError::cancelled(CancelReason::Requested).is_retryable());
        assert!(!ExecutionError::ExitedNonZero {
            code: Some(1),
            detail: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_detail_includes_tool_output() {
        let err = ExecutionError::ExitedNonZero {
            code: Some(1),
            detail: "Unknown encoder 'libfoo'".to_string(),
        };
        assert_eq!(
            err.detail(),
            "FFmpeg exited with code 1\nUnknown encoder 'libfoo'"
        );
        assert_eq!(err.kind(), "exited_non_zero");
    }

    #[test]
    fn test_signal_exit_message() {
        let err = ExecutionError::ExitedNonZero {
            code: None,
            detail: String::new(),
        };
        assert_eq!(err.to_string(), "FFmpeg was terminated by a signal");
        assert_eq!(err.detail(), "FFmpeg was terminated by a signal");
    }

    #[test]
    fn test_stop_detail_carries_tool_output() {
        let err = ExecutionError::Cancelled {
            reason: CancelReason::TimedOut,
            detail: "frame=  120 fps= 30".to_string(),
        };
        assert_eq!(err.detail(), "Conversion timed out\nframe=  120 fps= 30");
        assert_eq!(err.kind(), "timed_out");
        assert_eq!(
            ExecutionError::cancelled(CancelReason::Requested).detail(),
            "Conversion cancelled by request"
        );
    }
}
