//! Types for the executor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::job::JobId;

/// Result of a successful execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub job_id: JobId,
    /// File actually produced.
    pub output_path: PathBuf,
    pub size_bytes: u64,
    pub elapsed_secs: f64,
}

/// Progress update sent during execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub job_id: JobId,
    /// Progress percentage (0-100), non-decreasing within a job.
    pub percent: f64,
    /// Human readable status: tool output, stage name or speed.
    pub status: String,
    /// Estimated seconds remaining.
    pub eta_secs: Option<f64>,
}
