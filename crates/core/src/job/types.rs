//! Conversion job record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::media::{Container, MediaDescriptor};
use crate::settings::EncodeSettings;

/// Unique identifier for a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the output is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    /// Re-encode streams.
    Transcode,
    /// Copy streams into a new container.
    Remux,
    /// Drop video and encode the audio stream only.
    ExtractAudio,
}

impl JobMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcode => "transcode",
            Self::Remux => "remux",
            Self::ExtractAudio => "extract_audio",
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a job.
///
/// `Pending -> Running -> {Completed | Failed}`, with `Pending -> Failed` for
/// failures before the subprocess starts. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully specified conversion, ready to hand to an executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    pub id: JobId,
    pub input: MediaDescriptor,
    /// Where the output will be written. Never existed when the job was built.
    pub output_path: PathBuf,
    pub output_container: Container,
    pub settings: EncodeSettings,
    pub trim_start: Option<f64>,
    pub trim_end: Option<f64>,
    pub mode: JobMode,
    pub status: JobStatus,
    /// Last reported progress, 0..=100.
    pub progress_percent: f64,
    pub error_detail: Option<String>,
    /// Set when the builder picked an alternate output path.
    pub overwrite: bool,
    /// File actually produced, once completed. Usually `output_path`.
    pub artifact_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ConversionJob {
    /// Creates a pending job.
    pub fn new(
        input: MediaDescriptor,
        output_path: PathBuf,
        output_container: Container,
        settings: EncodeSettings,
        mode: JobMode,
    ) -> Self {
        Self {
            id: JobId::new(),
            input,
            output_path,
            output_container,
            settings,
            trim_start: None,
            trim_end: None,
            mode,
            status: JobStatus::Pending,
            progress_percent: 0.0,
            error_detail: None,
            overwrite: false,
            artifact_path: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn with_trim(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        self.trim_start = start;
        self.trim_end = end;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == JobStatus::Pending
    }

    /// Seconds of media the job will produce, used as the progress denominator.
    ///
    /// Falls back to `placeholder_secs` when the length is unknown or not
    /// positive, so the result is always > 0.
    pub fn total_duration_secs(&self, placeholder_secs: f64) -> f64 {
        let duration = self.input.duration_secs;
        let total = match (self.trim_start, self.trim_end) {
            (Some(start), Some(end)) => end - start,
            (Some(start), None) if duration > 0.0 => duration - start,
            (None, Some(end)) => end,
            _ => duration,
        };

        if total.is_finite() && total > 0.0 {
            total
        } else {
            placeholder_secs
        }
    }

    /// `Pending -> Running`. Returns false if the job was not pending.
    pub fn mark_running(&mut self) -> bool {
        if self.status != JobStatus::Pending {
            return false;
        }
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
        true
    }

    /// `Running -> Completed`. Forces progress to 100.
    pub fn mark_completed(&mut self, artifact_path: PathBuf) -> bool {
        if self.status != JobStatus::Running {
            return false;
        }
        self.status = JobStatus::Completed;
        self.progress_percent = 100.0;
        self.artifact_path = Some(artifact_path);
        self.finished_at = Some(Utc::now());
        true
    }

    /// `{Pending | Running} -> Failed`.
    pub fn mark_failed(&mut self, detail: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.error_detail = Some(detail.into());
        self.finished_at = Some(Utc::now());
        true
    }

    /// Records progress, never moving backwards. Ignored once terminal.
    pub fn record_progress(&mut self, percent: f64) {
        if self.status.is_terminal() {
            return;
        }
        self.progress_percent = self.progress_percent.max(percent.clamp(0.0, 100.0));
    }
}
