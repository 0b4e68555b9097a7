//! Progress parsing.
//!
//! Tool output is read line by line. A [`ProgressParser`] classifies each
//! line into a [`ProgressEvent`]; the [`ProgressTracker`] folds events into a
//! non-decreasing percentage with an ETA.
//!
//! Besides ffmpeg's own `time=`/`out_time=` markers the default parser knows
//! the stage lines emitted by download-and-postprocess wrappers (`[Merger]`,
//! `[ExtractAudio]`, `[Fixup...]`), which report stage changes instead of
//! continuous time.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::PathBuf;
use std::time::Instant;

use super::types::ProgressUpdate;
use crate::job::JobId;
use crate::media::format_duration;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:out_)?time=(\d+):(\d{1,2}):(\d{1,2}(?:\.\d+)?)").unwrap());

static SPEED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"speed=\s*(\d+(?:\.\d+)?)x").unwrap());

static KEY_VALUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_]+=").unwrap());

static MERGE_TARGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"Merging formats into "(.+)""#).unwrap());

static DESTINATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Destination:\s*(.+)$").unwrap());

/// What a single line of tool output means.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Media time processed so far.
    Elapsed { secs: f64, speed: Option<String> },
    /// Encoding speed, e.g. `1.5x`.
    Speed(String),
    /// A stage transition with a minimum percentage.
    Stage {
        floor: f64,
        label: &'static str,
        path: Option<PathBuf>,
    },
    /// The tool reports the output at a different path.
    Destination(PathBuf),
    /// The output already existed and the tool skipped the work.
    AlreadyDone,
    /// Anything else, shown to the user verbatim.
    Status(String),
    /// Noise.
    Ignore,
}

/// Classifies tool output lines.
pub trait ProgressParser: Send + Sync {
    fn parse_line(&self, line: &str) -> ProgressEvent;
}

struct StageMarker {
    needle: &'static str,
    floor: f64,
    label: &'static str,
}

const STAGE_MARKERS: &[StageMarker] = &[
    StageMarker {
        needle: "[ExtractAudio]",
        floor: 95.0,
        label: "extracting audio",
    },
    StageMarker {
        needle: "[Merger]",
        floor: 98.0,
        label: "merging formats",
    },
    StageMarker {
        needle: "Merging formats into",
        floor: 98.0,
        label: "merging formats",
    },
    StageMarker {
        needle: "[Fixup",
        floor: 99.0,
        label: "fixing up container",
    },
    StageMarker {
        needle: "Deleting original file",
        floor: 99.0,
        label: "cleaning up",
    },
];

const ALREADY_DONE_MARKERS: &[&str] = &["has already been downloaded", "already exists, skipping"];

/// Parser for ffmpeg `-progress` output, stats lines and wrapper stage lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegProgressParser;

impl ProgressParser for FfmpegProgressParser {
    fn parse_line(&self, line: &str) -> ProgressEvent {
        let line = line.trim();
        if line.is_empty() {
            return ProgressEvent::Ignore;
        }

        if let Some(caps) = TIME_RE.captures(line) {
            let hours: f64 = caps[1].parse().unwrap_or(0.0);
            let minutes: f64 = caps[2].parse().unwrap_or(0.0);
            let seconds: f64 = caps[3].parse().unwrap_or(0.0);
            return ProgressEvent::Elapsed {
                secs: hours * 3600.0 + minutes * 60.0 + seconds,
                speed: speed_of(line),
            };
        }

        if line == "progress=end" {
            return ProgressEvent::Stage {
                floor: 99.0,
                label: "finishing",
                path: None,
            };
        }

        if ALREADY_DONE_MARKERS.iter().any(|m| line.contains(m)) {
            return ProgressEvent::AlreadyDone;
        }

        if let Some(marker) = STAGE_MARKERS.iter().find(|m| line.contains(m.needle)) {
            let path = MERGE_TARGET_RE
                .captures(line)
                .or_else(|| DESTINATION_RE.captures(line))
                .map(|c| PathBuf::from(c[1].trim()));
            return ProgressEvent::Stage {
                floor: marker.floor,
                label: marker.label,
                path,
            };
        }

        if let Some(caps) = DESTINATION_RE.captures(line) {
            return ProgressEvent::Destination(PathBuf::from(caps[1].trim()));
        }

        if let Some(speed) = speed_of(line) {
            return ProgressEvent::Speed(speed);
        }

        if KEY_VALUE_RE.is_match(line) {
            return ProgressEvent::Ignore;
        }

        ProgressEvent::Status(line.to_string())
    }
}

fn speed_of(line: &str) -> Option<String> {
    SPEED_RE.captures(line).map(|c| format!("{}x", &c[1]))
}

/// Percentage of `total_secs` covered by `elapsed_secs`, clamped to 0..=100.
///
/// # Panics
///
/// If `total_secs` is not positive. Callers substitute a placeholder for
/// unknown durations before getting here.
pub fn percent_of(elapsed_secs: f64, total_secs: f64) -> f64 {
    assert!(
        total_secs > 0.0,
        "progress total must be positive, got {}",
        total_secs
    );
    (elapsed_secs / total_secs * 100.0).clamp(0.0, 100.0)
}

/// Folds progress events into updates for one job.
#[derive(Debug)]
pub struct ProgressTracker {
    job_id: JobId,
    total_secs: f64,
    percent: f64,
    speed: Option<String>,
    reported_path: Option<PathBuf>,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(job_id: JobId, total_secs: f64) -> Self {
        Self {
            job_id,
            total_secs,
            percent: 0.0,
            speed: None,
            reported_path: None,
            started: Instant::now(),
        }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Output path announced by the tool, if it differs from the planned one.
    pub fn reported_path(&self) -> Option<&PathBuf> {
        self.reported_path.as_ref()
    }

    /// Applies an event, returning the update to report, if any.
    pub fn apply(&mut self, event: ProgressEvent) -> Option<ProgressUpdate> {
        match event {
            ProgressEvent::Elapsed { secs, speed } => {
                if speed.is_some() {
                    self.speed = speed;
                }
                self.raise(percent_of(secs, self.total_secs));
                let mut status = format!(
                    "{} / {}",
                    format_duration(secs),
                    format_duration(self.total_secs)
                );
                if let Some(speed) = &self.speed {
                    status.push_str(&format!(" at {}", speed));
                }
                Some(self.update(status))
            }
            ProgressEvent::Speed(speed) => {
                self.speed = Some(speed);
                None
            }
            ProgressEvent::Stage { floor, label, path } => {
                if path.is_some() {
                    self.reported_path = path;
                }
                self.raise(floor);
                Some(self.update(label.to_string()))
            }
            ProgressEvent::Destination(path) => {
                let status = format!("writing {}", path.display());
                self.reported_path = Some(path);
                Some(self.update(status))
            }
            ProgressEvent::AlreadyDone => {
                self.raise(100.0);
                Some(self.update("already done".to_string()))
            }
            ProgressEvent::Status(line) => Some(self.update(line)),
            ProgressEvent::Ignore => None,
        }
    }

    /// Final update once the job completed.
    pub fn finish(&mut self) -> ProgressUpdate {
        self.percent = 100.0;
        self.update("completed".to_string())
    }

    fn raise(&mut self, percent: f64) {
        self.percent = self.percent.max(percent);
    }

    fn update(&self, status: String) -> ProgressUpdate {
        ProgressUpdate {
            job_id: self.job_id,
            percent: self.percent,
            status,
            eta_secs: self.eta_secs(),
        }
    }

    fn eta_secs(&self) -> Option<f64> {
        if self.percent >= 100.0 {
            return Some(0.0);
        }
        if self.percent <= 0.0 {
            return None;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        Some(elapsed * (100.0 - self.percent) / self.percent)
    }
}
