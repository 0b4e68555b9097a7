//! Probe result types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::container::kind_for_extension;

/// Broad classification of a media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    Subtitle,
    Unknown,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a probe learned about an input file.
///
/// Built once per invocation and never mutated afterwards. A file that could
/// not be inspected still gets a descriptor: `kind` is [`MediaKind::Unknown`]
/// and only `path` and `size_bytes` carry information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Absolute path to the file.
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Lowercase file extension, empty when the file has none.
    pub container: String,
    /// ffprobe codec name of the first video stream.
    pub video_codec: Option<String>,
    /// ffprobe codec name of the first audio stream.
    pub audio_codec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Zero when unknown.
    pub duration_secs: f64,
    pub bitrate_bps: u64,
    pub size_bytes: u64,
}

impl MediaDescriptor {
    /// A descriptor for a file that could not be inspected.
    pub fn unknown(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let container = extension_of(&path);
        Self {
            path,
            kind: MediaKind::Unknown,
            container,
            video_codec: None,
            audio_codec: None,
            width: None,
            height: None,
            duration_secs: 0.0,
            bitrate_bps: 0,
            size_bytes,
        }
    }

    /// Kind implied by the file extension alone.
    pub fn kind_from_path(path: &Path) -> MediaKind {
        kind_for_extension(&extension_of(path))
    }

    pub fn has_video(&self) -> bool {
        self.kind == MediaKind::Video && self.video_codec.is_some()
    }

    pub fn is_unknown(&self) -> bool {
        self.kind == MediaKind::Unknown
    }

    /// One line description for console output.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("type: {}", self.kind),
            format!(
                "container: {}",
                if self.container.is_empty() {
                    "-"
                } else {
                    &self.container
                }
            ),
        ];

        if let Some(codec) = &self.video_codec {
            parts.push(format!("video: {}", codec));
        }
        if let Some(codec) = &self.audio_codec {
            parts.push(format!("audio: {}", codec));
        }
        if let (Some(w), Some(h)) = (self.width, self.height) {
            parts.push(format!("resolution: {}x{}", w, h));
        }
        if self.duration_secs > 0.0 {
            parts.push(format!("duration: {}", format_duration(self.duration_secs)));
        }
        parts.push(format!("size: {}", format_size(self.size_bytes)));

        parts.join(", ")
    }
}

/// Lowercase extension of a path, empty if there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Formats seconds as `H:MM:SS`, or `MM:SS` below one hour.
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

/// Formats a byte count in MB, or GB from 1024 MB upwards.
pub fn format_size(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb >= 1024.0 {
        format!("{:.2} GB", mb / 1024.0)
    } else {
        format!("{:.2} MB", mb)
    }
}
