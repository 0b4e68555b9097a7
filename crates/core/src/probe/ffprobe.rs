//! FFprobe-based probe implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::error::ProbeError;
use super::MediaProbe;
use crate::config::ToolsConfig;
use crate::media::{extension_of, kind_for_extension, MediaDescriptor, MediaKind};
use crate::metrics;

/// Probe backed by the `ffprobe` binary.
pub struct FfprobeProbe {
    config: ToolsConfig,
}

impl FfprobeProbe {
    /// Creates a new probe with the given tool configuration.
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    /// Creates a probe with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ToolsConfig::default())
    }

    /// Checks that ffprobe can be run.
    pub async fn validate(&self) -> Result<(), ProbeError> {
        let output = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ProbeError::ToolNotFound {
                    path: self.config.ffprobe_path.clone(),
                },
                _ => ProbeError::Io(e),
            })?;

        if !output.status.success() {
            return Err(ProbeError::ToolFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Runs ffprobe and parses its output, surfacing every failure.
    pub async fn try_probe(
        &self,
        path: &Path,
        size_bytes: u64,
    ) -> Result<MediaDescriptor, ProbeError> {
        let timeout_secs = self.config.probe_timeout_secs;

        let child = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout(Duration::from_secs(timeout_secs), child).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::ToolNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?,
            Err(_) => return Err(ProbeError::Timeout { timeout_secs }),
        };

        if !output.status.success() {
            return Err(ProbeError::ToolFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| ProbeError::parse_error("ffprobe output is not valid UTF-8"))?;
        Self::parse_probe_output(path, size_bytes, &stdout)
    }

    /// Parses ffprobe JSON output into a descriptor.
    ///
    /// `kind` comes from the file extension; stream details only fill in what
    /// the extension cannot tell.
    pub fn parse_probe_output(
        path: &Path,
        size_bytes: u64,
        output: &str,
    ) -> Result<MediaDescriptor, ProbeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            #[serde(default)]
            format: Option<ProbeFormat>,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
            bit_rate: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput = serde_json::from_str(output)
            .map_err(|e| ProbeError::parse_error(format!("Failed to parse ffprobe output: {}", e)))?;

        let format = probe.format.as_ref();
        let duration_secs = format
            .and_then(|f| f.duration.as_ref())
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(0.0);
        let bitrate_bps = format
            .and_then(|f| f.bit_rate.as_ref())
            .and_then(|b| b.parse::<u64>().ok())
            .unwrap_or(0);
        let size_bytes = if size_bytes > 0 {
            size_bytes
        } else {
            format
                .and_then(|f| f.size.as_ref())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0)
        };

        let stream_of = |kind: &str| {
            probe
                .streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some(kind))
        };
        let audio_stream = stream_of("audio");
        // Attached cover art shows up as a video stream in audio files
        let video_stream = stream_of("video");

        let container = extension_of(path);
        let kind = kind_for_extension(&container);
        let (video_codec, width, height) = match (kind, video_stream) {
            (MediaKind::Video, Some(s)) => (s.codec_name.clone(), s.width, s.height),
            _ => (None, None, None),
        };

        Ok(MediaDescriptor {
            path: path.to_path_buf(),
            kind,
            container,
            video_codec,
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
            width,
            height,
            duration_secs,
            bitrate_bps,
            size_bytes,
        })
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> MediaDescriptor {
        let size_bytes = tokio::fs::metadata(path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        if MediaDescriptor::kind_from_path(path) == MediaKind::Unknown {
            debug!(path = %path.display(), "Unrecognized extension, skipping ffprobe");
            metrics::PROBES.with_label_values(&["skipped"]).inc();
            return MediaDescriptor::unknown(path, size_bytes);
        }

        match self.try_probe(path, size_bytes).await {
            Ok(descriptor) => {
                debug!(
                    path = %path.display(),
                    kind = %descriptor.kind,
                    duration_secs = descriptor.duration_secs,
                    "Probed media file"
                );
                metrics::PROBES.with_label_values(&["ok"]).inc();
                descriptor
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Probe degraded, treating input as unknown");
                metrics::PROBES.with_label_values(&["degraded"]).inc();
                MediaDescriptor::unknown(path, size_bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_probe_output_video() {
        let json = r#"{
            "format": {
                "filename": "test.mkv",
                "format_name": "matroska,webm",
                "duration": "7200.0",
                "bit_rate": "5500000",
                "size": "5000000000"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "hevc",
                    "width": 1920,
                    "height": 1080
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac",
                    "channels": 6
                }
            ]
        }"#;

        let d = FfprobeProbe::parse_probe_output(Path::new("/m/test.mkv"), 0, json).unwrap();
        assert_eq!(d.kind, MediaKind::Video);
        assert_eq!(d.container, "mkv");
        assert_eq!(d.video_codec.as_deref(), Some("hevc"));
        assert_eq!(d.audio_codec.as_deref(), Some("aac"));
        assert_eq!((d.width, d.height), (Some(1920), Some(1080)));
        assert!((d.duration_secs - 7200.0).abs() < 0.01);
        assert_eq!(d.bitrate_bps, 5_500_000);
        assert_eq!(d.size_bytes, 5_000_000_000);
    }

    #[test]
    fn test_parse_probe_output_audio_ignores_cover_art() {
        let json = r#"{
            "format": { "duration": "180.5" },
            "streams": [
                { "codec_type": "audio", "codec_name": "mp3" },
                { "codec_type": "video", "codec_name": "mjpeg", "width": 500, "height": 500 }
            ]
        }"#;

        let d = FfprobeProbe::parse_probe_output(Path::new("/m/song.mp3"), 1234, json).unwrap();
        assert_eq!(d.kind, MediaKind::Audio);
        assert_eq!(d.audio_codec.as_deref(), Some("mp3"));
        assert!(d.video_codec.is_none());
        assert!(d.width.is_none());
        assert_eq!(d.size_bytes, 1234);
    }

    #[test]
    fn test_parse_probe_output_missing_fields() {
        let d = FfprobeProbe::parse_probe_output(Path::new("/m/x.mp4"), 10, "{}").unwrap();
        assert_eq!(d.kind, MediaKind::Video);
        assert_eq!(d.duration_secs, 0.0);
        assert_eq!(d.bitrate_bps, 0);
        assert!(d.video_codec.is_none());
    }

    #[test]
    fn test_parse_probe_output_garbled() {
        let result = FfprobeProbe::parse_probe_output(Path::new("/m/x.mp4"), 0, "not json {");
        assert!(matches!(result, Err(ProbeError::ParseError { .. })));
    }

    #[tokio::test]
    async fn test_missing_tool_degrades_to_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        std::fs::write(&input, b"not really a video").unwrap();

        let probe = FfprobeProbe::new(ToolsConfig::with_paths(
            PathBuf::from("ffmpeg"),
            dir.path().join("no-such-ffprobe"),
        ));

        let err = probe.try_probe(&input, 0).await.unwrap_err();
        assert!(matches!(err, ProbeError::ToolNotFound { .. }));
        assert!(matches!(
            probe.validate().await,
            Err(ProbeError::ToolNotFound { .. })
        ));

        let d = probe.probe(&input).await;
        assert!(d.is_unknown());
        assert_eq!(d.size_bytes, 18);
        assert!(d.video_codec.is_none());
    }

    #[tokio::test]
    async fn test_unrecognized_extension_skips_tool() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, b"hello").unwrap();

        let d = FfprobeProbe::with_defaults().probe(&input).await;
        assert_eq!(d.kind, MediaKind::Unknown);
        assert_eq!(d.size_bytes, 5);
        assert_eq!(d.path, input);
    }
}
