//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the ffprobe and ffmpeg seams so job building and batch
//! runs can be exercised without the tools installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediaconv_core::testing::{fixtures, MockExecutor, MockProbe};
//!
//! let probe = MockProbe::new();
//! probe.set_descriptor("/in/clip.mp4", fixtures::h264_aac_mp4("/in/clip.mp4")).await;
//!
//! let executor = MockExecutor::new();
//! executor.push_error(ExecutionError::cancelled(CancelReason::TimedOut)).await;
//! ```

mod mock_executor;
mod mock_probe;
mod recording_sink;

pub use mock_executor::MockExecutor;
pub use mock_probe::MockProbe;
pub use recording_sink::RecordingSink;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::job::{ConversionJob, JobMode};
    use crate::media::{extension_of, Container, MediaDescriptor, MediaKind};
    use crate::settings::EncodeSettings;

    /// A two minute 1080p H.264/AAC MP4.
    pub fn h264_aac_mp4(path: impl Into<PathBuf>) -> MediaDescriptor {
        let path = path.into();
        MediaDescriptor {
            container: extension_of(&path),
            path,
            kind: MediaKind::Video,
            video_codec: Some("h264".to_string()),
            audio_codec: Some("aac".to_string()),
            width: Some(1920),
            height: Some(1080),
            duration_secs: 120.0,
            bitrate_bps: 4_000_000,
            size_bytes: 60 * 1024 * 1024, // 60 MB
        }
    }

    /// An audio-only file with a single stream of `codec`.
    pub fn audio_file(path: impl Into<PathBuf>, codec: &str, duration_secs: f64) -> MediaDescriptor {
        let path = path.into();
        MediaDescriptor {
            container: extension_of(&path),
            path,
            kind: MediaKind::Audio,
            video_codec: None,
            audio_codec: Some(codec.to_string()),
            width: None,
            height: None,
            duration_secs,
            bitrate_bps: 320_000,
            size_bytes: (duration_secs * 40_000.0) as u64,
        }
    }

    /// A pending transcode of an H.264/AAC MP4 with every setting left to
    /// the tool. The container follows the output extension.
    pub fn pending_job(input: impl Into<PathBuf>, output: impl AsRef<Path>) -> ConversionJob {
        let output = output.as_ref();
        let container = extension_of(output)
            .parse::<Container>()
            .unwrap_or(Container::Mkv);

        ConversionJob::new(
            h264_aac_mp4(input),
            output.to_path_buf(),
            container,
            EncodeSettings::default(),
            JobMode::Transcode,
        )
    }
}
