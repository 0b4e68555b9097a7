//! Encoder availability detection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::media::{AudioCodec, VideoCodec};

/// Which of our encoders the installed ffmpeg provides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderCapabilities {
    /// Encoder names listed by `ffmpeg -encoders`.
    pub encoders: Vec<String>,
}

impl EncoderCapabilities {
    /// Detect available encoders by probing ffmpeg.
    ///
    /// Returns an empty set if ffmpeg cannot be run.
    pub async fn detect(ffmpeg_path: &Path) -> Self {
        let output = Command::new(ffmpeg_path)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        let stdout = match output {
            Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout).to_string(),
            _ => return Self::default(),
        };

        Self::parse(&stdout)
    }

    /// Parses `ffmpeg -encoders` output.
    ///
    /// Encoder lines look like ` V....D libx264  libx264 H.264 ...`: a flags
    /// column followed by the encoder name.
    pub fn parse(output: &str) -> Self {
        let encoders = output
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let flags = fields.next()?;
                let name = fields.next()?;
                let is_encoder_line = flags.len() == 6
                    && flags.starts_with(['V', 'A', 'S'])
                    && flags.chars().skip(1).all(|c| c == '.' || c.is_ascii_uppercase());
                (is_encoder_line && name != "=").then(|| name.to_string())
            })
            .collect();

        Self { encoders }
    }

    pub fn has_encoder(&self, name: &str) -> bool {
        self.encoders.iter().any(|e| e == name)
    }

    pub fn supports_video(&self, codec: VideoCodec) -> bool {
        self.has_encoder(codec.ffmpeg_encoder())
    }

    pub fn supports_audio(&self, codec: AudioCodec) -> bool {
        self.has_encoder(codec.ffmpeg_encoder())
    }

    /// Video codecs whose encoder is missing.
    pub fn missing_video(&self) -> Vec<VideoCodec> {
        VideoCodec::ALL
            .into_iter()
            .filter(|c| !self.supports_video(*c))
            .collect()
    }

    /// Audio codecs whose encoder is missing.
    pub fn missing_audio(&self) -> Vec<AudioCodec> {
        AudioCodec::ALL
            .into_iter()
            .filter(|c| !self.supports_audio(*c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Encoders:
 V..... = Video
 A..... = Audio
 S..... = Subtitle
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D aac                  AAC (Advanced Audio Coding)
 A....D libopus              libopus Opus (codec opus)
 A....D flac                 FLAC (Free Lossless Audio Codec)
";

    #[test]
    fn test_default_capabilities() {
        let caps = EncoderCapabilities::default();
        assert!(!caps.supports_video(VideoCodec::H264));
        assert_eq!(caps.missing_audio().len(), AudioCodec::ALL.len());
    }

    #[test]
    fn test_parse_encoders() {
        let caps = EncoderCapabilities::parse(SAMPLE);
        assert!(caps.supports_video(VideoCodec::H264));
        assert!(caps.supports_video(VideoCodec::Vp9));
        assert!(!caps.supports_video(VideoCodec::H265));
        assert!(caps.supports_audio(AudioCodec::Opus));
        assert!(!caps.has_encoder("="));
        assert!(!caps.has_encoder("Video"));
        assert_eq!(
            caps.missing_video(),
            vec![VideoCodec::H265, VideoCodec::Mpeg4, VideoCodec::Prores]
        );
    }

    #[tokio::test]
    async fn test_detect_missing_binary() {
        let caps = EncoderCapabilities::detect(Path::new("/nonexistent/ffmpeg")).await;
        assert!(caps.encoders.is_empty());
    }
}
