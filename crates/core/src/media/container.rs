//! Output containers and their codec policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::codec::{AudioCodec, VideoCodec};
use super::types::MediaKind;

/// Output container, closed over the formats the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    /// MPEG-4 (.mp4)
    Mp4,
    /// Matroska (.mkv)
    Mkv,
    /// QuickTime (.mov)
    Mov,
    /// WebM (.webm)
    Webm,
    /// AVI (.avi)
    Avi,
    /// MP3 audio (.mp3)
    Mp3,
    /// Raw AAC audio (.aac)
    Aac,
    /// FLAC (.flac)
    Flac,
    /// WAV audio (.wav)
    Wav,
    /// Ogg Vorbis (.ogg)
    Ogg,
    /// MPEG-4 audio (.m4a)
    M4a,
}

/// Which video codec a container prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPolicy {
    /// Keep the caller-wide default.
    Default,
    /// Use this codec unless overridden.
    Prefer(VideoCodec),
    /// Container carries no video.
    Drop,
}

/// Which audio codec a container prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioPolicy {
    Default,
    Prefer(AudioCodec),
}

impl Container {
    pub const ALL: [Container; 11] = [
        Self::Mp4,
        Self::Mkv,
        Self::Mov,
        Self::Webm,
        Self::Avi,
        Self::Mp3,
        Self::Aac,
        Self::Flac,
        Self::Wav,
        Self::Ogg,
        Self::M4a,
    ];

    /// File extension (also the container id).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
            Self::Mov => "mov",
            Self::Webm => "webm",
            Self::Avi => "avi",
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::M4a => "m4a",
        }
    }

    /// Human readable name.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Mp4 => "MPEG-4",
            Self::Mkv => "Matroska",
            Self::Mov => "QuickTime",
            Self::Webm => "WebM",
            Self::Avi => "AVI",
            Self::Mp3 => "MP3 Audio",
            Self::Aac => "AAC Audio",
            Self::Flac => "FLAC",
            Self::Wav => "WAV Audio",
            Self::Ogg => "Ogg Vorbis",
            Self::M4a => "MPEG-4 Audio",
        }
    }

    pub fn is_audio_only(&self) -> bool {
        matches!(
            self,
            Self::Mp3 | Self::Aac | Self::Flac | Self::Wav | Self::Ogg | Self::M4a
        )
    }

    /// Whether streams can be copied into this container without re-encoding.
    pub fn supports_stream_copy(&self) -> bool {
        !self.is_audio_only()
    }

    /// Per-container codec policy.
    pub fn policy(&self) -> (VideoPolicy, AudioPolicy) {
        use AudioPolicy as A;
        use VideoPolicy as V;

        match self {
            Self::Mp4 => (V::Prefer(VideoCodec::H264), A::Prefer(AudioCodec::Aac)),
            Self::Mkv => (V::Prefer(VideoCodec::H264), A::Default),
            Self::Mov => (V::Prefer(VideoCodec::Prores), A::Default),
            Self::Webm => (V::Prefer(VideoCodec::Vp9), A::Prefer(AudioCodec::Opus)),
            Self::Avi => (V::Default, A::Default),
            Self::Mp3 => (V::Drop, A::Prefer(AudioCodec::Mp3)),
            Self::Aac => (V::Drop, A::Prefer(AudioCodec::Aac)),
            Self::Flac => (V::Drop, A::Prefer(AudioCodec::Flac)),
            Self::Wav => (V::Drop, A::Prefer(AudioCodec::PcmS16le)),
            Self::Ogg => (V::Drop, A::Prefer(AudioCodec::Vorbis)),
            Self::M4a => (V::Drop, A::Prefer(AudioCodec::Aac)),
        }
    }

    /// Every extension the engine treats as a media artifact.
    pub fn known_extensions() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|c| c.extension())
    }
}

impl FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.extension() == id)
            .ok_or(id)
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Classifies a lowercase file extension.
pub fn kind_for_extension(ext: &str) -> MediaKind {
    match ext.parse::<Container>() {
        Ok(c) if c.is_audio_only() => MediaKind::Audio,
        Ok(_) => MediaKind::Video,
        Err(_) => match ext {
            "srt" | "sub" | "vtt" => MediaKind::Subtitle,
            _ => MediaKind::Unknown,
        },
    }
}
