//! Codec and quality tokens.
//!
//! Every user-facing token is a closed enumeration. Parsing an out-of-set value
//! fails with [`TokenError`] instead of being clamped to the nearest valid one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A token string that is not part of its enumerated set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}', expected one of: {expected}")]
pub struct TokenError {
    /// Which token family was being parsed (e.g. "video codec").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Comma separated list of accepted values.
    pub expected: String,
}

impl TokenError {
    fn new(kind: &'static str, value: &str, expected: &[&str]) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: expected.join(", "),
        }
    }
}

/// Video codec choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,
    /// VP9
    Vp9,
    /// MPEG-4 Part 2
    Mpeg4,
    /// Apple ProRes (intra-frame, editing friendly)
    Prores,
}

impl VideoCodec {
    pub const ALL: [VideoCodec; 5] = [
        Self::H264,
        Self::H265,
        Self::Vp9,
        Self::Mpeg4,
        Self::Prores,
    ];

    /// Token used in configuration and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "h265",
            Self::Vp9 => "vp9",
            Self::Mpeg4 => "mpeg4",
            Self::Prores => "prores",
        }
    }

    /// Returns the ffmpeg encoder name for this codec.
    pub fn ffmpeg_encoder(&self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::Vp9 => "libvpx-vp9",
            Self::Mpeg4 => "mpeg4",
            Self::Prores => "prores_ks",
        }
    }

    /// Codec name as reported by ffprobe's `codec_name`.
    pub fn probe_name(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Vp9 => "vp9",
            Self::Mpeg4 => "mpeg4",
            Self::Prores => "prores",
        }
    }

    /// Whether a probed codec name denotes this codec.
    pub fn matches_probe_name(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(self.probe_name())
    }

    /// Whether the encoder is driven by a CRF quality value.
    pub fn takes_crf(&self) -> bool {
        matches!(self, Self::H264 | Self::H265)
    }

    /// Whether the encoder understands x264-style speed presets.
    pub fn takes_preset(&self) -> bool {
        matches!(self, Self::H264 | Self::H265)
    }
}

impl FromStr for VideoCodec {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h264" | "avc" => Ok(Self::H264),
            "h265" | "hevc" => Ok(Self::H265),
            "vp9" => Ok(Self::Vp9),
            "mpeg4" => Ok(Self::Mpeg4),
            "prores" => Ok(Self::Prores),
            _ => Err(TokenError::new(
                "video codec",
                s,
                &Self::ALL.map(|c| c.as_str()),
            )),
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio codec choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCodec {
    /// Advanced Audio Coding
    Aac,
    /// MPEG Audio Layer III
    Mp3,
    /// Opus
    Opus,
    /// Vorbis
    Vorbis,
    /// Free Lossless Audio Codec
    Flac,
    /// Uncompressed 16-bit PCM
    PcmS16le,
}

impl AudioCodec {
    pub const ALL: [AudioCodec; 6] = [
        Self::Aac,
        Self::Mp3,
        Self::Opus,
        Self::Vorbis,
        Self::Flac,
        Self::PcmS16le,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Vorbis => "vorbis",
            Self::Flac => "flac",
            Self::PcmS16le => "pcm_s16le",
        }
    }

    /// Returns the ffmpeg encoder name for this codec.
    pub fn ffmpeg_encoder(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::Mp3 => "libmp3lame",
            Self::Opus => "libopus",
            Self::Vorbis => "libvorbis",
            Self::Flac => "flac",
            Self::PcmS16le => "pcm_s16le",
        }
    }

    /// Codec name as reported by ffprobe's `codec_name`.
    pub fn probe_name(&self) -> &'static str {
        self.as_str()
    }

    pub fn matches_probe_name(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(self.probe_name())
    }

    /// Lossless codecs take no bitrate.
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Flac | Self::PcmS16le)
    }
}

impl FromStr for AudioCodec {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aac" => Ok(Self::Aac),
            "mp3" => Ok(Self::Mp3),
            "opus" => Ok(Self::Opus),
            "vorbis" => Ok(Self::Vorbis),
            "flac" => Ok(Self::Flac),
            "pcm_s16le" | "pcm" => Ok(Self::PcmS16le),
            _ => Err(TokenError::new(
                "audio codec",
                s,
                &Self::ALL.map(|c| c.as_str()),
            )),
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRF quality token for video encoders (lower = better).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoQuality {
    /// CRF 18
    High,
    /// CRF 23
    Good,
    /// CRF 28
    Medium,
    /// CRF 32
    Low,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 4] = [Self::High, Self::Good, Self::Medium, Self::Low];

    pub fn crf(&self) -> u8 {
        match self {
            Self::High => 18,
            Self::Good => 23,
            Self::Medium => 28,
            Self::Low => 32,
        }
    }
}

impl FromStr for VideoQuality {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "18" => Ok(Self::High),
            "23" => Ok(Self::Good),
            "28" => Ok(Self::Medium),
            "32" => Ok(Self::Low),
            _ => Err(TokenError::new(
                "video quality",
                s,
                &["18", "23", "28", "32"],
            )),
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.crf())
    }
}

/// Audio bitrate token in kbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioQuality {
    Standard,
    High,
    VeryHigh,
    Extreme,
}

impl AudioQuality {
    pub const ALL: [AudioQuality; 4] = [Self::Standard, Self::High, Self::VeryHigh, Self::Extreme];

    pub fn kbps(&self) -> u32 {
        match self {
            Self::Standard => 128,
            Self::High => 192,
            Self::VeryHigh => 256,
            Self::Extreme => 320,
        }
    }

    /// ffmpeg bitrate argument, e.g. `192k`.
    pub fn ffmpeg_bitrate(&self) -> String {
        format!("{}k", self.kbps())
    }
}

impl FromStr for AudioQuality {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches(['k', 'K']) {
            "128" => Ok(Self::Standard),
            "192" => Ok(Self::High),
            "256" => Ok(Self::VeryHigh),
            "320" => Ok(Self::Extreme),
            _ => Err(TokenError::new(
                "audio quality",
                s,
                &["128", "192", "256", "320"],
            )),
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kbps())
    }
}

/// Encoder speed/quality trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Ultrafast,
    Fast,
    Medium,
    Slow,
    Veryslow,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Self::Ultrafast,
        Self::Fast,
        Self::Medium,
        Self::Slow,
        Self::Veryslow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ultrafast => "ultrafast",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Veryslow => "veryslow",
        }
    }
}

impl FromStr for Preset {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ultrafast" => Ok(Self::Ultrafast),
            "fast" => Ok(Self::Fast),
            "medium" => Ok(Self::Medium),
            "slow" => Ok(Self::Slow),
            "veryslow" => Ok(Self::Veryslow),
            _ => Err(TokenError::new(
                "preset",
                s,
                &Self::ALL.map(|p| p.as_str()),
            )),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_codec_encoder() {
        assert_eq!(VideoCodec::H264.ffmpeg_encoder(), "libx264");
        assert_eq!(VideoCodec::H265.ffmpeg_encoder(), "libx265");
        assert_eq!(VideoCodec::Vp9.ffmpeg_encoder(), "libvpx-vp9");
        assert_eq!(VideoCodec::Prores.ffmpeg_encoder(), "prores_ks");
    }

    #[test]
    fn test_video_codec_probe_names() {
        assert!(VideoCodec::H265.matches_probe_name("hevc"));
        assert!(VideoCodec::H264.matches_probe_name("H264"));
        assert!(!VideoCodec::H264.matches_probe_name("hevc"));
        assert_eq!("hevc".parse::<VideoCodec>().unwrap(), VideoCodec::H265);
    }

    #[test]
    fn test_audio_codec_lossless() {
        assert!(AudioCodec::Flac.is_lossless());
        assert!(AudioCodec::PcmS16le.is_lossless());
        assert!(!AudioCodec::Mp3.is_lossless());
        assert!(!AudioCodec::Opus.is_lossless());
    }

    #[test]
    fn test_quality_tokens() {
        assert_eq!("23".parse::<VideoQuality>().unwrap().crf(), 23);
        assert_eq!("192k".parse::<AudioQuality>().unwrap().kbps(), 192);
        assert_eq!(AudioQuality::Extreme.ffmpeg_bitrate(), "320k");
    }

    #[test]
    fn test_out_of_set_tokens_rejected() {
        let err = "20".parse::<VideoQuality>().unwrap_err();
        assert_eq!(err.kind, "video quality");
        assert_eq!(err.value, "20");
        assert!("96".parse::<AudioQuality>().is_err());
        assert!("placebo".parse::<Preset>().is_err());
        assert!("theora".parse::<VideoCodec>().is_err());
        assert!("wma".parse::<AudioCodec>().is_err());
    }
}
