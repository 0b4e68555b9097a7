//! Caller-wide encode defaults.

use serde::{Deserialize, Serialize};

use super::error::SettingsError;
use crate::media::{AudioCodec, AudioQuality, Preset, VideoCodec, VideoQuality};

/// Default tokens applied before the container policy and overrides.
///
/// Kept as raw strings so a bad value in a config file surfaces as
/// [`SettingsError::InvalidConfig`] naming the offending field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsDefaults {
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// CRF token: 18, 23, 28 or 32.
    #[serde(default = "default_video_quality")]
    pub video_quality: String,

    /// Bitrate token in kbps: 128, 192, 256 or 320.
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    #[serde(default = "default_preset")]
    pub preset: String,
}

fn default_video_codec() -> String {
    "h264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_video_quality() -> String {
    "23".to_string()
}

fn default_audio_quality() -> String {
    "192".to_string()
}

fn default_preset() -> String {
    "medium".to_string()
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            video_quality: default_video_quality(),
            audio_quality: default_audio_quality(),
            preset: default_preset(),
        }
    }
}

/// Typed form of [`SettingsDefaults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDefaults {
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    pub video_quality: VideoQuality,
    pub audio_quality: AudioQuality,
    pub preset: Preset,
}

impl SettingsDefaults {
    /// Parses every token against its set.
    pub fn parse(&self) -> Result<ParsedDefaults, SettingsError> {
        Ok(ParsedDefaults {
            video_codec: parse_token("defaults.video_codec", &self.video_codec)?,
            audio_codec: parse_token("defaults.audio_codec", &self.audio_codec)?,
            video_quality: parse_token("defaults.video_quality", &self.video_quality)?,
            audio_quality: parse_token("defaults.audio_quality", &self.audio_quality)?,
            preset: parse_token("defaults.preset", &self.preset)?,
        })
    }

    /// Sets the default video codec token.
    pub fn with_video_codec(mut self, token: impl Into<String>) -> Self {
        self.video_codec = token.into();
        self
    }

    /// Sets the default audio codec token.
    pub fn with_audio_codec(mut self, token: impl Into<String>) -> Self {
        self.audio_codec = token.into();
        self
    }
}

/// Parses a token, attaching the field name on failure.
pub(crate) fn parse_token<T>(field: &str, value: &str) -> Result<T, SettingsError>
where
    T: std::str::FromStr<Err = crate::media::TokenError>,
{
    value
        .parse::<T>()
        .map_err(|e| SettingsError::invalid_config(field, value, e.to_string()))
}
