//! Encode settings resolution.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{parse_token, SettingsDefaults};
use super::error::SettingsError;
use super::overrides::Overrides;
use crate::media::{
    AudioCodec, AudioPolicy, AudioQuality, Container, MediaDescriptor, MediaKind, Preset,
    VideoCodec, VideoPolicy, VideoQuality,
};

/// Fully resolved, typed encode parameters.
///
/// Audio-only output never carries video fields, lossless audio never carries
/// a bitrate, and CRF/preset only appear for codecs that take them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncodeSettings {
    pub video_codec: Option<VideoCodec>,
    pub audio_codec: Option<AudioCodec>,
    pub video_quality: Option<VideoQuality>,
    pub audio_quality: Option<AudioQuality>,
    pub preset: Option<Preset>,
}

/// Merges defaults, container policy and overrides into [`EncodeSettings`].
#[derive(Debug, Clone, Default)]
pub struct SettingsResolver {
    defaults: SettingsDefaults,
}

impl SettingsResolver {
    pub fn new(defaults: SettingsDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &SettingsDefaults {
        &self.defaults
    }

    /// Resolves settings for converting `input` into `container`.
    pub fn resolve(
        &self,
        input: &MediaDescriptor,
        container: Container,
        overrides: &Overrides,
    ) -> Result<EncodeSettings, SettingsError> {
        let defaults = self.defaults.parse()?;
        let (video_policy, audio_policy) = container.policy();

        let video_override = overrides
            .video_codec
            .as_deref()
            .map(|t| parse_token::<VideoCodec>("video_codec", t))
            .transpose()?;
        let audio_override = overrides
            .audio_codec
            .as_deref()
            .map(|t| parse_token::<AudioCodec>("audio_codec", t))
            .transpose()?;
        let video_quality = match overrides.video_quality.as_deref() {
            Some(t) => parse_token::<VideoQuality>("video_quality", t)?,
            None => defaults.video_quality,
        };
        let audio_quality = match overrides.audio_quality.as_deref() {
            Some(t) => parse_token::<AudioQuality>("audio_quality", t)?,
            None => defaults.audio_quality,
        };
        let preset = match overrides.preset.as_deref() {
            Some(t) => parse_token::<Preset>("preset", t)?,
            None => defaults.preset,
        };

        let video_codec = match (video_policy, video_override) {
            (VideoPolicy::Drop, Some(codec)) => {
                return Err(SettingsError::invalid_config(
                    "video_codec",
                    codec.as_str(),
                    format!("container '{}' carries no video", container),
                ));
            }
            (VideoPolicy::Drop, None) => None,
            (_, Some(codec)) if input.kind == MediaKind::Audio => {
                return Err(SettingsError::invalid_config(
                    "video_codec",
                    codec.as_str(),
                    "input has no video stream",
                ));
            }
            // An audio input has nothing to encode as video
            (_, None) if input.kind == MediaKind::Audio => None,
            (_, Some(codec)) => Some(codec),
            (VideoPolicy::Prefer(codec), None) => Some(codec),
            (VideoPolicy::Default, None) => Some(defaults.video_codec),
        };

        let audio_codec = match (audio_policy, audio_override) {
            (_, Some(codec)) => codec,
            (AudioPolicy::Prefer(codec), None) => codec,
            (AudioPolicy::Default, None) => defaults.audio_codec,
        };

        let settings = EncodeSettings {
            video_codec,
            audio_codec: Some(audio_codec),
            video_quality: video_codec
                .filter(|c| c.takes_crf())
                .map(|_| video_quality),
            audio_quality: (!audio_codec.is_lossless()).then_some(audio_quality),
            preset: video_codec.filter(|c| c.takes_preset()).map(|_| preset),
        };

        debug!(
            input = %input.path.display(),
            container = %container,
            video = ?settings.video_codec,
            audio = ?settings.audio_codec,
            "Resolved encode settings"
        );

        Ok(settings)
    }
}

/// Whether the input can be stream-copied into `container` unchanged.
///
/// `input_video`/`input_audio` are ffprobe codec names; the comparison
/// understands aliases such as `hevc` for H.265.
pub fn remux_eligible(
    input_video: Option<&str>,
    input_audio: Option<&str>,
    resolved_video: Option<VideoCodec>,
    resolved_audio: Option<AudioCodec>,
    container: Container,
) -> bool {
    if !container.supports_stream_copy() {
        return false;
    }

    let video_matches = match (input_video, resolved_video) {
        (Some(name), Some(codec)) => codec.matches_probe_name(name),
        _ => false,
    };
    let audio_matches = match (input_audio, resolved_audio) {
        (Some(name), Some(codec)) => codec.matches_probe_name(name),
        (None, None) => true,
        _ => false,
    };

    video_matches && audio_matches
}
