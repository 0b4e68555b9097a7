//! Per-request overrides.

use serde::{Deserialize, Serialize};

/// Per-request overrides. Every token field takes precedence over both the
/// configured defaults and the container policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub video_quality: Option<String>,
    pub audio_quality: Option<String>,
    pub preset: Option<String>,

    /// Trim start in seconds.
    pub trim_start: Option<f64>,
    /// Trim end in seconds.
    pub trim_end: Option<f64>,

    /// Continue with inputs the probe could not classify.
    #[serde(default)]
    pub force: bool,

    /// Allow (`Some(true)`) or forbid (`Some(false)`) stream copy. `None` follows
    /// `output.auto_remux`.
    pub remux: Option<bool>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video_codec(mut self, token: impl Into<String>) -> Self {
        self.video_codec = Some(token.into());
        self
    }

    pub fn with_audio_codec(mut self, token: impl Into<String>) -> Self {
        self.audio_codec = Some(token.into());
        self
    }

    pub fn with_video_quality(mut self, token: impl Into<String>) -> Self {
        self.video_quality = Some(token.into());
        self
    }

    pub fn with_audio_quality(mut self, token: impl Into<String>) -> Self {
        self.audio_quality = Some(token.into());
        self
    }

    pub fn with_preset(mut self, token: impl Into<String>) -> Self {
        self.preset = Some(token.into());
        self
    }

    /// Sets the trim window.
    pub fn with_trim(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        self.trim_start = start;
        self.trim_end = end;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_remux(mut self, remux: bool) -> Self {
        self.remux = Some(remux);
        self
    }
}
