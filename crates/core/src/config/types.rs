use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::executor::ExecutorConfig;
use crate::settings::SettingsDefaults;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub defaults: SettingsDefaults,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// External tool locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Upper bound for a single ffprobe invocation.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl ToolsConfig {
    /// Creates a tools config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_probe_timeout() -> u64 {
    30
}

/// Where converted files go
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Output directory. Defaults to the input file's directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Copy streams instead of re-encoding when codecs already match.
    #[serde(default = "default_auto_remux")]
    pub auto_remux: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            auto_remux: default_auto_remux(),
        }
    }
}

fn default_auto_remux() -> bool {
    true
}

/// Batch behaviour
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Extra attempts for inputs whose execution failed with a retryable error.
    #[serde(default)]
    pub retry_attempts: u32,
}
