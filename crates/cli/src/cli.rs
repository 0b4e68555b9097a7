use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use mediaconv_core::Overrides;

#[derive(Parser)]
#[command(name = "mediaconv")]
#[command(author, version, about = "Convert media files with ffmpeg")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "MEDIACONV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Write Prometheus metrics to this file on exit
    #[arg(long, global = true)]
    pub metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a single file
    Convert {
        /// Input file (`~` is expanded)
        #[arg(required = true)]
        input: PathBuf,

        /// Target container (mp4, mkv, webm, mp3, ...)
        #[arg(long = "to")]
        container: String,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Convert several files, one after another
    Batch {
        /// Input files, processed in order
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Target container for every input
        #[arg(long = "to")]
        container: String,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Check that ffmpeg, ffprobe and the encoders are available
    CheckTools,
}

/// Per-invocation setting overrides.
#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    /// Video codec (h264, h265, vp9, mpeg4, prores)
    #[arg(long)]
    pub video_codec: Option<String>,

    /// Audio codec (aac, mp3, opus, vorbis, flac, pcm_s16le)
    #[arg(long)]
    pub audio_codec: Option<String>,

    /// Video quality: 18, 23, 28 or 32
    #[arg(long)]
    pub video_quality: Option<String>,

    /// Audio bitrate in kbps: 128, 192, 256 or 320
    #[arg(long)]
    pub audio_quality: Option<String>,

    /// Encoder preset (ultrafast, fast, medium, slow, veryslow)
    #[arg(long)]
    pub preset: Option<String>,

    /// Trim start in seconds
    #[arg(long)]
    pub start: Option<f64>,

    /// Trim end in seconds
    #[arg(long)]
    pub end: Option<f64>,

    /// Convert even when the input cannot be identified
    #[arg(long)]
    pub force: bool,

    /// Always re-encode, even when stream copy would do
    #[arg(long)]
    pub no_remux: bool,
}

impl OverrideArgs {
    pub fn to_overrides(&self) -> Overrides {
        let mut overrides = Overrides::new()
            .with_trim(self.start, self.end)
            .with_force(self.force);

        if let Some(codec) = &self.video_codec {
            overrides = overrides.with_video_codec(codec);
        }
        if let Some(codec) = &self.audio_codec {
            overrides = overrides.with_audio_codec(codec);
        }
        if let Some(quality) = &self.video_quality {
            overrides = overrides.with_video_quality(quality);
        }
        if let Some(quality) = &self.audio_quality {
            overrides = overrides.with_audio_quality(quality);
        }
        if let Some(preset) = &self.preset {
            overrides = overrides.with_preset(preset);
        }
        if self.no_remux {
            overrides = overrides.with_remux(false);
        }

        overrides
    }
}
