//! Executor module for running conversion jobs.
//!
//! This module provides the `JobExecutor` trait and an FFmpeg implementation
//! that supervises one subprocess per job.
//!
//! # Features
//!
//! - Deterministic argument construction per mode (transcode, remux, extract audio)
//! - Progress parsing into a non-decreasing percentage with ETA
//! - Timeout and cancellation that stop the whole process group
//! - Artifact verification, including outputs the tool relocated
//! - Encoder availability detection
//!
//! # Example
//!
//! ```ignore
//! use mediaconv_core::executor::{FfmpegExecutor, JobExecutor, LogSink};
//! use tokio_util::sync::CancellationToken;
//!
//! let executor = FfmpegExecutor::with_defaults();
//! executor.validate().await?;
//!
//! let mut job = builder.build(Path::new("~/clips/talk.mkv"), "mp4", &Overrides::new()).await?;
//! let outcome = executor.execute(&mut job, &LogSink, CancellationToken::new()).await?;
//! println!("Wrote {} bytes to {}", outcome.size_bytes, outcome.output_path.display());
//! ```

mod args;
mod artifact;
mod capabilities;
mod config;
mod error;
mod ffmpeg;
mod progress;
mod sink;
mod tail;
mod traits;
mod types;

pub use args::build_args;
pub use artifact::locate_artifact;
pub use capabilities::EncoderCapabilities;
pub use config::ExecutorConfig;
pub use error::{CancelReason, ExecutionError};
pub use ffmpeg::FfmpegExecutor;
pub use progress::{
    percent_of, FfmpegProgressParser, ProgressEvent, ProgressParser, ProgressTracker,
};
pub use sink::{ChannelSink, LogSink, NullSink};
pub use tail::OutputTail;
pub use traits::{JobExecutor, ProgressSink};
pub use types::{ExecutionOutcome, ProgressUpdate};
