pub mod batch;
pub mod config;
pub mod executor;
pub mod job;
pub mod media;
pub mod metrics;
pub mod probe;
pub mod settings;
pub mod testing;

pub use batch::{BatchFailure, BatchOutcome, BatchRunner, BatchStage};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use executor::{
    CancelReason, ExecutionError, ExecutionOutcome, FfmpegExecutor, JobExecutor, ProgressSink,
    ProgressUpdate,
};
pub use job::{BuildError, ConversionJob, JobBuilder, JobId, JobMode, JobStatus};
pub use media::{Container, MediaDescriptor, MediaKind};
pub use probe::{FfprobeProbe, MediaProbe, ProbeError};
pub use settings::{EncodeSettings, Overrides, SettingsError, SettingsResolver};
