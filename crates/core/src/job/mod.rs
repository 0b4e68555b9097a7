//! Conversion jobs and how they are built.
//!
//! [`JobBuilder::build`] is the only way user input becomes a
//! [`ConversionJob`]: it checks the input exists, probes it, resolves encode
//! settings, validates trim bounds, chooses transcode/remux/extract and picks
//! an output path that does not clobber anything.

mod builder;
mod error;
mod output_path;
mod types;

pub use builder::{validate_trim, JobBuilder};
pub use error::BuildError;
pub use output_path::output_path_for;
pub use types::{ConversionJob, JobId, JobMode, JobStatus};
