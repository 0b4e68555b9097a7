//! Media inspection.
//!
//! A [`MediaProbe`] turns a path into a [`MediaDescriptor`]. Probing never
//! fails: a missing tool, a timeout or garbled output all degrade to an
//! unknown descriptor so downstream stages can still decide what to do.

mod error;
mod ffprobe;

pub use error::ProbeError;
pub use ffprobe::FfprobeProbe;

use async_trait::async_trait;
use std::path::Path;

use crate::media::MediaDescriptor;

/// Inspects media files.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Returns the name of this probe implementation.
    fn name(&self) -> &str;

    /// Describes the file at `path`.
    ///
    /// Never fails. Anything that prevents inspection yields a descriptor with
    /// `kind == Unknown` carrying only filesystem-derived fields.
    async fn probe(&self, path: &Path) -> MediaDescriptor;
}
