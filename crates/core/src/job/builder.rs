//! Turns a user request into a validated [`ConversionJob`].

use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::BuildError;
use super::output_path::output_path_for;
use super::types::{ConversionJob, JobMode};
use crate::config::OutputConfig;
use crate::media::{AudioCodec, Container, MediaDescriptor, MediaKind, VideoCodec};
use crate::metrics;
use crate::probe::MediaProbe;
use crate::settings::{remux_eligible, Overrides, SettingsResolver};

/// Builds conversion jobs: probe, resolve, validate, pick an output path.
pub struct JobBuilder {
    probe: Arc<dyn MediaProbe>,
    resolver: SettingsResolver,
    output: OutputConfig,
}

impl JobBuilder {
    pub fn new(
        probe: Arc<dyn MediaProbe>,
        resolver: SettingsResolver,
        output: OutputConfig,
    ) -> Self {
        Self {
            probe,
            resolver,
            output,
        }
    }

    /// Builds a pending job converting `input` into `container`.
    ///
    /// On error nothing is returned and no file is touched.
    pub async fn build(
        &self,
        input: &Path,
        container: &str,
        overrides: &Overrides,
    ) -> Result<ConversionJob, BuildError> {
        let result = self.build_inner(input, container, overrides).await;
        match &result {
            Ok(job) => {
                metrics::JOBS_BUILT.with_label_values(&["ok"]).inc();
                info!(
                    job_id = %job.id,
                    input = %job.input.path.display(),
                    output = %job.output_path.display(),
                    mode = %job.mode,
                    "Built conversion job"
                );
            }
            Err(e) => {
                metrics::JOBS_BUILT.with_label_values(&[e.kind()]).inc();
                debug!(input = %input.display(), error = %e, "Job build rejected");
            }
        }
        result
    }

    async fn build_inner(
        &self,
        input: &Path,
        container: &str,
        overrides: &Overrides,
    ) -> Result<ConversionJob, BuildError> {
        let input_path = resolve_input_path(input)?;

        let container: Container = container
            .parse()
            .map_err(|id| BuildError::UnsupportedContainer { container: id })?;

        let descriptor = self.probe.probe(&input_path).await;
        if descriptor.kind == MediaKind::Unknown && !overrides.force {
            return Err(BuildError::UnknownInput { path: input_path });
        }

        let settings = self.resolver.resolve(&descriptor, container, overrides)?;

        validate_trim(
            overrides.trim_start,
            overrides.trim_end,
            descriptor.duration_secs,
        )?;

        let mode = select_mode(
            &descriptor,
            container,
            settings.video_codec,
            settings.audio_codec,
            overrides.remux.unwrap_or(self.output.auto_remux),
        );

        let dir = self.output_dir(&input_path);
        let (output_path, alternate) =
            output_path_for(&input_path, &dir, container, Local::now());
        if alternate {
            debug!(
                output = %output_path.display(),
                "Preferred output path exists, using alternate"
            );
        }

        Ok(
            ConversionJob::new(descriptor, output_path, container, settings, mode)
                .with_trim(overrides.trim_start, overrides.trim_end)
                .with_overwrite(alternate),
        )
    }

    fn output_dir(&self, input: &Path) -> PathBuf {
        match &self.output.dir {
            Some(dir) => expand_path(dir),
            None => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

fn select_mode(
    input: &MediaDescriptor,
    container: Container,
    video: Option<VideoCodec>,
    audio: Option<AudioCodec>,
    remux_allowed: bool,
) -> JobMode {
    if input.kind == MediaKind::Video && container.is_audio_only() {
        return JobMode::ExtractAudio;
    }

    if remux_allowed
        && remux_eligible(
            input.video_codec.as_deref(),
            input.audio_codec.as_deref(),
            video,
            audio,
            container,
        )
    {
        return JobMode::Remux;
    }

    JobMode::Transcode
}

/// Expands `~`, makes the path absolute and checks it is an existing file.
fn resolve_input_path(input: &Path) -> Result<PathBuf, BuildError> {
    let expanded = expand_path(input);
    let absolute = std::path::absolute(&expanded).unwrap_or(expanded);

    if !absolute.is_file() {
        return Err(BuildError::FileNotFound { path: absolute });
    }
    Ok(absolute)
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

/// Checks trim bounds. The upper bound is only enforced when the duration is
/// known (> 0).
pub fn validate_trim(
    start: Option<f64>,
    end: Option<f64>,
    duration_secs: f64,
) -> Result<(), BuildError> {
    for (name, value) in [("start", start), ("end", end)] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(BuildError::invalid_range(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, v
                )));
            }
        }
    }

    let effective_start = start.unwrap_or(0.0);
    if let Some(end) = end {
        if end <= effective_start {
            return Err(BuildError::invalid_range(format!(
                "end ({}) must be after start ({})",
                end, effective_start
            )));
        }
    }

    if duration_secs > 0.0 {
        if effective_start >= duration_secs {
            return Err(BuildError::invalid_range(format!(
                "start ({}) is beyond the input duration ({})",
                effective_start, duration_secs
            )));
        }
        if let Some(end) = end {
            if end > duration_secs {
                return Err(BuildError::invalid_range(format!(
                    "end ({}) is beyond the input duration ({})",
                    end, duration_secs
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trim_ordering() {
        assert!(validate_trim(Some(10.0), Some(50.0), 100.0).is_ok());
        assert!(matches!(
            validate_trim(Some(10.0), Some(5.0), 100.0),
            Err(BuildError::InvalidRange { .. })
        ));
        assert!(validate_trim(Some(10.0), Some(10.0), 100.0).is_err());
        assert!(validate_trim(None, Some(0.0), 100.0).is_err());
    }

    #[test]
    fn test_validate_trim_bounds() {
        assert!(validate_trim(Some(-1.0), None, 100.0).is_err());
        assert!(validate_trim(Some(f64::NAN), None, 100.0).is_err());
        assert!(validate_trim(None, Some(f64::INFINITY), 0.0).is_err());
        assert!(validate_trim(Some(100.0), None, 100.0).is_err());
        assert!(validate_trim(None, Some(101.0), 100.0).is_err());
        assert!(validate_trim(None, Some(100.0), 100.0).is_ok());
    }

    #[test]
    fn test_validate_trim_unknown_duration() {
        assert!(validate_trim(Some(500.0), Some(900.0), 0.0).is_ok());
        assert!(validate_trim(Some(500.0), Some(400.0), 0.0).is_err());
    }

    #[test]
    fn test_expand_path_leaves_plain_paths() {
        assert_eq!(
            expand_path(Path::new("/srv/media/in.mkv")),
            PathBuf::from("/srv/media/in.mkv")
        );
    }
}
