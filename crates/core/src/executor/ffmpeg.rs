//! FFmpeg-based executor implementation.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::args::build_args;
use super::artifact::locate_artifact;
use super::config::ExecutorConfig;
use super::error::{CancelReason, ExecutionError};
use super::progress::{FfmpegProgressParser, ProgressParser, ProgressTracker};
use super::tail::OutputTail;
use super::traits::{JobExecutor, ProgressSink};
use super::types::ExecutionOutcome;
use crate::config::ToolsConfig;
use crate::job::ConversionJob;
use crate::metrics;

/// Capacity of the line channel between the pipe readers and the job loop.
const LINE_BUFFER: usize = 256;

enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Aborts the pipe reader tasks when the job loop exits.
struct ReaderTasks(Vec<JoinHandle<()>>);

impl Drop for ReaderTasks {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// FFmpeg-based executor implementation.
pub struct FfmpegExecutor {
    tools: ToolsConfig,
    config: ExecutorConfig,
    parser: Arc<dyn ProgressParser>,
}

impl FfmpegExecutor {
    /// Creates a new executor with the given configuration.
    pub fn new(tools: ToolsConfig, config: ExecutorConfig) -> Self {
        Self {
            tools,
            config,
            parser: Arc::new(FfmpegProgressParser),
        }
    }

    /// Creates an executor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ToolsConfig::default(), ExecutorConfig::default())
    }

    /// Replaces the progress parser.
    pub fn with_parser(mut self, parser: Arc<dyn ProgressParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// The exact argument vector ffmpeg will be started with.
    pub fn build_args(&self, job: &ConversionJob) -> Vec<String> {
        build_args(job, &self.config)
    }

    fn spawn_error(&self, e: std::io::Error) -> ExecutionError {
        let reason = if e.kind() == std::io::ErrorKind::NotFound {
            "executable not found".to_string()
        } else {
            e.to_string()
        };
        ExecutionError::SpawnFailed {
            program: self.tools.ffmpeg_path.clone(),
            reason,
        }
    }

    /// Runs the job from the pre-spawn checks to artifact verification.
    async fn run(
        &self,
        job: &mut ConversionJob,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
        started: SystemTime,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let start = Instant::now();

        if tokio::fs::try_exists(&job.output_path)
            .await
            .unwrap_or(false)
        {
            return Err(ExecutionError::OutputExists {
                path: job.output_path.clone(),
            });
        }

        // Ensure output directory exists
        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                ExecutionError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        let args = self.build_args(job);
        debug!(job_id = %job.id, args = ?args, "Spawning ffmpeg");

        let mut command = Command::new(&self.tools.ffmpeg_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group so cancellation reaches everything ffmpeg starts
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| self.spawn_error(e))?;
        job.mark_running();
        info!(
            job_id = %job.id,
            mode = %job.mode,
            input = %job.input.path.display(),
            output = %job.output_path.display(),
            "Conversion started"
        );

        let (tx, mut rx) = mpsc::channel(LINE_BUFFER);
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(stdout, tx.clone(), OutputLine::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(stderr, tx.clone(), OutputLine::Stderr));
        }
        drop(tx);
        let _readers = ReaderTasks(readers);

        let total_secs = job.total_duration_secs(self.config.unknown_duration_secs);
        let mut tracker = ProgressTracker::new(job.id, total_secs);
        let mut tail = OutputTail::new(self.config.max_error_detail_bytes);

        let deadline = self
            .config
            .timeout()
            .map(|t| tokio::time::Instant::now() + t);
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expired);

        // Read until both pipes close
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(CancelReason::Requested),
                _ = &mut expired => Err(CancelReason::TimedOut),
                line = rx.recv() => Ok(line),
            };

            let line = match next {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(reason) => return Err(self.stop(&mut child, job, reason, &tail).await),
            };

            let text = match &line {
                OutputLine::Stdout(text) => text,
                OutputLine::Stderr(text) => {
                    tail.push(text);
                    text
                }
            };

            if let Some(update) = tracker.apply(self.parser.parse_line(text)) {
                job.record_progress(update.percent);
                sink.report(&update);
            }
        }

        let waited = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CancelReason::Requested),
            _ = &mut expired => Err(CancelReason::TimedOut),
            status = child.wait() => Ok(status),
        };
        let status = match waited {
            Ok(status) => status?,
            Err(reason) => return Err(self.stop(&mut child, job, reason, &tail).await),
        };

        if !status.success() {
            return Err(ExecutionError::ExitedNonZero {
                code: status.code(),
                detail: tail.contents(),
            });
        }

        let artifact = locate_artifact(
            &job.output_path,
            tracker.reported_path().map(|p| p.as_path()),
            started,
        )
        .await
        .ok_or_else(|| ExecutionError::OutputArtifactMissing {
            expected: job.output_path.clone(),
            detail: tail.contents(),
        })?;
        let size_bytes = tokio::fs::metadata(&artifact).await?.len();

        job.mark_completed(artifact.clone());
        sink.report(&tracker.finish());

        Ok(ExecutionOutcome {
            job_id: job.id,
            output_path: artifact,
            size_bytes,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Kills the whole process group, reaps the child and builds the error.
    async fn stop(
        &self,
        child: &mut Child,
        job: &ConversionJob,
        reason: CancelReason,
        tail: &OutputTail,
    ) -> ExecutionError {
        info!(job_id = %job.id, reason = %reason, "Stopping ffmpeg");
        terminate(child).await;
        ExecutionError::Cancelled {
            reason,
            detail: tail.contents(),
        }
    }
}

/// Forwards a pipe into the line channel. Splits on `\n` and `\r` so
/// carriage-return progress bars arrive as separate lines.
fn forward_lines<R>(
    reader: R,
    tx: mpsc::Sender<OutputLine>,
    wrap: fn(String) -> OutputLine,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let chunk = String::from_utf8_lossy(&buf);
            for piece in chunk.split(['\r', '\n']).filter(|p| !p.trim().is_empty()) {
                if tx.send(wrap(piece.to_string())).await.is_err() {
                    return;
                }
            }
        }
    })
}

async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            debug!(pid, error = %e, "killpg failed");
        }
    }

    // Kills the leader if still alive and reaps it
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Failed to reap ffmpeg");
    }
}

#[async_trait]
impl JobExecutor for FfmpegExecutor {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn execute(
        &self,
        job: &mut ConversionJob,
        sink: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        if !job.is_pending() {
            return Err(ExecutionError::NotPending { status: job.status });
        }

        let started = SystemTime::now();
        let start = Instant::now();
        let mode = job.mode.as_str();

        let result = self.run(job, sink, &cancel, started).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(outcome) => {
                metrics::CONVERSIONS_TOTAL
                    .with_label_values(&[mode, "success"])
                    .inc();
                metrics::CONVERSION_DURATION
                    .with_label_values(&[mode])
                    .observe(elapsed);
                info!(
                    job_id = %job.id,
                    output = %outcome.output_path.display(),
                    size_bytes = outcome.size_bytes,
                    elapsed_secs = %format!("{:.1}", elapsed),
                    "Conversion completed"
                );
            }
            Err(e) => {
                job.mark_failed(e.detail());
                metrics::CONVERSIONS_TOTAL
                    .with_label_values(&[mode, e.kind()])
                    .inc();
                if job.started_at.is_some() {
                    metrics::CONVERSION_DURATION
                        .with_label_values(&[mode])
                        .observe(elapsed);
                }
                warn!(job_id = %job.id, error = %e, "Conversion failed");
            }
        }

        result
    }

    async fn validate(&self) -> Result<(), ExecutionError> {
        let output = Command::new(&self.tools.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ExecutionError::ExitedNonZero {
                code: output.status.code(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}
