//! Sequential batch execution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::BatchConfig;
use crate::executor::{JobExecutor, ProgressSink};
use crate::job::JobBuilder;
use crate::metrics;
use crate::settings::Overrides;

/// Where an input failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStage {
    Build,
    Execution,
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => f.write_str("build"),
            Self::Execution => f.write_str("execution"),
        }
    }
}

/// One input that did not convert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub reason: String,
    pub stage: BatchStage,
}

/// Result of a batch. `succeeded.len() + failed.len() == total`, both in
/// input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub total: usize,
    /// Output paths of converted inputs.
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Inputs worth retrying, in order.
    pub fn failed_inputs(&self) -> Vec<&Path> {
        self.failed.iter().map(|f| f.input.as_path()).collect()
    }
}

/// Reason recorded for inputs never started because the batch was cancelled.
pub const CANCELLED_REASON: &str = "cancelled";

/// Runs many inputs through build and execute, one at a time.
pub struct BatchRunner {
    builder: Arc<JobBuilder>,
    executor: Arc<dyn JobExecutor>,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(
        builder: Arc<JobBuilder>,
        executor: Arc<dyn JobExecutor>,
        config: BatchConfig,
    ) -> Self {
        Self {
            builder,
            executor,
            config,
        }
    }

    /// Converts every input into `container`.
    ///
    /// A failing input is recorded and the batch moves on. Once `cancel`
    /// fires the running job fails as cancelled and the rest are recorded as
    /// failed without being started.
    pub async fn run_batch(
        &self,
        inputs: &[PathBuf],
        container: &str,
        overrides: &Overrides,
        sink: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> BatchOutcome {
        let total = inputs.len();
        let mut outcome = BatchOutcome {
            total,
            ..Default::default()
        };

        for (index, input) in inputs.iter().enumerate() {
            if cancel.is_cancelled() {
                metrics::BATCH_INPUTS.with_label_values(&["cancelled"]).inc();
                outcome.failed.push(BatchFailure {
                    input: input.clone(),
                    reason: CANCELLED_REASON.to_string(),
                    stage: BatchStage::Execution,
                });
                continue;
            }

            info!(
                item = index + 1,
                total,
                input = %input.display(),
                "Processing batch item"
            );

            match self
                .convert_one(input, container, overrides, sink, &cancel)
                .await
            {
                Ok(output) => {
                    metrics::BATCH_INPUTS.with_label_values(&["succeeded"]).inc();
                    outcome.succeeded.push(output);
                }
                Err(failure) => {
                    metrics::BATCH_INPUTS.with_label_values(&["failed"]).inc();
                    warn!(
                        input = %failure.input.display(),
                        stage = %failure.stage,
                        reason = %failure.reason,
                        "Batch item failed"
                    );
                    outcome.failed.push(failure);
                }
            }
        }

        info!(
            total,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Batch finished"
        );

        outcome
    }

    async fn convert_one(
        &self,
        input: &Path,
        container: &str,
        overrides: &Overrides,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, BatchFailure> {
        let failure = |stage, reason: String| BatchFailure {
            input: input.to_path_buf(),
            reason,
            stage,
        };

        let mut attempt = 0;
        loop {
            let mut job = self
                .builder
                .build(input, container, overrides)
                .await
                .map_err(|e| failure(BatchStage::Build, e.to_string()))?;

            match self.executor.execute(&mut job, sink, cancel.clone()).await {
                Ok(result) => return Ok(result.output_path),
                Err(e)
                    if e.is_retryable()
                        && attempt < self.config.retry_attempts
                        && !cancel.is_cancelled() =>
                {
                    attempt += 1;
                    warn!(
                        input = %input.display(),
                        attempt,
                        error = %e,
                        "Retrying batch item"
                    );
                }
                Err(e) => return Err(failure(BatchStage::Execution, e.detail())),
            }
        }
    }
}
