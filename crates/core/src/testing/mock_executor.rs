//! Mock executor for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::executor::{
    CancelReason, ExecutionError, ExecutionOutcome, JobExecutor, ProgressSink, ProgressUpdate,
};
use crate::job::ConversionJob;

/// Mock implementation of the JobExecutor trait.
///
/// Provides controllable behavior for testing:
/// - Queue errors returned by the next executions, in order
/// - Record every job handed over, in its final state
/// - Optionally write a small file at the output path
///
/// Jobs follow the same lifecycle as with the real executor: non-pending jobs
/// are refused, a cancelled token fails the job as cancelled, and successful
/// jobs report 50 then 100 percent.
#[derive(Debug, Clone)]
pub struct MockExecutor {
    jobs: Arc<RwLock<Vec<ConversionJob>>>,
    errors: Arc<RwLock<VecDeque<ExecutionError>>>,
    write_output: Arc<RwLock<bool>>,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            errors: Arc::new(RwLock::new(VecDeque::new())),
            write_output: Arc::new(RwLock::new(false)),
        }
    }

    /// Queue an error for a future execution.
    pub async fn push_error(&self, error: ExecutionError) {
        self.errors.write().await.push_back(error);
    }

    /// Write a placeholder file at each job's output path on success.
    pub async fn set_write_output(&self, write: bool) {
        *self.write_output.write().await = write;
    }

    /// Jobs executed so far.
    pub async fn recorded_jobs(&self) -> Vec<ConversionJob> {
        self.jobs.read().await.clone()
    }

    pub async fn execution_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    async fn run(
        &self,
        job: &mut ConversionJob,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        if let Some(error) = self.errors.write().await.pop_front() {
            return Err(error);
        }
        if cancel.is_cancelled() {
            return Err(ExecutionError::cancelled(CancelReason::Requested));
        }

        for (percent, status) in [(50.0, "converting"), (100.0, "done")] {
            job.record_progress(percent);
            sink.report(&ProgressUpdate {
                job_id: job.id,
                percent,
                status: status.to_string(),
                eta_secs: None,
            });
        }

        let mut size_bytes = 0;
        if *self.write_output.read().await {
            tokio::fs::write(&job.output_path, b"mock output").await?;
            size_bytes = 11;
        }

        Ok(ExecutionOutcome {
            job_id: job.id,
            output_path: job.output_path.clone(),
            size_bytes,
            elapsed_secs: 0.0,
        })
    }
}

#[async_trait]
impl JobExecutor for MockExecutor {
    fn name(&self) -> &str {
        "mock"
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

        job.mark_running();
        let result = self.run(job, sink, &cancel).await;
        match &result {
            Ok(outcome) => {
                job.mark_completed(outcome.output_path.clone());
            }
            Err(e) => {
                job.mark_failed(e.detail());
            }
        }

        self.jobs.write().await.push(job.clone());
        result
    }

    async fn validate(&self) -> Result<(), ExecutionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;
    use crate::testing::{fixtures, RecordingSink};

    #[tokio::test]
    async fn test_queued_error_fails_job() {
        let executor = MockExecutor::new();
        executor
            .push_error(ExecutionError::ExitedNonZero {
                code: Some(1),
                detail: "Invalid data found when processing input".to_string(),
            })
            .await;

        let mut job = fixtures::pending_job("/in/a.mp4", "/out/a.mkv");
        let result = executor
            .execute(&mut job, &RecordingSink::new(), CancellationToken::new())
            .await;

        assert!(result.is_err());
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job
            .error_detail
            .as_deref()
            .unwrap()
            .contains("Invalid data found"));
    }

    #[tokio::test]
    async fn test_success_reports_progress() {
        let executor = MockExecutor::new();
        let sink = RecordingSink::new();
        let mut job = fixtures::pending_job("/in/a.mp4", "/out/a.mkv");

        executor
            .execute(&mut job, &sink, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(sink.percents(), vec![50.0, 100.0]);
        assert_eq!(executor.execution_count().await, 1);
    }
}
