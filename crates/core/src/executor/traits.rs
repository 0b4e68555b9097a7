//! Trait definitions for the executor module.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::ExecutionError;
use super::types::{ExecutionOutcome, ProgressUpdate};
use crate::job::ConversionJob;

/// Runs conversion jobs to completion.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Returns the name of this executor implementation.
    fn name(&self) -> &str;

    /// Executes a pending job, updating its status in place.
    ///
    /// On return the job is either completed or failed, with `error_detail`
    /// populated on failure. Progress updates are delivered to `sink` in the
    /// order the tool produced them and never decrease. Cancelling `cancel`
    /// stops the tool and everything it spawned before this returns.
    async fn execute(
        &self,
        job: &mut ConversionJob,
        sink: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> Result<ExecutionOutcome, ExecutionError>;

    /// Validates that the executor is properly configured and ready.
    async fn validate(&self) -> Result<(), ExecutionError>;
}

/// Receives progress updates. Fire-and-forget: implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: &ProgressUpdate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::NullSink;
    use crate::testing::fixtures;
    use std::path::PathBuf;

    struct InstantExecutor;

    #[async_trait]
    impl JobExecutor for InstantExecutor {
        fn name(&self) -> &str {
            "instant"
        }

        async fn execute(
            &self,
            job: &mut ConversionJob,
            sink: &dyn ProgressSink,
            _cancel: CancellationToken,
        ) -> Result<ExecutionOutcome, ExecutionError> {
            job.mark_running();
            sink.report(&ProgressUpdate {
                job_id: job.id,
                percent: 100.0,
                status: "done".to_string(),
                eta_secs: Some(0.0),
            });
            job.mark_completed(job.output_path.clone());
            Ok(ExecutionOutcome {
                job_id: job.id,
                output_path: job.output_path.clone(),
                size_bytes: 0,
                elapsed_secs: 0.0,
            })
        }

        async fn validate(&self) -> Result<(), ExecutionError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_executor_trait_object() {
        let executor: Box<dyn JobExecutor> = Box::new(InstantExecutor);
        let mut job = fixtures::pending_job("/in/a.mp4", "/out/a.mkv");

        let outcome = executor
            .execute(&mut job, &NullSink, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.output_path, PathBuf::from("/out/a.mkv"));
        assert_eq!(executor.name(), "instant");
        assert!(executor.validate().await.is_ok());
    }
}
