//! Executor lifecycle integration tests.
//!
//! A shell script stands in for ffmpeg. It receives the real argument vector
//! (the output path is always the last argument) and prints progress the way
//! `-progress pipe:1` does. These tests verify:
//! - Progress is non-decreasing and ends at exactly 100
//! - Artifact verification, including outputs written elsewhere
//! - Failure reporting for non-zero exits and missing outputs
//! - Cancellation and timeouts stop every process the job started
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use mediaconv_core::{
    config::ToolsConfig,
    executor::{CancelReason, ExecutionError, ExecutorConfig, FfmpegExecutor, JobExecutor},
    job::{ConversionJob, JobStatus},
    testing::{fixtures, RecordingSink},
};

/// Scratch directories for the fake tool and its outputs.
struct TestHarness {
    tools_dir: TempDir,
    out_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            tools_dir: TempDir::new().expect("Failed to create tools dir"),
            out_dir: TempDir::new().expect("Failed to create output dir"),
        }
    }

    /// Installs a fake ffmpeg running `body`. `$last` holds the output path.
    fn executor(&self, body: &str, config: ExecutorConfig) -> FfmpegExecutor {
        let script = self.tools_dir.path().join("ffmpeg");
        std::fs::write(
            &script,
            format!("#!/bin/sh\nfor last; do :; done\n{}\n", body),
        )
        .expect("Failed to write fake ffmpeg");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod fake ffmpeg");

        FfmpegExecutor::new(
            ToolsConfig::with_paths(script, PathBuf::from("ffprobe")),
            config,
        )
    }

    /// A pending two minute transcode writing into the output directory.
    fn job(&self, name: &str) -> ConversionJob {
        fixtures::pending_job("/in/clip.mp4", self.out_dir.path().join(name))
    }

    fn pid_file(&self, name: &str) -> PathBuf {
        self.tools_dir.path().join(name)
    }
}

fn assert_non_decreasing(percents: &[f64]) {
    for pair in percents.windows(2) {
        assert!(pair[0] <= pair[1], "progress went backwards: {:?}", percents);
    }
}

/// True once `pid` has exited (gone, or a zombie waiting for its reaper).
fn process_gone(pid: i32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Err(_) => true,
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .and_then(|rest| rest.split_whitespace().next())
            .map_or(true, |state| state == "Z" || state == "X"),
    }
}

async fn read_pid(path: &Path) -> i32 {
    for _ in 0..200 {
        if let Ok(text) = std::fs::read_to_string(path) {
            if let Ok(pid) = text.trim().parse() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("pid file {} never appeared", path.display());
}

async fn wait_gone(pid: i32) -> bool {
    for _ in 0..100 {
        if process_gone(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_successful_conversion_reports_progress_to_100() {
    let h = TestHarness::new();
    let executor = h.executor(
        r#"
printf 'out_time=00:00:30.000000\nspeed=2.0x\nprogress=continue\n'
printf 'out_time=00:01:00.000000\nprogress=continue\n'
printf 'out_time=00:01:30.000000\nprogress=continue\n'
printf 'out_time=00:02:00.000000\nprogress=end\n'
printf 'converted' > "$last"
"#,
        ExecutorConfig::default(),
    );
    let mut job = h.job("clip.mkv");
    let sink = RecordingSink::new();

    let outcome = executor
        .execute(&mut job, &sink, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.output_path, h.out_dir.path().join("clip.mkv"));
    assert_eq!(outcome.size_bytes, 9);
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress_percent, 100.0);
    assert_eq!(job.artifact_path.as_deref(), Some(outcome.output_path.as_path()));
    assert!(job.error_detail.is_none());

    let percents = sink.percents();
    assert!(percents.contains(&25.0));
    assert!(percents.contains(&50.0));
    assert_non_decreasing(&percents);
    assert_eq!(sink.last_percent(), Some(100.0));
}

#[tokio::test]
async fn test_unknown_duration_still_reaches_100() {
    let h = TestHarness::new();
    let executor = h.executor(
        r#"
printf 'out_time=00:00:05.000000\n'
printf 'out_time=00:00:10.000000\n'
printf 'done' > "$last"
"#,
        ExecutorConfig::default().with_unknown_duration(60.0),
    );
    let mut job = h.job("clip.mkv");
    job.input.duration_secs = 0.0;
    let sink = RecordingSink::new();

    executor
        .execute(&mut job, &sink, CancellationToken::new())
        .await
        .unwrap();

    let percents = sink.percents();
    assert_non_decreasing(&percents);
    assert!(percents.iter().all(|p| (0.0..=100.0).contains(p)));
    assert_eq!(sink.last_percent(), Some(100.0));
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_non_zero_exit_fails_with_tool_output() {
    let h = TestHarness::new();
    let executor = h.executor(
        r#"
echo "/in/clip.mp4: Invalid data found when processing input" >&2
exit 1
"#,
        ExecutorConfig::default(),
    );
    let mut job = h.job("clip.mkv");

    let err = executor
        .execute(&mut job, &RecordingSink::new(), CancellationToken::new())
        .await
        .unwrap_err();

    let ExecutionError::ExitedNonZero { code, ref detail } = err else {
        panic!("expected ExitedNonZero");
    };
    assert_eq!(code, Some(1));
    assert!(detail.contains("Invalid data found"));
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job
        .error_detail
        .as_deref()
        .unwrap()
        .contains("Invalid data found"));
}

#[tokio::test]
async fn test_success_without_output_is_failure() {
    let h = TestHarness::new();
    let executor = h.executor(
        "echo 'muxer wrote to /elsewhere/clip.mkv' >&2\nexit 0",
        ExecutorConfig::default(),
    );
    let mut job = h.job("clip.mkv");

    let err = executor
        .execute(&mut job, &RecordingSink::new(), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionError::OutputArtifactMissing { .. }));
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.artifact_path.is_none());
    let detail = job.error_detail.as_deref().unwrap();
    assert!(detail.contains("produced no output"), "detail: {detail}");
    assert!(detail.contains("muxer wrote to /elsewhere/clip.mkv"), "detail: {detail}");
}

#[tokio::test]
async fn test_relocated_output_is_found() {
    let h = TestHarness::new();
    let executor = h.executor(
        r#"
actual="${last%.*}.webm"
echo "[download] Destination: $actual" >&2
printf 'relocated' > "$actual"
"#,
        ExecutorConfig::default(),
    );
    let mut job = h.job("clip.mkv");

    let outcome = executor
        .execute(&mut job, &RecordingSink::new(), CancellationToken::new())
        .await
        .unwrap();

    let actual = h.out_dir.path().join("clip.webm");
    assert_eq!(outcome.output_path, actual);
    assert_eq!(job.artifact_path, Some(actual));
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_cancellation_stops_process_tree() {
    let h = TestHarness::new();
    let leader_pid = h.pid_file("leader.pid");
    let child_pid = h.pid_file("child.pid");
    let executor = h.executor(
        &format!(
            r#"
sleep 60 &
echo $! > "{child}"
echo $$ > "{leader}"
printf 'out_time=00:00:01.000000\n'
wait
"#,
            child = child_pid.display(),
            leader = leader_pid.display(),
        ),
        ExecutorConfig::default(),
    );
    let mut job = h.job("clip.mkv");
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        let leader_pid = leader_pid.clone();
        let child_pid = child_pid.clone();
        async move {
            let pids = (read_pid(&leader_pid).await, read_pid(&child_pid).await);
            cancel.cancel();
            pids
        }
    };

    let sink = RecordingSink::new();
    let execution = executor.execute(&mut job, &sink, cancel.clone());
    let (result, (leader, child)) = tokio::time::timeout(Duration::from_secs(20), async {
        tokio::join!(execution, canceller)
    })
    .await
    .expect("cancelled job did not return");

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::Cancelled {
            reason: CancelReason::Requested,
            ..
        }
    ));
    assert!(err.is_cancellation());
    assert_eq!(job.status, JobStatus::Failed);
    assert!(wait_gone(leader).await, "ffmpeg process {} still running", leader);
    assert!(wait_gone(child).await, "child process {} still running", child);
}

#[tokio::test]
async fn test_timeout_stops_job() {
    let h = TestHarness::new();
    let child_pid = h.pid_file("child.pid");
    let executor = h.executor(
        &format!(
            "echo 'frame=  12 fps=3.0' >&2\nsleep 30 &\necho $! > \"{}\"\nwait",
            child_pid.display()
        ),
        ExecutorConfig::default().with_timeout(1),
    );
    let mut job = h.job("clip.mkv");

    let err = tokio::time::timeout(
        Duration::from_secs(20),
        executor.execute(&mut job, &RecordingSink::new(), CancellationToken::new()),
    )
    .await
    .expect("timed out job did not return")
    .unwrap_err();

    assert!(matches!(
        err,
        ExecutionError::Cancelled {
            reason: CancelReason::TimedOut,
            ..
        }
    ));
    assert!(err.is_retryable());
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job
        .error_detail
        .as_deref()
        .unwrap()
        .contains("frame=  12 fps=3.0"));

    let child = read_pid(&child_pid).await;
    assert!(wait_gone(child).await, "child process {} still running", child);
}

#[tokio::test]
async fn test_executed_job_cannot_run_again() {
    let h = TestHarness::new();
    let executor = h.executor("printf 'x' > \"$last\"", ExecutorConfig::default());
    let mut job = h.job("clip.mkv");

    executor
        .execute(&mut job, &RecordingSink::new(), CancellationToken::new())
        .await
        .unwrap();
    let err = executor
        .execute(&mut job, &RecordingSink::new(), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionError::NotPending { .. }));
    assert_eq!(job.status, JobStatus::Completed);
}
