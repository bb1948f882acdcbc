//! Tests for the job poller

use super::poller::{next_backoff, random_jitter};
use super::*;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::types::{JobResult, JobState, JobStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Replays a fixed sequence of statuses; the last one repeats forever
struct ScriptedSource {
    script: Mutex<VecDeque<Result<JobStatus>>>,
    last: Mutex<Option<JobStatus>>,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    fn new(statuses: Vec<JobStatus>) -> Self {
        Self {
            script: Mutex::new(statuses.into_iter().map(Ok).collect()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(err: Error) -> Self {
        let source = Self::new(Vec::new());
        source.script.lock().unwrap().push_back(Err(err));
        source
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl JobStatusSource for ScriptedSource {
    async fn job_status(&self, _ctx: &Context, _job_id: &str) -> Result<JobStatus> {
        self.calls.lock().unwrap().push(Instant::now());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(status)) => {
                *self.last.lock().unwrap() = Some(status.clone());
                Ok(status)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| Error::api("GET", "job_status/x", 404, "Job not found")),
        }
    }
}

fn fast(job_id: &str) -> WaitOptions {
    WaitOptions::new(job_id)
        .initial_delay(Duration::from_millis(10))
        .max_delay(Duration::from_millis(100))
        .jitter(Duration::from_millis(5))
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_wait_options_defaults() {
    let (initial, max, jitter) = WaitOptions::new("job-1").resolved();
    assert_eq!(initial, DEFAULT_INITIAL_DELAY);
    assert_eq!(max, DEFAULT_MAX_DELAY);
    assert_eq!(jitter, DEFAULT_JITTER);
    assert_eq!(initial, Duration::from_secs(1));
    assert_eq!(max, Duration::from_secs(30));
    assert_eq!(jitter, Duration::from_millis(500));
}

#[test]
fn test_wait_options_overrides() {
    let (initial, max, jitter) = fast("job-1").resolved();
    assert_eq!(initial, Duration::from_millis(10));
    assert_eq!(max, Duration::from_millis(100));
    assert_eq!(jitter, Duration::from_millis(5));
}

#[test]
fn test_next_backoff_doubles_and_caps() {
    let max = Duration::from_millis(100);
    assert_eq!(next_backoff(Duration::from_millis(10), max), Duration::from_millis(20));
    assert_eq!(next_backoff(Duration::from_millis(60), max), max);
    assert_eq!(next_backoff(max, max), max);
}

#[test]
fn test_random_jitter_bounds() {
    assert_eq!(random_jitter(Duration::ZERO), Duration::ZERO);
    assert_eq!(random_jitter(Duration::from_millis(1)), Duration::ZERO);
    for _ in 0..100 {
        assert!(random_jitter(Duration::from_millis(50)) < Duration::from_millis(50));
    }
}

// ============================================================================
// Terminal states
// ============================================================================

#[tokio::test]
async fn test_wait_completed_returns_result() {
    let expected = JobResult::succeeded()
        .with_post_ids(["post-456"])
        .with_data("post_id", "12345");
    let source = ScriptedSource::new(vec![
        JobStatus::new("job-1", JobState::Completed, 100).with_result(expected.clone())
    ]);

    let result = wait_for_job(&source, &Context::background(), &fast("job-1"))
        .await
        .unwrap();
    assert_eq!(result, expected);
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn test_wait_completed_without_result_defaults_to_success() {
    let source = ScriptedSource::new(vec![JobStatus::new("job-1", "completed", 100)]);
    let result = wait_for_job(&source, &Context::background(), &fast("job-1"))
        .await
        .unwrap();
    assert!(result.success);
    assert!(result.post_ids.is_empty());
}

#[tokio::test]
async fn test_wait_failed_carries_result() {
    let source = ScriptedSource::new(vec![JobStatus::new("job-1", "failed", 0)
        .with_result(JobResult::failure("Processing failed"))
        .with_error("Processing failed")]);

    let err = wait_for_job(&source, &Context::background(), &fast("job-1"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("failed"));
    assert_eq!(err.to_string(), "job failed: Processing failed");
    let result = err.job_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.error, "Processing failed");
}

#[tokio::test]
async fn test_wait_failed_without_result_builds_failure() {
    let source = ScriptedSource::new(vec![
        JobStatus::new("job-1", "failed", 10).with_error("account disconnected")
    ]);

    let err = wait_for_job(&source, &Context::background(), &fast("job-1"))
        .await
        .unwrap_err();
    let result = err.job_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.error, "account disconnected");
}

#[tokio::test]
async fn test_wait_cancelled_job_is_terminal() {
    let source = ScriptedSource::new(vec![
        JobStatus::new("job-1", "cancelled", 40).with_error("cancelled by user")
    ]);

    let err = wait_for_job(&source, &Context::background(), &fast("job-1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::JobTerminated {
            status: JobState::Cancelled,
            ..
        }
    ));
    assert_eq!(err.to_string(), "job cancelled: cancelled by user");
    assert!(!err.is_cancellation());
}

#[tokio::test]
async fn test_wait_unknown_status_fails_closed() {
    let source = ScriptedSource::new(vec![JobStatus::new("job-1", "exploded", 0)]);

    let err = wait_for_job(&source, &Context::background(), &fast("job-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownJobStatus { ref status } if status == "exploded"));
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn test_wait_propagates_status_errors_without_retry() {
    let source = ScriptedSource::failing(Error::api("GET", "job_status/job-1", 500, "boom"));

    let err = wait_for_job(&source, &Context::background(), &fast("job-1"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(source.call_count(), 1);
}

// ============================================================================
// Progression and timing
// ============================================================================

#[tokio::test]
async fn test_wait_follows_progression() {
    let source = ScriptedSource::new(vec![
        JobStatus::new("job-1", "pending", 0),
        JobStatus::new("job-1", "working", 30),
        JobStatus::new("job-1", "processing", 80),
        JobStatus::new("job-1", "completed", 100)
            .with_result(JobResult::succeeded().with_post_ids(["p1", "p2"])),
    ]);

    let opts = WaitOptions::new("job-1")
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(4))
        .jitter(Duration::from_millis(1));
    let result = wait_for_job(&source, &Context::background(), &opts)
        .await
        .unwrap();

    assert_eq!(result.post_ids, vec!["p1", "p2"]);
    assert_eq!(source.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_wait_backoff_schedule() {
    let source = ScriptedSource::new(vec![JobStatus::new("job-1", "working", 50)]);
    let opts = WaitOptions::new("job-1")
        .initial_delay(Duration::from_millis(10))
        .max_delay(Duration::from_millis(80))
        .jitter(Duration::from_millis(1));
    let ctx = Context::background().with_timeout(Duration::from_millis(300));
    let started = Instant::now();

    let err = wait_for_job(&source, &ctx, &opts).await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded));

    let times = source.call_times();
    let mut offsets = Vec::new();
    let mut prev = started;
    for t in &times {
        offsets.push((*t - prev).as_millis());
        prev = *t;
    }
    // 10, then doubling 20, 40, 80 and capped at 80 after that
    assert_eq!(offsets, vec![10, 20, 40, 80, 80]);
}

#[tokio::test(start_paused = true)]
async fn test_wait_deadline_while_stuck_working() {
    let source = ScriptedSource::new(vec![JobStatus::new("job-1", "working", 50)]);
    let ctx = Context::background().with_timeout(Duration::from_millis(50));
    let opts = WaitOptions::new("job-1").initial_delay(Duration::from_millis(100));
    let started = Instant::now();

    let err = wait_for_job(&source, &ctx, &opts).await.unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded));
    assert!(err.is_cancellation());
    assert_eq!(started.elapsed(), Duration::from_millis(50));
    assert_eq!(source.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_deadline_is_not_overshot() {
    let source = ScriptedSource::new(vec![JobStatus::new("job-1", "processing", 10)]);
    let ctx = Context::background().with_timeout(Duration::from_millis(250));
    let started = Instant::now();

    let err = wait_for_job(&source, &ctx, &fast("job-1")).await.unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(250));
    assert!(elapsed < Duration::from_millis(250) + Duration::from_millis(105));
    assert!(source.call_count() >= 2);
}

#[tokio::test]
async fn test_wait_cancelled_while_waiting() {
    let source = ScriptedSource::new(vec![JobStatus::new("job-1", "pending", 0)]);
    let ctx = Context::background().with_cancel();
    let canceller = ctx.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel();
    });

    let opts = WaitOptions::new("job-1").initial_delay(Duration::from_secs(5));
    let err = wait_for_job(&source, &ctx, &opts).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(source.call_count(), 0);
}
