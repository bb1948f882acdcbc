//! Job polling with exponential backoff and jitter

use crate::context::Context;
use crate::error::{Error, Result};
use crate::types::{JobResult, JobState, JobStatus};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay before the first status check
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
/// Upper bound for the backoff base
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
/// Exclusive upper bound for the random jitter added to each wait
pub const DEFAULT_JITTER: Duration = Duration::from_millis(500);

/// Polling configuration for [`wait_for_job`]
///
/// Zero durations fall back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    /// Job to wait for
    pub job_id: String,
    /// Delay before the first status check
    pub initial_delay: Duration,
    /// Cap for the doubling delay
    pub max_delay: Duration,
    /// Random jitter range `[0, jitter)`
    pub jitter: Duration,
}

impl WaitOptions {
    /// Options for `job_id` with default timing
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Default::default()
        }
    }

    /// Set the initial delay
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the jitter range
    #[must_use]
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Timing with defaults substituted: `(initial, max, jitter)`
    pub fn resolved(&self) -> (Duration, Duration, Duration) {
        let or_default = |value: Duration, default: Duration| {
            if value.is_zero() {
                default
            } else {
                value
            }
        };
        (
            or_default(self.initial_delay, DEFAULT_INITIAL_DELAY),
            or_default(self.max_delay, DEFAULT_MAX_DELAY),
            or_default(self.jitter, DEFAULT_JITTER),
        )
    }
}

/// Anything that can report the status of a job
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    /// Current status of `job_id`
    async fn job_status(&self, ctx: &Context, job_id: &str) -> Result<JobStatus>;
}

/// Poll `source` until the job reaches a terminal state.
///
/// Waits before every check. While the job is pending, working or
/// processing, the wait doubles up to the maximum and gets a random jitter
/// on top. Returns the job result on completion and
/// [`Error::JobTerminated`] (carrying the result) on failure or
/// cancellation. Status strings outside the known set are rejected with
/// [`Error::UnknownJobStatus`].
///
/// There is no attempt limit: pass a context with a deadline.
pub async fn wait_for_job<S>(source: &S, ctx: &Context, opts: &WaitOptions) -> Result<JobResult>
where
    S: JobStatusSource + ?Sized,
{
    let (initial_delay, max_delay, jitter) = opts.resolved();
    let mut base = initial_delay;
    let mut delay = initial_delay;

    loop {
        ctx.sleep(delay).await?;

        let status = source.job_status(ctx, &opts.job_id).await?;
        match status.status {
            JobState::Completed => {
                debug!("Job {} completed", opts.job_id);
                return Ok(status.result.unwrap_or_else(JobResult::succeeded));
            }
            state @ (JobState::Failed | JobState::Cancelled) => {
                let message = if status.error.is_empty() {
                    status
                        .result
                        .as_ref()
                        .map(|r| r.error.clone())
                        .unwrap_or_default()
                } else {
                    status.error.clone()
                };
                let result = status
                    .result
                    .unwrap_or_else(|| JobResult::failure(status.error));
                warn!("Job {} ended as {}: {}", opts.job_id, state, message);
                return Err(Error::JobTerminated {
                    status: state,
                    message,
                    result: Box::new(result),
                });
            }
            JobState::Pending | JobState::Working | JobState::Processing => {
                base = next_backoff(base, max_delay);
                delay = base + random_jitter(jitter);
                debug!(
                    "Job {} is {} ({}%), next check in {:?}",
                    opts.job_id, status.status, status.progress, delay
                );
            }
            JobState::Unknown(status) => {
                return Err(Error::UnknownJobStatus { status });
            }
        }
    }
}

/// Double the backoff base, capped at `max`
pub(crate) fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

/// Uniform random duration in `[0, upper)` with millisecond granularity
pub(crate) fn random_jitter(upper: Duration) -> Duration {
    let upper_ms = upper.as_millis() as u64;
    if upper_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..upper_ms))
}
