//! Job status operations

use crate::client::Client;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::jobs::{self, JobStatusSource, WaitOptions};
use crate::resources::posts::POST_ID_REGEX;
use crate::types::{JobResult, JobStatus};
use async_trait::async_trait;

impl Client {
    /// Current status of an asynchronous job
    pub async fn job_status(&self, ctx: &Context, job_id: &str) -> Result<JobStatus> {
        if job_id.is_empty() {
            return Err(Error::missing_field("job ID"));
        }
        // the id becomes a path segment
        if !POST_ID_REGEX.is_match(job_id) {
            return Err(Error::InvalidJobId {
                job_id: job_id.to_string(),
            });
        }
        self.http()
            .get_json(ctx, &format!("job_status/{job_id}"))
            .await
    }

    /// Poll a job until it finishes; see [`jobs::wait_for_job`]
    pub async fn wait_for_job(&self, ctx: &Context, opts: &WaitOptions) -> Result<JobResult> {
        jobs::wait_for_job(self, ctx, opts).await
    }
}

#[async_trait]
impl JobStatusSource for Client {
    async fn job_status(&self, ctx: &Context, job_id: &str) -> Result<JobStatus> {
        Client::job_status(self, ctx, job_id).await
    }
}
