//! Asynchronous job tracking
//!
//! Publishing and scheduling endpoints answer with a job id. The server
//! works through the job in the background; callers check on it with
//! [`JobStatusSource::job_status`] or block until it finishes with
//! [`wait_for_job`].

mod poller;

pub use poller::{
    wait_for_job, JobStatusSource, WaitOptions, DEFAULT_INITIAL_DELAY, DEFAULT_JITTER,
    DEFAULT_MAX_DELAY,
};

#[cfg(test)]
mod tests;
