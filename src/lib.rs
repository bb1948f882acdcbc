// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Publer client
//!
//! Typed async client for the Publer social media scheduling API.
//!
//! ## Features
//!
//! - **Posts**: list with filters, fetch, update, delete, publish, schedule,
//!   drafts, bulk operations, recurring, auto-schedule and recycling
//! - **Lazy pagination**: [`PageIterator`] fetches one page at a time
//! - **Jobs**: [`Client::wait_for_job`] polls with capped exponential
//!   backoff and jitter until a job finishes
//! - **Cancellation**: every call takes a [`Context`] carrying a
//!   cancellation token and an optional deadline
//! - **Mock backend**: [`MockServer`] simulates the API over real HTTP, with
//!   fault injection for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use publer_client::{Client, Context, ListPostsRequest, Result, WaitOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     let ctx = Context::background();
//!
//!     let drafts = client
//!         .list_posts(ListPostsRequest::new().state("draft"))
//!         .collect_all(&ctx)
//!         .await?;
//!
//!     let job = client.publish_post(&ctx, &request).await?;
//!     let result = client.wait_for_job(&ctx, &WaitOptions::new(job.job_id)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            Client                            │
//! │  posts · accounts · workspaces · users · job_status · wait   │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬────────────────┴──┬──────────────┬─────────────┐
//! │    HTTP    │    Pagination     │     Jobs     │   Context   │
//! ├────────────┼───────────────────┼──────────────┼─────────────┤
//! │ reqwest    │ PageFetcher       │ WaitOptions  │ cancel      │
//! │ auth hdrs  │ PageIterator      │ backoff      │ deadline    │
//! │ 429 mapping│ stream adapter    │ jitter       │             │
//! └────────────┴───────────────────┴──────────────┴─────────────┘
//!                               │
//! ┌──────────────────────────────────────────────────────────────┐
//! │            MockServer (axum) · MockState pipeline            │
//! │  auth → count → error rule → canned → resource handlers      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Domain types shared by the client and the mock backend
pub mod types;

/// Cancellation and deadlines
pub mod context;

/// Client configuration
pub mod config;

/// HTTP transport
pub mod http;

/// Page-number pagination
pub mod pagination;

/// Job polling
pub mod jobs;

/// API client
pub mod client;

/// Resource operations
pub mod resources;

/// Simulated backend
pub mod mock;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::Client;
pub use config::ClientConfig;
pub use context::Context;
pub use error::{Error, Result};
pub use jobs::WaitOptions;
pub use mock::MockServer;
pub use pagination::{Page, PageIterator};
pub use resources::{
    AutoScheduleRequest, BulkPost, BulkPostsRequest, CreateDraftPostRequest, DeletePostResponse,
    ListPostsRequest, PublishPostRequest, RecurrenceRule, RecurringPostRequest,
    RecyclePostRequest, SchedulePostRequest, UpdatePostRequest,
};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
