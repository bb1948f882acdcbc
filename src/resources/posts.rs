//! Post operations
//!
//! Listing (paginated, filtered), single-post management, immediate and
//! scheduled publishing, bulk variants, and the advanced scheduling modes
//! (recurring, auto-schedule, recycle). Every creating call answers with a
//! job id to be polled through [`Client::wait_for_job`].

use crate::client::Client;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::http::RequestConfig;
use crate::pagination::{Page, PageFetcher, PageIterator};
use crate::types::{JobCreated, Media, Post};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Allowed post and job id characters
pub(crate) static POST_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

/// Visibility for a private draft
pub const DRAFT_PRIVATE: &str = "draft_private";
/// Visibility for a draft shared with the workspace
pub const DRAFT_PUBLIC: &str = "draft_public";

// ============================================================================
// Request / Response Types
// ============================================================================

/// Filters for [`Client::list_posts`]
///
/// Empty fields are left out of the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPostsRequest {
    /// Exact state (`scheduled`, `published`, `draft`, ...)
    pub state: String,
    /// Any of these states
    pub states: Vec<String>,
    /// Scheduled at or after
    pub from: Option<DateTime<Utc>>,
    /// Scheduled at or before
    pub to: Option<DateTime<Utc>>,
    /// Any of these accounts
    pub account_ids: Vec<String>,
    /// Substring of the post text
    pub query: String,
    /// Exact post type (`status`, `photo`, `video`, ...)
    pub post_type: String,
    /// Author user id
    pub member_id: String,
}

impl ListPostsRequest {
    /// Create an unfiltered request
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by exact state
    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Filter by any of several states
    #[must_use]
    pub fn states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = states.into_iter().map(Into::into).collect();
        self
    }

    /// Filter by scheduled time range (inclusive)
    #[must_use]
    pub fn date_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Filter by any of several accounts
    #[must_use]
    pub fn account_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.account_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Filter by text substring
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Filter by post type
    #[must_use]
    pub fn post_type(mut self, post_type: impl Into<String>) -> Self {
        self.post_type = post_type.into();
        self
    }

    /// Filter by author
    #[must_use]
    pub fn member_id(mut self, member_id: impl Into<String>) -> Self {
        self.member_id = member_id.into();
        self
    }

    /// Query parameters for `page` (omitted when 0)
    pub fn to_query(&self, page: u32) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        if !self.state.is_empty() {
            push("state", self.state.clone());
        }
        for state in &self.states {
            push("state[]", state.clone());
        }
        if let Some(from) = self.from {
            push("from", from.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        if let Some(to) = self.to {
            push("to", to.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        if page > 0 {
            push("page", page.to_string());
        }
        for id in &self.account_ids {
            push("account_ids[]", id.clone());
        }
        if !self.query.is_empty() {
            push("query", self.query.clone());
        }
        if !self.post_type.is_empty() {
            push("postType", self.post_type.clone());
        }
        if !self.member_id.is_empty() {
            push("member_id", self.member_id.clone());
        }
        params
    }
}

/// Body of `GET posts`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListPostsResponse {
    pub posts: Vec<Post>,
    pub total: u32,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl From<ListPostsResponse> for Page<Post> {
    fn from(resp: ListPostsResponse) -> Self {
        Page {
            items: resp.posts,
            total: resp.total,
            page: resp.page,
            per_page: resp.per_page,
            total_pages: resp.total_pages,
        }
    }
}

/// Immediate publication of one post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishPostRequest {
    pub text: String,
    pub accounts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
}

/// One entry of a bulk publish or bulk schedule request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkPost {
    pub text: String,
    pub accounts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
}

/// Bulk publish or bulk schedule request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkPostsRequest {
    pub posts: Vec<BulkPost>,
}

/// Scheduled publication of one post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulePostRequest {
    pub scheduled_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub timezone: String,
    pub accounts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    pub text: String,
}

/// Draft creation; `visibility` is [`DRAFT_PRIVATE`] or [`DRAFT_PUBLIC`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateDraftPostRequest {
    pub visibility: String,
    pub accounts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    pub text: String,
}

/// Partial update; empty fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePostRequest {
    #[serde(skip)]
    pub post_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl UpdatePostRequest {
    /// Update for `post_id` that changes nothing yet
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            ..Default::default()
        }
    }

    /// Replace the text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Move the scheduled time
    #[must_use]
    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    /// Replace the media
    #[must_use]
    pub fn media(mut self, media: Vec<Media>) -> Self {
        self.media = media;
        self
    }
}

/// Body of `DELETE posts/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletePostResponse {
    pub success: bool,
    pub message: String,
}

/// How a recurring post repeats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceRule {
    /// `daily`, `weekly` or `monthly`
    pub frequency: String,
    /// Every N periods
    pub interval: u32,
    /// Weekdays for weekly rules, e.g. `["monday", "friday"]`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Alternative to `end_date`
    #[serde(skip_serializing_if = "is_zero")]
    pub count: u32,
}

/// Recurring post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurringPostRequest {
    pub text: String,
    pub accounts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    pub recurrence: RecurrenceRule,
}

/// Spread `slots` publications of one post over a date range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoScheduleRequest {
    pub text: String,
    pub accounts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub slots: u32,
}

/// Republish an existing post periodically
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecyclePostRequest {
    pub post_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub frequency: String,
    pub max_count: u32,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &u32) -> bool {
    *n == 0
}

// ============================================================================
// Validation
// ============================================================================

/// Reject post ids that could escape the `posts/` path segment
pub fn validate_post_id(post_id: &str) -> Result<()> {
    if post_id.is_empty() {
        return Err(Error::invalid_post_id("post ID cannot be empty"));
    }
    if post_id.contains("..") || post_id.contains('/') || post_id.contains('\\') {
        return Err(Error::invalid_post_id("post ID contains invalid characters"));
    }
    if !POST_ID_REGEX.is_match(post_id) {
        return Err(Error::invalid_post_id(
            "post ID must contain only alphanumeric characters, hyphens, and underscores",
        ));
    }
    Ok(())
}

// ============================================================================
// Fetcher
// ============================================================================

/// Fetches pages of `GET posts` for one filter set
#[derive(Debug, Clone)]
pub struct PostPageFetcher {
    client: Client,
    request: ListPostsRequest,
}

impl PostPageFetcher {
    /// Create a fetcher for `request`
    pub fn new(client: Client, request: ListPostsRequest) -> Self {
        Self { client, request }
    }
}

#[async_trait]
impl PageFetcher for PostPageFetcher {
    type Item = Post;

    async fn fetch_page(&self, ctx: &Context, page: u32) -> Result<Page<Post>> {
        let mut config = RequestConfig::new();
        config.query = self.request.to_query(page);
        let resp: ListPostsResponse = self
            .client
            .http()
            .request_json(ctx, Method::GET, "posts", config)
            .await?;
        Ok(resp.into())
    }
}

/// Iterator over filtered posts
pub type PostIterator = PageIterator<PostPageFetcher>;

// ============================================================================
// Operations
// ============================================================================

impl Client {
    /// Lazily iterate posts matching `request`
    pub fn list_posts(&self, request: ListPostsRequest) -> PostIterator {
        PageIterator::new(PostPageFetcher::new(self.clone(), request))
    }

    /// Posts in one state
    pub fn posts_by_state(&self, state: impl Into<String>) -> PostIterator {
        self.list_posts(ListPostsRequest::new().state(state))
    }

    /// Posts scheduled within `[from, to]`
    pub fn posts_by_date_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> PostIterator {
        self.list_posts(ListPostsRequest::new().date_range(from, to))
    }

    /// Posts for one account
    pub fn posts_by_account(&self, account_id: impl Into<String>) -> PostIterator {
        self.list_posts(ListPostsRequest::new().account_ids([account_id.into()]))
    }

    /// Posts whose text contains `query`
    pub fn posts_by_query(&self, query: impl Into<String>) -> PostIterator {
        self.list_posts(ListPostsRequest::new().query(query))
    }

    /// Fetch one post
    pub async fn get_post(&self, ctx: &Context, post_id: &str) -> Result<Post> {
        validate_post_id(post_id)?;
        self.http().get_json(ctx, &format!("posts/{post_id}")).await
    }

    /// Apply a partial update and return the updated post
    pub async fn update_post(&self, ctx: &Context, request: &UpdatePostRequest) -> Result<Post> {
        validate_post_id(&request.post_id)?;
        let config = RequestConfig::new().json_from(request)?;
        self.http()
            .request_json(
                ctx,
                Method::PATCH,
                &format!("posts/{}", request.post_id),
                config,
            )
            .await
    }

    /// Delete one post
    pub async fn delete_post(&self, ctx: &Context, post_id: &str) -> Result<DeletePostResponse> {
        validate_post_id(post_id)?;
        self.http()
            .request_json(
                ctx,
                Method::DELETE,
                &format!("posts/{post_id}"),
                RequestConfig::new(),
            )
            .await
    }

    /// Publish one post now
    pub async fn publish_post(
        &self,
        ctx: &Context,
        request: &PublishPostRequest,
    ) -> Result<JobCreated> {
        self.http()
            .post_json(ctx, "posts/schedule/publish", request)
            .await
    }

    /// Publish several posts now in one job
    pub async fn bulk_publish_posts(
        &self,
        ctx: &Context,
        request: &BulkPostsRequest,
    ) -> Result<JobCreated> {
        self.http()
            .post_json(ctx, "posts/schedule/publish", request)
            .await
    }

    /// Schedule one post
    pub async fn schedule_post(
        &self,
        ctx: &Context,
        request: &SchedulePostRequest,
    ) -> Result<JobCreated> {
        self.http().post_json(ctx, "posts/schedule", request).await
    }

    /// Create a draft
    pub async fn create_draft_post(
        &self,
        ctx: &Context,
        request: &CreateDraftPostRequest,
    ) -> Result<JobCreated> {
        self.http().post_json(ctx, "posts/schedule", request).await
    }

    /// Schedule several posts in one job
    pub async fn bulk_schedule_posts(
        &self,
        ctx: &Context,
        request: &BulkPostsRequest,
    ) -> Result<JobCreated> {
        self.http().post_json(ctx, "posts/schedule", request).await
    }

    /// Set up a recurring post
    pub async fn create_recurring_post(
        &self,
        ctx: &Context,
        request: &RecurringPostRequest,
    ) -> Result<JobCreated> {
        self.http().post_json(ctx, "posts/recurring", request).await
    }

    /// Let the server pick publication times within a date range
    pub async fn auto_schedule_post(
        &self,
        ctx: &Context,
        request: &AutoScheduleRequest,
    ) -> Result<JobCreated> {
        self.http()
            .post_json(ctx, "posts/auto-schedule", request)
            .await
    }

    /// Republish an existing post on a schedule
    pub async fn recycle_post(
        &self,
        ctx: &Context,
        request: &RecyclePostRequest,
    ) -> Result<JobCreated> {
        self.http().post_json(ctx, "posts/recycle", request).await
    }
}
