//! Resource handlers of the simulated backend

use super::filter::{parse_page, PostFilter};
use super::state::{MockRequest, MockResponse, MockState};
use crate::pagination::Page;
use crate::resources::{
    AutoScheduleRequest, BulkPostsRequest, CreateDraftPostRequest, DeletePostResponse,
    ListAccountsResponse, ListPostsResponse, ListWorkspacesResponse, PublishPostRequest,
    RecurringPostRequest, RecyclePostRequest, SchedulePostRequest, UpdatePostRequest,
    DRAFT_PRIVATE, DRAFT_PUBLIC,
};
use crate::types::{JobCreated, JobState, JobStatus, JsonValue};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

/// Path prefix of every simulated endpoint
pub const API_PREFIX: &str = "/api/v1/";

type HandlerResult = std::result::Result<MockResponse, MockResponse>;

impl MockState {
    /// Dispatch an authenticated request to its resource handler
    pub(crate) fn route(&mut self, req: &MockRequest) -> MockResponse {
        let Some(rest) = req.path.strip_prefix(API_PREFIX) else {
            return MockResponse::not_found("Endpoint not found");
        };
        let segments: Vec<&str> = rest.trim_end_matches('/').split('/').collect();

        let result = match (req.method.as_str(), segments.as_slice()) {
            ("GET", ["test"]) => Ok(MockResponse::ok(&json!({"status": "ok"}))),
            ("GET", ["posts"]) => self.list_posts(req),
            ("GET", ["posts", id]) => self.get_post(id),
            ("PATCH", ["posts", id]) => self.update_post(id, req),
            ("DELETE", ["posts", id]) => self.delete_post(id),
            ("POST", ["posts", "schedule", "publish"]) => self.publish(req),
            ("POST", ["posts", "schedule"]) => self.schedule(req),
            ("POST", ["posts", "recurring"]) => self.recurring(req),
            ("POST", ["posts", "auto-schedule"]) => self.auto_schedule(req),
            ("POST", ["posts", "recycle"]) => self.recycle(req),
            ("GET", ["accounts"]) => self.list_accounts(req),
            ("GET", ["workspaces"]) => self.list_workspaces(req),
            ("GET", ["users", "me"]) => self.me(),
            ("GET", ["job_status", id]) => self.job_status(id),
            ("GET", ["job_status"]) => Err(MockResponse::bad_request("Invalid job ID")),
            _ => Err(MockResponse::not_found("Endpoint not found")),
        };
        result.unwrap_or_else(|err| err)
    }

    // ========================================================================
    // Listing
    // ========================================================================

    fn list_posts(&self, req: &MockRequest) -> HandlerResult {
        let filter = PostFilter::from_query(&req.query).map_err(MockResponse::bad_request)?;
        let page = parse_page(&req.query).map_err(MockResponse::bad_request)?;

        let matching: Vec<_> = self
            .posts
            .iter()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        let page = Page::from_slice(&matching, page, self.page_size);

        Ok(MockResponse::ok(&ListPostsResponse {
            posts: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        }))
    }

    fn list_accounts(&self, req: &MockRequest) -> HandlerResult {
        let page = parse_page(&req.query).map_err(MockResponse::bad_request)?;
        let page = Page::from_slice(&self.accounts, page, self.page_size);
        Ok(MockResponse::ok(&ListAccountsResponse {
            accounts: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        }))
    }

    fn list_workspaces(&self, req: &MockRequest) -> HandlerResult {
        let page = parse_page(&req.query).map_err(MockResponse::bad_request)?;
        let page = Page::from_slice(&self.workspaces, page, self.page_size);
        Ok(MockResponse::ok(&ListWorkspacesResponse {
            workspaces: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        }))
    }

    fn me(&self) -> HandlerResult {
        self.current_user
            .as_ref()
            .map(MockResponse::ok)
            .ok_or_else(|| MockResponse::not_found("User not found"))
    }

    // ========================================================================
    // Single posts
    // ========================================================================

    fn get_post(&self, id: &str) -> HandlerResult {
        self.posts
            .iter()
            .find(|p| p.id == id)
            .map(MockResponse::ok)
            .ok_or_else(post_not_found)
    }

    fn update_post(&mut self, id: &str, req: &MockRequest) -> HandlerResult {
        let update: UpdatePostRequest = parse_body(&req.body)?;
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(post_not_found)?;

        if !update.text.is_empty() {
            post.text = update.text;
        }
        if update.scheduled_at.is_some() {
            post.scheduled_at = update.scheduled_at;
        }
        if !update.media.is_empty() {
            post.has_media = true;
        }
        Ok(MockResponse::ok(&*post))
    }

    fn delete_post(&mut self, id: &str) -> HandlerResult {
        let index = self
            .posts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(post_not_found)?;
        self.posts.remove(index);
        Ok(MockResponse::ok(&DeletePostResponse {
            success: true,
            message: "Post deleted successfully".to_string(),
        }))
    }

    // ========================================================================
    // Publishing and scheduling
    // ========================================================================

    fn publish(&mut self, req: &MockRequest) -> HandlerResult {
        let body = parse_object(&req.body)?;
        if body.get("posts").is_some() {
            let bulk: BulkPostsRequest = from_value(body, "Invalid bulk request format")?;
            self.check_bulk_limit(bulk.posts.len())?;
        } else {
            let _: PublishPostRequest = from_value(body, "Invalid publish request format")?;
        }
        Ok(self.create_job("job-"))
    }

    fn schedule(&mut self, req: &MockRequest) -> HandlerResult {
        let body = parse_object(&req.body)?;
        let now = Utc::now();

        if body.get("posts").is_some() {
            let bulk: BulkPostsRequest = from_value(body, "Invalid bulk request format")?;
            self.check_bulk_limit(bulk.posts.len())?;
            for (i, post) in bulk.posts.iter().enumerate() {
                if !post.scheduled_at.is_some_and(|at| at > now) {
                    return Err(MockResponse::bad_request(format!(
                        "Post {}: Scheduled time must be in the future",
                        i + 1
                    )));
                }
            }
        } else if body.get("visibility").is_some() {
            let draft: CreateDraftPostRequest = from_value(body, "Invalid draft request format")?;
            if draft.visibility != DRAFT_PRIVATE && draft.visibility != DRAFT_PUBLIC {
                return Err(MockResponse::bad_request(
                    "Invalid visibility. Must be draft_private or draft_public",
                ));
            }
        } else {
            let scheduled: SchedulePostRequest =
                from_value(body, "Invalid schedule request format")?;
            if scheduled.scheduled_at <= now {
                return Err(MockResponse::bad_request(
                    "Scheduled time must be in the future",
                ));
            }
        }
        Ok(self.create_job("job-"))
    }

    fn recurring(&mut self, req: &MockRequest) -> HandlerResult {
        let request: RecurringPostRequest = parse_body(&req.body)?;
        if request.text.is_empty() {
            return Err(MockResponse::bad_request("Text field is required"));
        }
        if request.accounts.is_empty() {
            return Err(MockResponse::bad_request("At least one account is required"));
        }
        if request.recurrence.frequency.is_empty() {
            return Err(MockResponse::bad_request("Recurrence frequency is required"));
        }
        Ok(self.create_job("recurring-"))
    }

    fn auto_schedule(&mut self, req: &MockRequest) -> HandlerResult {
        let request: AutoScheduleRequest = parse_body(&req.body)?;
        if request.text.is_empty() {
            return Err(MockResponse::bad_request("Text field is required"));
        }
        if request.accounts.is_empty() {
            return Err(MockResponse::bad_request("At least one account is required"));
        }
        if request.slots == 0 {
            return Err(MockResponse::bad_request("Slots must be greater than 0"));
        }
        if request.end_date <= request.start_date {
            return Err(MockResponse::bad_request("End date must be after start date"));
        }
        Ok(self.create_job("auto-schedule-"))
    }

    fn recycle(&mut self, req: &MockRequest) -> HandlerResult {
        let request: RecyclePostRequest = parse_body(&req.body)?;
        if request.post_id.is_empty() {
            return Err(MockResponse::bad_request("Post ID is required"));
        }
        if request.frequency.is_empty() {
            return Err(MockResponse::bad_request("Frequency is required"));
        }
        if request.max_count == 0 {
            return Err(MockResponse::bad_request("Max count must be greater than 0"));
        }
        if request.end_date <= request.start_date {
            return Err(MockResponse::bad_request("End date must be after start date"));
        }
        if !self.posts.iter().any(|p| p.id == request.post_id) {
            return Err(post_not_found());
        }
        Ok(self.create_job("recycle-"))
    }

    // ========================================================================
    // Jobs
    // ========================================================================

    fn job_status(&self, id: &str) -> HandlerResult {
        if id.is_empty() {
            return Err(MockResponse::bad_request("Invalid job ID"));
        }
        self.job(id)
            .map(MockResponse::ok)
            .ok_or_else(|| MockResponse::not_found("Job not found"))
    }

    /// Register a pending job and answer with its id
    fn create_job(&mut self, prefix: &str) -> MockResponse {
        let job_id = format!("{prefix}{}", Uuid::new_v4().simple());
        self.jobs.insert(
            job_id.clone(),
            JobStatus::new(job_id.clone(), JobState::Pending, 0),
        );
        debug!("mock: created job {}", job_id);
        MockResponse::ok(&JobCreated { job_id })
    }

    fn check_bulk_limit(&self, count: usize) -> std::result::Result<(), MockResponse> {
        match self.bulk_limit {
            Some(limit) if count > limit => {
                Err(MockResponse::bad_request("Bulk operation limit exceeded"))
            }
            _ => Ok(()),
        }
    }
}

fn post_not_found() -> MockResponse {
    MockResponse::not_found("Post not found")
}

/// Decode the body as a JSON object
fn parse_object(body: &[u8]) -> std::result::Result<JsonValue, MockResponse> {
    match serde_json::from_slice::<JsonValue>(body) {
        Ok(value @ JsonValue::Object(_)) => Ok(value),
        _ => Err(MockResponse::bad_request("Invalid JSON payload")),
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> std::result::Result<T, MockResponse> {
    from_value(parse_object(body)?, "Invalid request format")
}

fn from_value<T: DeserializeOwned>(
    value: JsonValue,
    message: &str,
) -> std::result::Result<T, MockResponse> {
    serde_json::from_value(value).map_err(|_| MockResponse::bad_request(message))
}
