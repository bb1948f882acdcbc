//! Tests for the simulated backend

use super::*;
use crate::context::Context;
use crate::error::Error;
use crate::resources::{ListPostsRequest, PublishPostRequest};
use crate::types::{JobState, JobStatus, Post, User};
use chrono::{Duration as ChronoDuration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;

const KEY: &str = "key-1";
const WS: &str = "ws-1";

fn state() -> MockState {
    MockState::new(KEY, WS)
}

fn authed(method: &str, path: &str) -> MockRequest {
    MockRequest::new(method, format!("{API_PREFIX}{path}"))
        .header("Authorization", format!("Bearer-API {KEY}"))
        .header("Publer-Workspace-Id", WS)
}

fn body(resp: &MockResponse) -> &Value {
    resp.body.as_ref().expect("response body")
}

fn posts(n: usize) -> Vec<Post> {
    (1..=n)
        .map(|i| Post {
            id: format!("p{i}"),
            text: format!("post {i}"),
            state: if i % 2 == 0 { "draft" } else { "scheduled" }.to_string(),
            account_id: "acc-1".to_string(),
            ..Default::default()
        })
        .collect()
}

// ============================================================================
// Authentication
// ============================================================================

#[test]
fn test_missing_api_key_is_unauthorized() {
    let mut state = state();
    let resp = state.handle(&MockRequest::new("GET", "/api/v1/posts"));
    assert_eq!(resp.status, 401);
    assert_eq!(body(&resp)["error"], "unauthorized");
    assert_eq!(body(&resp)["message"], "Missing or invalid API key");
}

#[test]
fn test_wrong_scheme_is_unauthorized() {
    let mut state = state();
    let req = MockRequest::new("GET", "/api/v1/posts")
        .header("Authorization", format!("Bearer {KEY}"))
        .header("Publer-Workspace-Id", WS);
    assert_eq!(state.handle(&req).status, 401);
}

#[test]
fn test_bad_workspace_is_bad_request() {
    let mut state = state();
    let req = MockRequest::new("GET", "/api/v1/posts")
        .header("authorization", format!("Bearer-API {KEY}"))
        .header("publer-workspace-id", "other");
    let resp = state.handle(&req);
    assert_eq!(resp.status, 400);
    assert_eq!(body(&resp)["message"], "Missing or invalid workspace ID");
}

#[test]
fn test_rejected_requests_are_not_counted() {
    let mut state = state();
    state.handle(&MockRequest::new("GET", "/api/v1/posts"));
    assert_eq!(state.call_count("GET", "/api/v1/posts"), 0);

    state.handle(&authed("GET", "posts"));
    assert_eq!(state.call_count("GET", "/api/v1/posts"), 1);
}

// ============================================================================
// Fault injection
// ============================================================================

#[test]
fn test_error_rule_fires_from_threshold() {
    let mut state = state();
    state.error_rules.insert(
        endpoint_key("GET", "/api/v1/posts"),
        ErrorRule {
            threshold: 3,
            status: 429,
            body: Some(json!({"error": "rate_limited"})),
            headers: vec![("X-RateLimit-Limit".to_string(), "100".to_string())],
        },
    );

    let statuses: Vec<u16> = (0..4)
        .map(|_| state.handle(&authed("GET", "posts")).status)
        .collect();
    assert_eq!(statuses, vec![200, 200, 429, 429]);

    let resp = state.handle(&authed("GET", "posts"));
    assert_eq!(
        resp.headers,
        vec![("X-RateLimit-Limit".to_string(), "100".to_string())]
    );
}

#[test]
fn test_canned_response_overrides_handler() {
    let mut state = state();
    state.responses.insert(
        endpoint_key("GET", "/api/v1/users/me"),
        CannedResponse {
            status: 503,
            body: None,
        },
    );
    let resp = state.handle(&authed("GET", "users/me"));
    assert_eq!(resp.status, 503);
    assert!(resp.body.is_none());
}

#[test]
fn test_reset_keeps_credentials() {
    let mut state = state();
    state.posts = posts(3);
    state.bulk_limit = Some(1);
    state.handle(&authed("GET", "posts"));

    state.reset();

    assert!(state.posts.is_empty());
    assert_eq!(state.bulk_limit, None);
    assert_eq!(state.page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(state.call_count("GET", "/api/v1/posts"), 0);
    assert_eq!(state.handle(&authed("GET", "posts")).status, 200);
}

// ============================================================================
// Routing and resources
// ============================================================================

#[test]
fn test_unknown_endpoint() {
    let mut state = state();
    let resp = state.handle(&authed("GET", "nope"));
    assert_eq!(resp.status, 404);
    assert_eq!(body(&resp)["message"], "Endpoint not found");

    let resp = state.handle(&authed("PUT", "posts/p1"));
    assert_eq!(resp.status, 404);
}

#[test]
fn test_list_posts_pages_and_filters() {
    let mut state = state();
    state.posts = posts(25);

    let first = state.handle(&authed("GET", "posts"));
    assert_eq!(body(&first)["total"], 25);
    assert_eq!(body(&first)["total_pages"], 3);
    assert_eq!(body(&first)["posts"].as_array().unwrap().len(), 10);

    let last = state.handle(&authed("GET", "posts").query("page", "3"));
    assert_eq!(body(&last)["posts"].as_array().unwrap().len(), 5);
    assert_eq!(body(&last)["posts"][0]["id"], "p21");

    let drafts = state.handle(&authed("GET", "posts").query("state", "draft"));
    assert_eq!(body(&drafts)["total"], 12);

    let beyond = state.handle(&authed("GET", "posts").query("page", "9"));
    assert_eq!(body(&beyond)["posts"], json!([]));
}

#[test]
fn test_list_posts_rejects_bad_params() {
    let mut state = state();
    let resp = state.handle(&authed("GET", "posts").query("page", "0"));
    assert_eq!(resp.status, 400);
    assert_eq!(body(&resp)["message"], "Invalid page number: 0");

    let resp = state.handle(&authed("GET", "posts").query("to", "soon"));
    assert_eq!(body(&resp)["message"], "Invalid to date: soon");
}

#[test]
fn test_page_size_is_configurable() {
    let mut state = state();
    state.posts = posts(5);
    state.page_size = 2;
    let resp = state.handle(&authed("GET", "posts"));
    assert_eq!(body(&resp)["per_page"], 2);
    assert_eq!(body(&resp)["total_pages"], 3);
}

#[test]
fn test_get_update_delete_post() {
    let mut state = state();
    state.posts = posts(2);

    let resp = state.handle(&authed("GET", "posts/p2"));
    assert_eq!(body(&resp)["text"], "post 2");

    let resp = state.handle(
        &authed("PATCH", "posts/p2").json(&json!({"text": "edited", "media": [{"url": "u", "type": "image"}]})),
    );
    assert_eq!(resp.status, 200);
    assert_eq!(body(&resp)["text"], "edited");
    assert_eq!(body(&resp)["has_media"], true);
    assert_eq!(body(&resp)["state"], "draft");

    let resp = state.handle(&authed("DELETE", "posts/p2"));
    assert_eq!(
        body(&resp),
        &json!({"success": true, "message": "Post deleted successfully"})
    );
    assert_eq!(state.posts.len(), 1);

    let resp = state.handle(&authed("GET", "posts/p2"));
    assert_eq!(resp.status, 404);
    assert_eq!(body(&resp)["message"], "Post not found");
}

#[test]
fn test_update_rejects_non_object_body() {
    let mut state = state();
    state.posts = posts(1);
    let mut req = authed("PATCH", "posts/p1");
    req.body = b"[1,2]".to_vec();
    let resp = state.handle(&req);
    assert_eq!(resp.status, 400);
    assert_eq!(body(&resp)["message"], "Invalid JSON payload");
}

#[test]
fn test_me_without_user() {
    let mut state = state();
    assert_eq!(state.handle(&authed("GET", "users/me")).status, 404);

    state.current_user = Some(User {
        id: "u1".to_string(),
        email: "ada@example.com".to_string(),
        ..Default::default()
    });
    let resp = state.handle(&authed("GET", "users/me"));
    assert_eq!(body(&resp)["email"], "ada@example.com");
}

// ============================================================================
// Job-creating endpoints
// ============================================================================

fn job_id(resp: &MockResponse) -> String {
    body(resp)["job_id"].as_str().unwrap().to_string()
}

#[test]
fn test_publish_creates_pending_job() {
    let mut state = state();
    let resp = state.handle(
        &authed("POST", "posts/schedule/publish").json(&json!({"text": "hi", "accounts": ["a"]})),
    );
    assert_eq!(resp.status, 200);
    let id = job_id(&resp);
    assert!(id.starts_with("job-"));

    let job = state.job(&id).unwrap();
    assert_eq!(job.status, JobState::Pending);
    assert_eq!(job.progress, 0);
}

#[test]
fn test_bulk_limit() {
    let mut state = state();
    state.bulk_limit = Some(2);
    let three = json!({"posts": [{"text": "a"}, {"text": "b"}, {"text": "c"}]});
    let resp = state.handle(&authed("POST", "posts/schedule/publish").json(&three));
    assert_eq!(resp.status, 400);
    assert_eq!(body(&resp)["message"], "Bulk operation limit exceeded");

    let two = json!({"posts": [{"text": "a"}, {"text": "b"}]});
    let resp = state.handle(&authed("POST", "posts/schedule/publish").json(&two));
    assert_eq!(resp.status, 200);
}

#[test]
fn test_schedule_requires_future_time() {
    let mut state = state();
    let past = (Utc::now() - ChronoDuration::hours(1)).to_rfc3339();
    let future = (Utc::now() + ChronoDuration::hours(1)).to_rfc3339();

    let resp = state.handle(
        &authed("POST", "posts/schedule")
            .json(&json!({"text": "x", "accounts": ["a"], "scheduled_at": past})),
    );
    assert_eq!(body(&resp)["message"], "Scheduled time must be in the future");

    let resp = state.handle(
        &authed("POST", "posts/schedule")
            .json(&json!({"text": "x", "accounts": ["a"], "scheduled_at": future})),
    );
    assert_eq!(resp.status, 200);
}

#[test]
fn test_bulk_schedule_reports_offending_post() {
    let mut state = state();
    let future = (Utc::now() + ChronoDuration::hours(1)).to_rfc3339();
    let resp = state.handle(&authed("POST", "posts/schedule").json(&json!({
        "posts": [
            {"text": "ok", "scheduled_at": future},
            {"text": "missing time"}
        ]
    })));
    assert_eq!(resp.status, 400);
    assert_eq!(
        body(&resp)["message"],
        "Post 2: Scheduled time must be in the future"
    );
}

#[test]
fn test_draft_visibility() {
    let mut state = state();
    let resp = state.handle(
        &authed("POST", "posts/schedule").json(&json!({"text": "d", "visibility": "draft_public"})),
    );
    assert_eq!(resp.status, 200);

    let resp = state.handle(
        &authed("POST", "posts/schedule").json(&json!({"text": "d", "visibility": "secret"})),
    );
    assert_eq!(
        body(&resp)["message"],
        "Invalid visibility. Must be draft_private or draft_public"
    );
}

#[test]
fn test_recurring_validation() {
    let mut state = state();
    let resp = state.handle(&authed("POST", "posts/recurring").json(&json!({"accounts": ["a"]})));
    assert_eq!(body(&resp)["message"], "Text field is required");

    let resp = state.handle(
        &authed("POST", "posts/recurring").json(&json!({"text": "t", "accounts": ["a"]})),
    );
    assert_eq!(body(&resp)["message"], "Recurrence frequency is required");

    let resp = state.handle(&authed("POST", "posts/recurring").json(&json!({
        "text": "t",
        "accounts": ["a"],
        "recurrence": {"frequency": "weekly", "interval": 1}
    })));
    assert!(job_id(&resp).starts_with("recurring-"));
}

#[test]
fn test_auto_schedule_validation() {
    let mut state = state();
    let start = Utc::now();
    let end = start + ChronoDuration::days(7);
    let base = json!({"text": "t", "accounts": ["a"], "start_date": start, "end_date": end});

    let mut zero_slots = base.clone();
    zero_slots["slots"] = json!(0);
    let resp = state.handle(&authed("POST", "posts/auto-schedule").json(&zero_slots));
    assert_eq!(body(&resp)["message"], "Slots must be greater than 0");

    let mut reversed = base.clone();
    reversed["slots"] = json!(3);
    reversed["end_date"] = json!(start - ChronoDuration::days(1));
    let resp = state.handle(&authed("POST", "posts/auto-schedule").json(&reversed));
    assert_eq!(body(&resp)["message"], "End date must be after start date");

    let mut valid = base;
    valid["slots"] = json!(3);
    let resp = state.handle(&authed("POST", "posts/auto-schedule").json(&valid));
    assert!(job_id(&resp).starts_with("auto-schedule-"));
}

#[test]
fn test_recycle_requires_existing_post() {
    let mut state = state();
    let start = Utc::now();
    let request = json!({
        "post_id": "p1",
        "start_date": start,
        "end_date": start + ChronoDuration::days(30),
        "frequency": "weekly",
        "max_count": 4
    });

    let resp = state.handle(&authed("POST", "posts/recycle").json(&request));
    assert_eq!(resp.status, 404);

    state.posts = posts(1);
    let resp = state.handle(&authed("POST", "posts/recycle").json(&request));
    assert!(job_id(&resp).starts_with("recycle-"));
}

// ============================================================================
// Job progressions
// ============================================================================

#[test]
fn test_job_progression_advances_and_stops() {
    let mut state = state();
    state.progressions.insert(
        "job-1".to_string(),
        JobProgression {
            states: vec![
                JobStatus::new("job-1", JobState::Pending, 0),
                JobStatus::new("job-1", JobState::Working, 50),
                JobStatus::new("job-1", JobState::Completed, 100),
            ],
            cursor: 0,
        },
    );

    let resp = state.handle(&authed("GET", "job_status/job-1"));
    assert_eq!(body(&resp)["status"], "pending");

    assert!(state.advance_job("job-1"));
    assert!(state.advance_job("job-1"));
    assert!(!state.advance_job("job-1"));
    assert!(!state.advance_job("unknown"));

    let resp = state.handle(&authed("GET", "job_status/job-1"));
    assert_eq!(body(&resp)["status"], "completed");
    assert_eq!(body(&resp)["progress"], 100);
}

#[test]
fn test_job_status_errors() {
    let mut state = state();
    let resp = state.handle(&authed("GET", "job_status/missing"));
    assert_eq!(resp.status, 404);
    assert_eq!(body(&resp)["message"], "Job not found");

    let resp = state.handle(&authed("GET", "job_status"));
    assert_eq!(resp.status, 400);
}

// ============================================================================
// Fixtures
// ============================================================================

const FIXTURES: &str = r#"
page_size: 2
bulk_operation_limit: 5
current_user:
  id: u1
  email: ada@example.com
posts:
  - id: p1
    text: Hello
    state: draft
  - id: p2
    text: World
    state: scheduled
jobs:
  - id: job-7
    status: working
    progress: 40
"#;

#[test]
fn test_fixtures_from_yaml() {
    let fixtures = MockFixtures::from_yaml(FIXTURES).unwrap();
    assert_eq!(fixtures.posts.len(), 2);
    assert_eq!(fixtures.page_size, Some(2));
    assert_eq!(fixtures.jobs[0].status, JobState::Working);
    assert_eq!(fixtures.len(), 4);
}

#[test]
fn test_fixtures_reject_post_without_id() {
    let err = MockFixtures::from_yaml("posts:\n  - text: orphan\n").unwrap_err();
    assert!(err.to_string().contains("without id"));
}

#[test]
fn test_fixtures_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FIXTURES.as_bytes()).unwrap();
    let fixtures = MockFixtures::load(file.path()).unwrap();
    assert_eq!(fixtures.current_user.unwrap().id, "u1");

    let err = MockFixtures::load("/nonexistent/fixtures.yaml").unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Failed to read fixtures file '/nonexistent/fixtures.yaml': IO error"));
}

#[test]
fn test_fixtures_report_yaml_errors() {
    let err = MockFixtures::from_yaml("posts: [unclosed").unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Failed to parse fixtures YAML: Failed to parse YAML"));
}

// ============================================================================
// Server
// ============================================================================

#[tokio::test]
async fn test_server_serves_generated_credentials() {
    let server = MockServer::start().await.unwrap();
    let fixtures = MockFixtures::from_yaml(FIXTURES).unwrap();
    server.load_fixtures(fixtures).await;

    let ctx = Context::background();
    let client = server.client().await.unwrap();
    client.test_connection(&ctx).await.unwrap();

    let posts = client
        .list_posts(ListPostsRequest::new())
        .collect_all(&ctx)
        .await
        .unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(server.call_count("GET", "/api/v1/posts").await, 1);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_server_rejects_foreign_credentials() {
    let server = MockServer::start().await.unwrap();
    let client = crate::Client::new(
        crate::ClientConfig::builder()
            .api_key("wrong")
            .workspace_id(server.workspace_id().await)
            .base_url(server.base_url())
            .build()
            .unwrap(),
    )
    .unwrap();

    let err = client.me(&Context::background()).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_server_canned_response_without_body() {
    let server = MockServer::start().await.unwrap();
    server
        .set_response("POST", "/api/v1/posts/schedule/publish", 500, Value::Null)
        .await;

    let client = server.client().await.unwrap();
    let err = client
        .publish_post(&Context::background(), &PublishPostRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_server_delay_hits_deadline() {
    let server = MockServer::start().await.unwrap();
    server.set_delay(std::time::Duration::from_millis(300)).await;

    let client = server.client().await.unwrap();
    let ctx = Context::background().with_timeout(std::time::Duration::from_millis(50));
    let err = client.me(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded));
}

#[tokio::test]
async fn test_stop_twice_fails() {
    let server = MockServer::start().await.unwrap();
    server.stop().await.unwrap();
    let err = server.stop().await.unwrap_err();
    assert_eq!(err.to_string(), "mock server: server already stopped");
}
