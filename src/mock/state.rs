//! Simulation state and request pipeline
//!
//! [`MockState`] is the whole simulated backend: stored resources, jobs,
//! fault-injection rules and counters. [`MockState::handle`] runs one
//! request through authentication, call counting, error rules, canned
//! responses and finally the resource handlers. It has no I/O, so the
//! pipeline is testable without a socket.

use crate::client::{AUTH_SCHEME, WORKSPACE_HEADER};
use crate::types::{Account, ErrorResponse, JobStatus, JsonValue, Post, User, Workspace};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Page size used by the list endpoints unless overridden
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// ============================================================================
// Request / Response
// ============================================================================

/// Transport-independent view of an incoming request
#[derive(Debug, Clone, Default)]
pub struct MockRequest {
    pub method: String,
    /// Full path, e.g. `/api/v1/posts`
    pub path: String,
    /// Decoded query pairs in order
    pub query: Vec<(String, String)>,
    /// Headers with lower-cased names
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl MockRequest {
    /// Create a request with no headers, query or body
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Add a query pair
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body
    #[must_use]
    pub fn json(mut self, body: &JsonValue) -> Self {
        self.body = body.to_string().into_bytes();
        self
    }

    /// Header value by case-insensitive name
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// `"METHOD /path"` key used for counters and configured responses
    pub fn key(&self) -> String {
        endpoint_key(&self.method, &self.path)
    }
}

/// Response produced by the simulated backend
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// JSON body; `None` sends an empty body
    pub body: Option<JsonValue>,
}

impl MockResponse {
    /// 200 with a serialized body
    pub fn ok<T: Serialize>(body: &T) -> Self {
        Self::json(200, body)
    }

    /// Any status with a serialized body
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Self {
                status,
                headers: Vec::new(),
                body: Some(value),
            },
            Err(e) => Self::error(500, "internal_error", e.to_string()),
        }
    }

    /// Error status with an [`ErrorResponse`] body
    pub fn error(status: u16, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: serde_json::to_value(ErrorResponse::new(error, message)).ok(),
        }
    }

    /// 400 `bad_request`
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(400, "bad_request", message)
    }

    /// 404 `not_found`
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::error(404, "not_found", message)
    }
}

/// `"METHOD /path"`
pub fn endpoint_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), path)
}

// ============================================================================
// Configured behaviour
// ============================================================================

/// Fixed response for one endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CannedResponse {
    pub status: u16,
    pub body: Option<JsonValue>,
}

/// Failure injected from the `threshold`-th call of an endpoint on
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRule {
    pub threshold: u32,
    pub status: u16,
    pub body: Option<JsonValue>,
    pub headers: Vec<(String, String)>,
}

/// Scripted sequence of job snapshots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobProgression {
    pub states: Vec<JobStatus>,
    pub cursor: usize,
}

impl JobProgression {
    /// Snapshot under the cursor
    pub fn current(&self) -> Option<&JobStatus> {
        self.states.get(self.cursor)
    }
}

// ============================================================================
// MockState
// ============================================================================

/// All mutable state of the simulated backend
#[derive(Debug, Clone)]
pub struct MockState {
    pub(crate) api_key: String,
    pub(crate) workspace_id: String,
    pub(crate) posts: Vec<Post>,
    pub(crate) accounts: Vec<Account>,
    pub(crate) workspaces: Vec<Workspace>,
    pub(crate) current_user: Option<User>,
    pub(crate) jobs: HashMap<String, JobStatus>,
    pub(crate) progressions: HashMap<String, JobProgression>,
    pub(crate) responses: HashMap<String, CannedResponse>,
    pub(crate) error_rules: HashMap<String, ErrorRule>,
    pub(crate) call_counts: HashMap<String, u32>,
    pub(crate) delay: Duration,
    pub(crate) bulk_limit: Option<usize>,
    pub(crate) page_size: u32,
}

impl MockState {
    /// Empty state accepting the given credentials
    pub fn new(api_key: impl Into<String>, workspace_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            workspace_id: workspace_id.into(),
            posts: Vec::new(),
            accounts: Vec::new(),
            workspaces: Vec::new(),
            current_user: None,
            jobs: HashMap::new(),
            progressions: HashMap::new(),
            responses: HashMap::new(),
            error_rules: HashMap::new(),
            call_counts: HashMap::new(),
            delay: Duration::ZERO,
            bulk_limit: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Clear everything except the credentials
    pub fn reset(&mut self) {
        *self = Self::new(
            std::mem::take(&mut self.api_key),
            std::mem::take(&mut self.workspace_id),
        );
    }

    /// Calls seen so far for `method path`
    pub fn call_count(&self, method: &str, path: &str) -> u32 {
        self.call_counts
            .get(&endpoint_key(method, path))
            .copied()
            .unwrap_or(0)
    }

    /// Move a job's progression one step forward.
    ///
    /// Returns false for unknown jobs and when already at the last snapshot.
    pub fn advance_job(&mut self, job_id: &str) -> bool {
        let Some(progression) = self.progressions.get_mut(job_id) else {
            return false;
        };
        if progression.cursor + 1 >= progression.states.len() {
            return false;
        }
        progression.cursor += 1;
        if let Some(status) = progression.current() {
            self.jobs.insert(job_id.to_string(), status.clone());
        }
        true
    }

    /// Current snapshot of a job; a progression wins over the job map
    pub fn job(&self, job_id: &str) -> Option<&JobStatus> {
        self.progressions
            .get(job_id)
            .and_then(JobProgression::current)
            .or_else(|| self.jobs.get(job_id))
    }

    /// Run one request through the pipeline
    pub fn handle(&mut self, req: &MockRequest) -> MockResponse {
        let expected_auth = format!("{AUTH_SCHEME} {}", self.api_key);
        if req.header_value("authorization") != Some(expected_auth.as_str()) {
            debug!("mock: rejected {} {}: bad API key", req.method, req.path);
            return MockResponse::error(401, "unauthorized", "Missing or invalid API key");
        }
        if req.header_value(WORKSPACE_HEADER) != Some(self.workspace_id.as_str()) {
            debug!("mock: rejected {} {}: bad workspace", req.method, req.path);
            return MockResponse::bad_request("Missing or invalid workspace ID");
        }

        let key = req.key();
        let count = {
            let count = self.call_counts.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(rule) = self.error_rules.get(&key) {
            if count >= rule.threshold {
                warn!(
                    "mock: injecting {} for {} (call {}, threshold {})",
                    rule.status, key, count, rule.threshold
                );
                return MockResponse {
                    status: rule.status,
                    headers: rule.headers.clone(),
                    body: rule.body.clone(),
                };
            }
        }

        if let Some(canned) = self.responses.get(&key) {
            debug!("mock: canned {} for {}", canned.status, key);
            return MockResponse {
                status: canned.status,
                headers: Vec::new(),
                body: canned.body.clone(),
            };
        }

        let response = self.route(req);
        debug!("mock: {} -> {}", key, response.status);
        response
    }
}
