//! In-process HTTP server for the simulated backend

use super::fixtures::MockFixtures;
use super::handlers::API_PREFIX;
use super::state::{
    endpoint_key, CannedResponse, ErrorRule, JobProgression, MockRequest, MockResponse, MockState,
};
use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::{Account, JobStatus, JsonValue, Post, User, Workspace};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

type SharedState = Arc<RwLock<MockState>>;

/// A running simulated Publer backend
///
/// Every instance generates its own credentials; [`MockServer::client`]
/// returns a client that already carries them.
pub struct MockServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MockServer {
    /// Start a server on an ephemeral loopback port
    pub async fn start() -> Result<Self> {
        Self::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await
    }

    /// Start a server on `addr`
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let api_key = format!("mock-api-key-{}", Uuid::new_v4().simple());
        let workspace_id = format!("mock-workspace-{}", Uuid::new_v4().simple());
        let state = Arc::new(RwLock::new(MockState::new(api_key, workspace_id)));

        let app = Router::new()
            .fallback(dispatch)
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::mock(format!("failed to bind {addr}: {e}")))?;
        let addr = listener.local_addr()?;

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    rx.await.ok();
                })
                .await;
            if let Err(e) = served {
                tracing::error!("mock server on {} failed: {}", addr, e);
            }
        });

        tracing::debug!("mock server listening on http://{}", addr);
        Ok(Self {
            addr,
            state,
            shutdown: Mutex::new(Some(tx)),
            task: Mutex::new(Some(task)),
        })
    }

    /// Socket address the server listens on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// API root, e.g. `http://127.0.0.1:41234/api/v1/`
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    /// Generated API key
    pub async fn api_key(&self) -> String {
        self.state.read().await.api_key.clone()
    }

    /// Generated workspace id
    pub async fn workspace_id(&self) -> String {
        self.state.read().await.workspace_id.clone()
    }

    /// Client configured with this server's URL and credentials
    pub async fn client(&self) -> Result<Client> {
        let state = self.state.read().await;
        Client::new(
            ClientConfig::builder()
                .api_key(state.api_key.clone())
                .workspace_id(state.workspace_id.clone())
                .base_url(self.base_url())
                .build()?,
        )
    }

    /// Shut the listener down and wait for it to finish.
    ///
    /// Fails if the server was already stopped.
    pub async fn stop(&self) -> Result<()> {
        let sender = lock(&self.shutdown).take();
        let Some(sender) = sender else {
            return Err(Error::mock("server already stopped"));
        };
        sender.send(()).ok();

        let task = lock(&self.task).take();
        if let Some(task) = task {
            task.await
                .map_err(|e| Error::mock(format!("server task failed: {e}")))?;
        }
        tracing::debug!("mock server on {} stopped", self.addr);
        Ok(())
    }

    /// Run `f` with exclusive access to the state
    pub async fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut *self.state.write().await)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Clear all resources, jobs, rules, counters and settings
    pub async fn reset(&self) {
        self.state.write().await.reset();
    }

    /// Always answer `method path` with `status` and `body` (`null` sends no body)
    pub async fn set_response(&self, method: &str, path: &str, status: u16, body: JsonValue) {
        let body = (!body.is_null()).then_some(body);
        self.state
            .write()
            .await
            .responses
            .insert(endpoint_key(method, path), CannedResponse { status, body });
    }

    /// Fail `method path` from its `threshold`-th call on
    pub async fn set_error_response<I, K, V>(
        &self,
        method: &str,
        path: &str,
        threshold: u32,
        status: u16,
        body: JsonValue,
        headers: I,
    ) where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let rule = ErrorRule {
            threshold,
            status,
            body: (!body.is_null()).then_some(body),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        };
        self.state
            .write()
            .await
            .error_rules
            .insert(endpoint_key(method, path), rule);
    }

    /// Store a job snapshot
    pub async fn set_job_status(&self, status: JobStatus) {
        self.state
            .write()
            .await
            .jobs
            .insert(status.id.clone(), status);
    }

    /// Script the snapshots a job goes through and rewind to the first
    pub async fn set_job_progression(&self, job_id: &str, states: Vec<JobStatus>) {
        self.state
            .write()
            .await
            .progressions
            .insert(job_id.to_string(), JobProgression { states, cursor: 0 });
    }

    /// Step a scripted job forward; false when unknown or already at the end
    pub async fn advance_job_state(&self, job_id: &str) -> bool {
        self.state.write().await.advance_job(job_id)
    }

    /// Current snapshot of a job, as `GET job_status/{id}` would report it
    pub async fn job(&self, job_id: &str) -> Option<JobStatus> {
        self.state.read().await.job(job_id).cloned()
    }

    /// Delay every response by `delay`
    pub async fn set_delay(&self, delay: Duration) {
        self.state.write().await.delay = delay;
    }

    /// Append posts
    pub async fn add_posts(&self, posts: impl IntoIterator<Item = Post>) {
        self.state.write().await.posts.extend(posts);
    }

    /// Append accounts
    pub async fn add_accounts(&self, accounts: impl IntoIterator<Item = Account>) {
        self.state.write().await.accounts.extend(accounts);
    }

    /// Append workspaces
    pub async fn add_workspaces(&self, workspaces: impl IntoIterator<Item = Workspace>) {
        self.state.write().await.workspaces.extend(workspaces);
    }

    /// Set the user returned by `GET users/me`
    pub async fn set_current_user(&self, user: User) {
        self.state.write().await.current_user = Some(user);
    }

    /// Reject bulk requests with more than `limit` posts
    pub async fn set_bulk_operation_limit(&self, limit: usize) {
        self.state.write().await.bulk_limit = Some(limit);
    }

    /// Page size of the list endpoints
    pub async fn set_page_size(&self, per_page: u32) {
        self.state.write().await.page_size = per_page.max(1);
    }

    /// Calls seen so far for `method path`
    pub async fn call_count(&self, method: &str, path: &str) -> u32 {
        self.state.read().await.call_count(method, path)
    }

    /// Stored posts, in insertion order
    pub async fn posts(&self) -> Vec<Post> {
        self.state.read().await.posts.clone()
    }

    /// Seed the state from a fixture set
    pub async fn load_fixtures(&self, fixtures: MockFixtures) {
        let mut state = self.state.write().await;
        state.posts.extend(fixtures.posts);
        state.accounts.extend(fixtures.accounts);
        state.workspaces.extend(fixtures.workspaces);
        if fixtures.current_user.is_some() {
            state.current_user = fixtures.current_user;
        }
        for job in fixtures.jobs {
            state.jobs.insert(job.id.clone(), job);
        }
        if let Some(per_page) = fixtures.page_size {
            state.page_size = per_page.max(1);
        }
        if fixtures.bulk_operation_limit.is_some() {
            state.bulk_limit = fixtures.bulk_operation_limit;
        }
    }
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(sender) = lock(&self.shutdown).take() {
            sender.send(()).ok();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ============================================================================
// axum adapter
// ============================================================================

/// Single entry point for every request
async fn dispatch(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // sleep outside the lock so concurrent requests are delayed independently
    let delay = state.read().await.delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let request = MockRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
            .into_owned()
            .collect(),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        body: body.to_vec(),
    };

    let response = state.write().await.handle(&request);
    response.into_response()
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = match self.body {
            Some(body) => (status, Json(body)).into_response(),
            None => status.into_response(),
        };
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}
