//! Publer API client
//!
//! [`Client`] owns the authenticated transport. Resource operations live in
//! [`crate::resources`] as further `impl Client` blocks.

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::JsonValue;
use tracing::debug;

/// Header carrying the API key
pub const AUTH_HEADER: &str = "Authorization";
/// Scheme prefix for the API key
pub const AUTH_SCHEME: &str = "Bearer-API";
/// Header carrying the workspace id
pub const WORKSPACE_HEADER: &str = "Publer-Workspace-Id";

/// Client for the Publer REST API
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: HttpClient,
    config: ClientConfig,
}

impl Client {
    /// Create a client, rejecting missing credentials
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http_config = HttpClientConfig::builder()
            .base_url(config.base_url.clone())
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .header(AUTH_HEADER, format!("{AUTH_SCHEME} {}", config.api_key))
            .header(WORKSPACE_HEADER, config.workspace_id.clone())
            .build();
        let http = HttpClient::with_config(http_config)?;

        debug!(
            "Created client for {} (workspace {})",
            config.base_url, config.workspace_id
        );
        Ok(Self { http, config })
    }

    /// Create a client from `PUBLER_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Configuration the client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URL (always ends with `/`)
    pub fn base_url(&self) -> &str {
        self.http.base_url().as_str()
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Verify connectivity and credentials with `GET test`
    pub async fn test_connection(&self, ctx: &Context) -> Result<()> {
        let _: JsonValue = self.http.get_json(ctx, "test").await?;
        Ok(())
    }
}
