//! Authenticated JSON transport
//!
//! Every API call goes through [`HttpClient::request`], which:
//! - Resolves the path against the base URL
//! - Applies the default headers (credentials, user agent)
//! - Races the request against the caller's [`Context`]
//! - Maps error statuses onto [`Error::Api`] and [`Error::RateLimited`]

use crate::context::Context;
use crate::error::{Error, Result};
use crate::types::ErrorResponse;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL every request path is resolved against
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: Vec<(String, String)>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(30),
            default_headers: Vec::new(),
            user_agent: format!("publer-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((key.into(), value.into()));
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, in order; keys may repeat (`state[]=a&state[]=b`)
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: Vec<(String, String)>,
    /// Request body (JSON)
    pub body: Option<Value>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` and set it as the JSON body
    pub fn json_from<T: Serialize>(self, body: &T) -> Result<Self> {
        Ok(self.json(serde_json::to_value(body)?))
    }
}

/// HTTP client bound to one base URL and one set of credentials
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a client from `config`.
    ///
    /// The base URL gains a trailing slash if it lacks one, so that relative
    /// paths resolve below it.
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Base URL requests are resolved against (always ends with `/`)
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Send a request and return the raw response body.
    ///
    /// Statuses of 400 and above become errors; the body of a successful
    /// response is returned untouched.
    pub async fn request(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<Vec<u8>> {
        let url = self.build_url(path, &config.query)?;
        debug!("{} {}", method, url);

        let mut req = self.client.request(method.clone(), url.clone());

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(ref body) = config.body {
            req = req
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }

        let (status, headers, body) = ctx
            .run(async {
                let response = req.send().await?;
                let status = response.status();
                let headers = response.headers().clone();
                let body = response.bytes().await?;
                Ok((status, headers, body))
            })
            .await?;

        if status.is_client_error() || status.is_server_error() {
            let err = map_error_status(method.as_str(), url.as_str(), status, &headers, &body);
            warn!("{}", err);
            return Err(err);
        }

        debug!("{} {} -> {}", method, url, status.as_u16());
        Ok(body.to_vec())
    }

    /// Send a request and decode the JSON response.
    ///
    /// An empty body decodes as `{}`, so targets with defaulted fields
    /// still come back.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let body = self.request(ctx, method, path, config).await?;
        decode_body(&body)
    }

    /// Make a GET request and parse JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, ctx: &Context, path: &str) -> Result<T> {
        self.request_json(ctx, Method::GET, path, RequestConfig::default())
            .await
    }

    /// Make a POST request with a JSON body and parse JSON response
    pub async fn post_json<B, T>(&self, ctx: &Context, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let config = RequestConfig::new().json(serde_json::to_value(body)?);
        self.request_json(ctx, Method::POST, path, config).await
    }

    /// Resolve `path` against the base URL and append `query`
    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = self.base_url.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.config.timeout)
            .field("user_agent", &self.config.user_agent)
            .finish_non_exhaustive()
    }
}

/// Decode a JSON body, treating an empty body as `{}`
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Object(serde_json::Map::new()))?);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Build the error for a response with status 400 or above
pub(crate) fn map_error_status(
    method: &str,
    url: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> Error {
    let parsed = serde_json::from_slice::<ErrorResponse>(body).ok();
    let from_body = parsed
        .map(|e| if e.message.is_empty() { e.error } else { e.message })
        .unwrap_or_default();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Error::RateLimited {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            message: from_body,
            limit: header_number(headers, "X-RateLimit-Limit"),
            remaining: header_number(headers, "X-RateLimit-Remaining"),
            reset: header_number(headers, "X-RateLimit-Reset"),
        };
    }

    let message = if from_body.is_empty() {
        String::from_utf8_lossy(body).into_owned()
    } else {
        from_body
    };
    Error::api(method, url, status.as_u16(), message)
}

/// Parse a numeric header, 0 when absent or malformed
fn header_number<N: std::str::FromStr + Default>(headers: &HeaderMap, name: &str) -> N {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or_default()
}
