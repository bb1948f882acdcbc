//! Client configuration
//!
//! Credentials and transport settings for [`crate::Client`], built either
//! explicitly through [`ClientConfig::builder`] or from the environment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://app.publer.com/api/v1/";

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "PUBLER_API_KEY";
/// Environment variable holding the workspace id
pub const ENV_WORKSPACE_ID: &str = "PUBLER_WORKSPACE_ID";
/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "PUBLER_BASE_URL";

// ============================================================================
// ClientConfig
// ============================================================================

/// Settings for one API client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API key sent as `Authorization: Bearer-API <key>`
    pub api_key: String,

    /// Workspace sent as `Publer-Workspace-Id`
    pub workspace_id: String,

    /// API root; relative request paths resolve below it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("publer-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            workspace_id: String::new(),
            base_url: default_base_url(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Create a config with the given credentials and default settings
    pub fn new(api_key: impl Into<String>, workspace_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            workspace_id: workspace_id.into(),
            ..Default::default()
        }
    }

    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Read the config from `PUBLER_API_KEY`, `PUBLER_WORKSPACE_ID` and
    /// (optionally) `PUBLER_BASE_URL`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key =
            non_empty(ENV_API_KEY).ok_or_else(|| Error::config(format!("{ENV_API_KEY} is not set")))?;
        let workspace_id = non_empty(ENV_WORKSPACE_ID)
            .ok_or_else(|| Error::config(format!("{ENV_WORKSPACE_ID} is not set")))?;

        let mut config = Self::new(api_key, workspace_id);
        if let Some(base_url) = non_empty(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the required fields and normalise the base URL
    pub fn validate(&mut self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::missing_field("API key"));
        }
        if self.workspace_id.is_empty() {
            return Err(Error::missing_field("workspace ID"));
        }
        if self.base_url.is_empty() {
            self.base_url = default_base_url();
        }
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the workspace id
    pub fn workspace_id(mut self, id: impl Into<String>) -> Self {
        self.config.workspace_id = id.into();
        self
    }

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

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<ClientConfig> {
        let mut config = self.config;
        config.validate()?;
        Ok(config)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
