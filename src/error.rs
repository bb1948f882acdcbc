//! Error types for the Publer client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::types::{JobResult, JobState};
use thiserror::Error;

/// The main error type for the Publer client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{field} is required")]
    MissingConfigField { field: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("invalid post ID: {message}")]
    InvalidPostId { message: String },

    #[error("invalid job ID: {job_id:?}")]
    InvalidJobId { job_id: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} with {status} returned \"{message}\"")]
    Api {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    #[error("{method} {url} with {status} returned \"{message}\"")]
    RateLimited {
        method: String,
        url: String,
        status: u16,
        message: String,
        limit: u32,
        remaining: u32,
        reset: i64,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Job Errors
    // ============================================================================
    #[error("job {status}: {message}")]
    JobTerminated {
        status: JobState,
        message: String,
        result: Box<JobResult>,
    },

    #[error("unknown job status: {status}")]
    UnknownJobStatus { status: String },

    // ============================================================================
    // Cancellation
    // ============================================================================
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    // ============================================================================
    // Mock Server Errors
    // ============================================================================
    #[error("mock server: {message}")]
    MockServer { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid post id error
    pub fn invalid_post_id(message: impl Into<String>) -> Self {
        Self::InvalidPostId {
            message: message.into(),
        }
    }

    /// Create an API status error
    pub fn api(
        method: impl Into<String>,
        url: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Api {
            method: method.into(),
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a mock server error
    pub fn mock(message: impl Into<String>) -> Self {
        Self::MockServer {
            message: message.into(),
        }
    }

    /// HTTP status code for API and rate limit errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } | Error::RateLimited { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error came from the caller's context being cancelled or timing out
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }

    /// Check if this error is a terminal job failure
    pub fn is_job_failure(&self) -> bool {
        matches!(self, Error::JobTerminated { .. })
    }

    /// Result carried by a terminal job failure
    pub fn job_result(&self) -> Option<&JobResult> {
        match self {
            Error::JobTerminated { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Result type alias for the Publer client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
