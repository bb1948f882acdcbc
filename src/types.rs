//! Common types used throughout the Publer client
//!
//! Domain objects shared by the client, the job poller and the mock
//! backend. Wire names follow the Publer JSON API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Users, Accounts, Workspaces
// ============================================================================

/// A Publer user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub first_name: String,
    pub picture: String,
}

/// A connected social media account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// Network the account belongs to (facebook, instagram, ...)
    pub provider: String,
    pub social_id: String,
    pub picture: String,
    /// Account kind on the provider (page, business, profile, ...)
    #[serde(rename = "type")]
    pub account_type: String,
}

/// A Publer workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub owner: User,
    pub members: Vec<User>,
    pub plan: String,
    pub picture: String,
}

// ============================================================================
// Posts
// ============================================================================

/// Media attachment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: String,
}

impl Media {
    /// Create an image attachment
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            media_type: "image".to_string(),
        }
    }

    /// Create a video attachment
    pub fn video(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            media_type: "video".to_string(),
        }
    }
}

/// A post as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: String,
    pub text: String,
    /// published, scheduled, draft, failed, ...
    pub state: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub account_id: String,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub has_media: bool,
    pub post_link: String,
    pub url: String,
    pub user: User,
}

// ============================================================================
// Jobs
// ============================================================================

/// Status of a server-side asynchronous job
///
/// Unrecognised wire values are kept in [`JobState::Unknown`] so that the
/// poller can reject them instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    #[default]
    Pending,
    Working,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Unknown(String),
}

impl JobState {
    /// Wire name of the state
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Working => "working",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown(s) => s,
        }
    }

    /// No further transition happens after a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Job is still queued or running
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Pending | Self::Working | Self::Processing)
    }
}

impl From<String> for JobState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "working" => Self::Working,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::Unknown(value),
        }
    }
}

impl From<&str> for JobState {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload attached to a finished job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobResult {
    pub success: bool,
    pub post_ids: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(skip_serializing_if = "JsonObject::is_empty")]
    pub data: JsonObject,
}

impl JobResult {
    /// Successful result with no payload
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// Failed result carrying an error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            ..Default::default()
        }
    }

    /// Attach created post ids
    #[must_use]
    pub fn with_post_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a data entry
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Snapshot of a job as reported by `job_status/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: String,
    pub status: JobState,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl JobStatus {
    /// Create a job snapshot with no result
    pub fn new(id: impl Into<String>, status: impl Into<JobState>, progress: u8) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            progress: progress.min(100),
            result: None,
            error: String::new(),
        }
    }

    /// Attach a result
    #[must_use]
    pub fn with_result(mut self, result: JobResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Attach an error message
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }
}

/// Response body of every job-creating endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCreated {
    pub job_id: String,
}

// ============================================================================
// Errors on the wire
// ============================================================================

/// JSON error body returned by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub code: String,
}

impl ErrorResponse {
    /// Create an error body
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            code: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_state_wire_names() {
        for name in [
            "pending",
            "working",
            "processing",
            "completed",
            "failed",
            "cancelled",
        ] {
            let state = JobState::from(name);
            assert!(!matches!(state, JobState::Unknown(_)));
            assert_eq!(state.as_str(), name);
        }
    }

    #[test]
    fn test_job_state_unknown_is_preserved() {
        let status: JobStatus =
            serde_json::from_value(json!({"id": "j1", "status": "exploded", "progress": 3}))
                .unwrap();
        assert_eq!(status.status, JobState::Unknown("exploded".to_string()));
        assert!(!status.status.is_terminal());
        assert!(!status.status.is_in_progress());
    }

    #[test]
    fn test_job_state_terminal() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Pending.is_terminal());
        assert!(JobState::Working.is_in_progress());
        assert!(JobState::Processing.is_in_progress());
    }

    #[test]
    fn test_job_status_serialization_omits_empty() {
        let status = JobStatus::new("job-1", JobState::Pending, 0);
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value, json!({"id": "job-1", "status": "pending", "progress": 0}));
    }

    #[test]
    fn test_job_result_data() {
        let result: JobResult = serde_json::from_value(json!({
            "success": false,
            "post_ids": ["post-1"],
            "error": "Post 2 failed: invalid account",
            "data": {"successful_posts": 1, "failed_posts": 1}
        }))
        .unwrap();
        assert!(!result.success);
        assert_eq!(result.post_ids, vec!["post-1"]);
        assert_eq!(result.data["failed_posts"], 1);
        assert!(result.message.is_empty());
    }

    #[test]
    fn test_post_type_field_renamed() {
        let post: Post = serde_json::from_value(json!({
            "id": "p1",
            "type": "photo",
            "scheduled_at": "2024-01-15T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(post.post_type, "photo");
        assert!(post.scheduled_at.is_some());
        assert!(post.text.is_empty());
    }
}
