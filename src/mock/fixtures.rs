//! YAML seed data for the simulated backend
//!
//! ```yaml
//! page_size: 5
//! current_user:
//!   id: u1
//!   email: ada@example.com
//! posts:
//!   - id: p1
//!     text: Hello
//!     state: draft
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::types::{Account, JobStatus, Post, User, Workspace};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Resources and settings loaded into a [`MockServer`](super::MockServer)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockFixtures {
    pub posts: Vec<Post>,
    pub accounts: Vec<Account>,
    pub workspaces: Vec<Workspace>,
    pub current_user: Option<User>,
    pub jobs: Vec<JobStatus>,
    pub page_size: Option<u32>,
    pub bulk_operation_limit: Option<usize>,
}

impl MockFixtures {
    /// Load fixtures from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures file '{}'", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse fixtures from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let fixtures =
            serde_yaml::from_str::<Self>(yaml).context("Failed to parse fixtures YAML")?;
        fixtures.validate()?;
        Ok(fixtures)
    }

    fn validate(&self) -> Result<()> {
        if let Some(post) = self.posts.iter().find(|p| p.id.is_empty()) {
            return Err(Error::config(format!(
                "Fixture post without id (text: {:?})",
                post.text
            )));
        }
        if self.jobs.iter().any(|j| j.id.is_empty()) {
            return Err(Error::config("Fixture job without id"));
        }
        if self.page_size == Some(0) {
            return Err(Error::config("page_size must be greater than 0"));
        }
        Ok(())
    }

    /// Total number of stored resources
    pub fn len(&self) -> usize {
        self.posts.len()
            + self.accounts.len()
            + self.workspaces.len()
            + self.jobs.len()
            + usize::from(self.current_user.is_some())
    }

    /// True when nothing would be seeded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
