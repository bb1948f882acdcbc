//! Workspace operations

use crate::client::Client;
use crate::context::Context;
use crate::error::Result;
use crate::http::RequestConfig;
use crate::pagination::{Page, PageFetcher, PageIterator};
use crate::types::Workspace;
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Body of `GET workspaces`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListWorkspacesResponse {
    pub workspaces: Vec<Workspace>,
    pub total: u32,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl From<ListWorkspacesResponse> for Page<Workspace> {
    fn from(resp: ListWorkspacesResponse) -> Self {
        Page {
            items: resp.workspaces,
            total: resp.total,
            page: resp.page,
            per_page: resp.per_page,
            total_pages: resp.total_pages,
        }
    }
}

/// Fetches pages of `GET workspaces`
#[derive(Debug, Clone)]
pub struct WorkspacePageFetcher {
    client: Client,
}

#[async_trait]
impl PageFetcher for WorkspacePageFetcher {
    type Item = Workspace;

    async fn fetch_page(&self, ctx: &Context, page: u32) -> Result<Page<Workspace>> {
        let mut config = RequestConfig::new();
        if page > 1 {
            config = config.query("page", page.to_string());
        }
        let resp: ListWorkspacesResponse = self
            .client
            .http()
            .request_json(ctx, Method::GET, "workspaces", config)
            .await?;
        Ok(resp.into())
    }
}

impl Client {
    /// Lazily iterate the workspaces visible to the API key
    pub fn list_workspaces(&self) -> PageIterator<WorkspacePageFetcher> {
        PageIterator::new(WorkspacePageFetcher {
            client: self.clone(),
        })
    }
}
