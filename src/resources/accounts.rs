//! Social account operations

use crate::client::Client;
use crate::context::Context;
use crate::error::Result;
use crate::http::RequestConfig;
use crate::pagination::{Page, PageFetcher, PageIterator};
use crate::types::Account;
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Body of `GET accounts`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListAccountsResponse {
    pub accounts: Vec<Account>,
    pub total: u32,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl From<ListAccountsResponse> for Page<Account> {
    fn from(resp: ListAccountsResponse) -> Self {
        Page {
            items: resp.accounts,
            total: resp.total,
            page: resp.page,
            per_page: resp.per_page,
            total_pages: resp.total_pages,
        }
    }
}

/// Fetches pages of `GET accounts`
#[derive(Debug, Clone)]
pub struct AccountPageFetcher {
    client: Client,
}

#[async_trait]
impl PageFetcher for AccountPageFetcher {
    type Item = Account;

    async fn fetch_page(&self, ctx: &Context, page: u32) -> Result<Page<Account>> {
        // page 1 is the server default and goes without a query
        let mut config = RequestConfig::new();
        if page > 1 {
            config = config.query("page", page.to_string());
        }
        let resp: ListAccountsResponse = self
            .client
            .http()
            .request_json(ctx, Method::GET, "accounts", config)
            .await?;
        Ok(resp.into())
    }
}

impl Client {
    /// Lazily iterate the workspace's connected accounts
    pub fn list_accounts(&self) -> PageIterator<AccountPageFetcher> {
        PageIterator::new(AccountPageFetcher {
            client: self.clone(),
        })
    }
}
