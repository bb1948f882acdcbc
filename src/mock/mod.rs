//! Simulated Publer backend
//!
//! A stateful HTTP server that speaks the same wire protocol as the real
//! API. It stores posts, accounts, workspaces and jobs in memory, checks
//! credentials on every request, and can be told to inject failures,
//! canned responses or latency.
//!
//! # Example
//!
//! ```ignore
//! let server = MockServer::start().await?;
//! server.add_posts(vec![post]).await;
//! let client = server.client().await?;
//! let posts = client.list_posts(ListPostsRequest::new()).collect_all(&ctx).await?;
//! server.stop().await?;
//! ```

mod filter;
mod fixtures;
mod handlers;
mod server;
mod state;

pub use filter::{parse_page, PostFilter};
pub use fixtures::MockFixtures;
pub use handlers::API_PREFIX;
pub use server::MockServer;
pub use state::{
    endpoint_key, CannedResponse, ErrorRule, JobProgression, MockRequest, MockResponse, MockState,
    DEFAULT_PAGE_SIZE,
};

#[cfg(test)]
mod tests;
