//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::Client;
use crate::config::{ClientConfig, ENV_API_KEY, ENV_WORKSPACE_ID};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::jobs::WaitOptions;
use crate::mock::{MockFixtures, MockServer};
use crate::pagination::{Page, PageFetcher, PageIterator};
use crate::resources::ListPostsRequest;
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let ctx = Context::background();
        match &self.cli.command {
            Commands::Posts {
                state,
                accounts,
                query,
                max_pages,
            } => {
                let mut request = ListPostsRequest::new();
                if let Some(state) = state {
                    request = request.state(state.clone());
                }
                if !accounts.is_empty() {
                    request = request.account_ids(accounts.iter().cloned());
                }
                if let Some(query) = query {
                    request = request.query(query.clone());
                }
                let iter = self.client()?.list_posts(request);
                self.drain(&ctx, iter, *max_pages).await
            }
            Commands::Accounts => {
                let iter = self.client()?.list_accounts();
                self.drain(&ctx, iter, None).await
            }
            Commands::Workspaces => {
                let iter = self.client()?.list_workspaces();
                self.drain(&ctx, iter, None).await
            }
            Commands::Me => {
                let user = self.client()?.me(&ctx).await?;
                self.output(&user);
                Ok(())
            }
            Commands::Job { id } => {
                let status = self.client()?.job_status(&ctx, id).await?;
                self.output(&status);
                Ok(())
            }
            Commands::Wait { id, timeout } => self.wait(id, *timeout).await,
            Commands::Mock { port, fixtures } => self.mock(*port, fixtures.as_deref()).await,
        }
    }

    /// Build a client from flags, falling back to the environment
    fn client(&self) -> Result<Client> {
        let api_key = self
            .cli
            .api_key
            .clone()
            .ok_or_else(|| Error::config(format!("API key not set (use --api-key or {ENV_API_KEY})")))?;
        let workspace_id = self.cli.workspace_id.clone().ok_or_else(|| {
            Error::config(format!(
                "workspace ID not set (use --workspace-id or {ENV_WORKSPACE_ID})"
            ))
        })?;

        let mut builder = ClientConfig::builder()
            .api_key(api_key)
            .workspace_id(workspace_id);
        if let Some(base_url) = &self.cli.base_url {
            builder = builder.base_url(base_url.clone());
        }
        let client = Client::new(builder.build()?)?;
        if self.cli.verbose {
            self.log("INFO", &format!("Using API at {}", client.base_url()));
        }
        Ok(client)
    }

    /// Print every item of every page, one document per item
    async fn drain<F>(
        &self,
        ctx: &Context,
        mut iter: PageIterator<F>,
        max_pages: Option<u32>,
    ) -> Result<()>
    where
        F: PageFetcher,
        F::Item: Serialize,
    {
        let mut page = Page::default();
        let mut pages = 0;
        loop {
            let more = iter.next(ctx, &mut page).await;
            if let Some(err) = iter.take_err() {
                return Err(err);
            }
            for item in &page.items {
                self.output(item);
            }
            pages += 1;
            if !more || max_pages.is_some_and(|max| pages >= max) {
                break;
            }
        }
        if self.cli.verbose {
            self.log(
                "INFO",
                &format!("Fetched {} of {} pages", pages, iter.total_pages()),
            );
        }
        Ok(())
    }

    async fn wait(&self, job_id: &str, timeout_secs: u64) -> Result<()> {
        let client = self.client()?;
        let ctx = Context::background().with_timeout(Duration::from_secs(timeout_secs));
        self.log("INFO", &format!("Waiting for job {job_id}"));

        match client.wait_for_job(&ctx, &WaitOptions::new(job_id)).await {
            Ok(result) => {
                self.output(&result);
                Ok(())
            }
            Err(e) => {
                if let Some(result) = e.job_result() {
                    self.output(result);
                }
                Err(e)
            }
        }
    }

    /// Serve a simulated backend until Ctrl-C
    async fn mock(&self, port: u16, fixtures: Option<&Path>) -> Result<()> {
        let server = MockServer::bind(SocketAddr::from(([127, 0, 0, 1], port))).await?;
        if let Some(path) = fixtures {
            let fixtures = MockFixtures::load(path)?;
            tracing::info!(
                "Loaded {} fixture resources from {}",
                fixtures.len(),
                path.display()
            );
            server.load_fixtures(fixtures).await;
        }

        self.output(&json!({
            "base_url": server.base_url(),
            "api_key": server.api_key().await,
            "workspace_id": server.workspace_id().await,
        }));
        tracing::info!("Mock server ready at {}", server.base_url());

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutting down mock server");
        server.stop().await
    }

    /// Output a document
    fn output<T: Serialize + ?Sized>(&self, value: &T) {
        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value),
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
        };
        println!("{}", rendered.unwrap_or_default());
    }

    /// Log line on stderr, keeping stdout for data
    fn log(&self, level: &str, message: &str) {
        eprintln!(
            "{}",
            json!({"type": "LOG", "log": {"level": level, "message": message}})
        );
    }
}
