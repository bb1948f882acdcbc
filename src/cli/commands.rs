//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Publer API command-line client
#[derive(Parser, Debug)]
#[command(name = "publer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API key (defaults to PUBLER_API_KEY)
    #[arg(long, global = true, env = "PUBLER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Workspace id (defaults to PUBLER_WORKSPACE_ID)
    #[arg(long, global = true, env = "PUBLER_WORKSPACE_ID")]
    pub workspace_id: Option<String>,

    /// API base URL (defaults to PUBLER_BASE_URL, then the public API)
    #[arg(long, global = true, env = "PUBLER_BASE_URL")]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List posts
    Posts {
        /// Only posts in this state (draft, scheduled, published, ...)
        #[arg(long)]
        state: Option<String>,

        /// Only posts of these accounts (comma-separated)
        #[arg(long, value_delimiter = ',')]
        accounts: Vec<String>,

        /// Only posts whose text contains this
        #[arg(short, long)]
        query: Option<String>,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// List connected social accounts
    Accounts,

    /// List workspaces
    Workspaces,

    /// Show the authenticated user
    Me,

    /// Show the status of a job
    Job {
        /// Job id
        id: String,
    },

    /// Wait for a job to finish
    Wait {
        /// Job id
        id: String,

        /// Give up after this many seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
    },

    /// Run a simulated backend
    Mock {
        /// Port to listen on (0 picks a free one)
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// YAML file with posts, accounts, workspaces, user and jobs
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one document per line)
    Json,
    /// Indented JSON
    Pretty,
}
