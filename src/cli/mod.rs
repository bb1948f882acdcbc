//! CLI module
//!
//! Command-line interface for the Publer API.
//!
//! # Commands
//!
//! - `posts` - List posts, optionally filtered
//! - `accounts` - List connected social accounts
//! - `workspaces` - List workspaces
//! - `me` - Show the authenticated user
//! - `job` - Show a job's status
//! - `wait` - Block until a job finishes
//! - `mock` - Run the simulated backend

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
