//! HTTP transport module
//!
//! Thin layer over reqwest shared by every resource call.
//!
//! # Features
//!
//! - **Default headers**: credentials are attached once, at construction
//! - **Cancellation**: in-flight requests are dropped when the context ends
//! - **Error mapping**: 429 becomes [`crate::Error::RateLimited`], other
//!   error statuses become [`crate::Error::Api`]
//!
//! There are no retries here. Callers decide what to do with a failure.

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
