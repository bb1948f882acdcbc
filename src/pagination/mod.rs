//! Pagination module
//!
//! Page-number pagination shared by every list endpoint.
//!
//! # Overview
//!
//! A [`PageFetcher`] knows how to retrieve page N of one resource. A
//! [`PageIterator`] drives a fetcher lazily, tracks the page counter,
//! detects the end of the collection and stops on cancellation or error.

mod iterator;
mod types;

pub use iterator::PageIterator;
pub use types::{total_pages_for, Page, PageFetcher};
