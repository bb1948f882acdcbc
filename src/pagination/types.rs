//! Pagination types and traits
//!
//! Defines the page container and the fetcher contract every paginated
//! resource implements.

use crate::context::Context;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Number of pages needed for `total` items.
///
/// An empty collection still has one (empty) page.
pub fn total_pages_for(total: u32, per_page: u32) -> u32 {
    if per_page == 0 {
        return 1;
    }
    total.div_ceil(per_page).max(1)
}

/// One page of a paginated collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in collection order
    pub items: Vec<T>,
    /// Total items across all pages
    pub total: u32,
    /// 1-based page number
    pub page: u32,
    /// Page size used by the server
    pub per_page: u32,
    /// Number of pages in the collection
    pub total_pages: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 0,
            per_page: 0,
            total_pages: 0,
        }
    }
}

impl<T> Page<T> {
    /// Slice page `page` (1-based) out of a full collection.
    ///
    /// Out-of-range pages come back with no items rather than an error.
    pub fn from_slice(all: &[T], page: u32, per_page: u32) -> Self
    where
        T: Clone,
    {
        let total = all.len() as u32;
        let page = page.max(1);
        let start = ((page - 1) as usize).saturating_mul(per_page as usize);
        let end = start.saturating_add(per_page as usize).min(all.len());
        let items = if start < all.len() {
            all[start..end].to_vec()
        } else {
            Vec::new()
        };

        Self {
            items,
            total,
            page,
            per_page,
            total_pages: total_pages_for(total, per_page),
        }
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if this page has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check if this is the last page of the collection
    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }

    /// Map the items, keeping the metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Retrieves one numbered page of a resource
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Item type of the resource
    type Item: Send;

    /// Fetch page `page` (1-based)
    async fn fetch_page(&self, ctx: &Context, page: u32) -> Result<Page<Self::Item>>;
}
