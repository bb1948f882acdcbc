//! Lazy page-by-page iteration over a [`PageFetcher`]

use super::types::{Page, PageFetcher};
use crate::context::Context;
use crate::error::{Error, Result};
use futures::Stream;
use tracing::debug;

/// Iterates a paginated resource one page at a time.
///
/// Nothing is fetched until the first call to [`PageIterator::next`]. The
/// page count reported by page 1 is fixed for the life of the iterator.
/// Any error stops the iterator for good; it never retries.
#[derive(Debug)]
pub struct PageIterator<F: PageFetcher> {
    fetcher: F,
    current_page: u32,
    total_pages: u32,
    initialized: bool,
    err: Option<Error>,
}

impl<F: PageFetcher> PageIterator<F> {
    /// Create an iterator over `fetcher`
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            current_page: 0,
            total_pages: 0,
            initialized: false,
            err: None,
        }
    }

    /// Fetch the next page into `page`.
    ///
    /// Returns true when a page was written and more pages remain. The last
    /// page is written together with a `false` return, so callers must
    /// consume `page` before checking the return value. After the last page,
    /// further calls return false without fetching; check [`Self::err`] to
    /// tell exhaustion from failure.
    pub async fn next(&mut self, ctx: &Context, page: &mut Page<F::Item>) -> bool {
        if self.err.is_some() {
            return false;
        }

        if !self.initialized {
            self.initialized = true;
            self.current_page = 0;
        } else if self.current_page >= self.total_pages {
            return false;
        }

        if let Some(err) = ctx.err() {
            self.err = Some(err);
            return false;
        }

        self.current_page += 1;
        let fetched = match self.fetcher.fetch_page(ctx, self.current_page).await {
            Ok(fetched) => fetched,
            Err(e) => {
                debug!("Page {} fetch failed: {}", self.current_page, e);
                self.err = Some(e);
                return false;
            }
        };

        if self.current_page == 1 {
            self.total_pages = fetched.total_pages;
        }

        debug!(
            "Fetched page {}/{} ({} items)",
            self.current_page,
            self.total_pages,
            fetched.items.len()
        );
        *page = fetched;

        self.current_page < self.total_pages
    }

    /// Error that stopped the iteration, if any
    pub fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Take ownership of the stored error
    pub fn take_err(&mut self) -> Option<Error> {
        self.err.take()
    }

    /// Last page number fetched (0 before the first fetch)
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Page count captured from page 1 (0 before the first fetch)
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Drain every remaining page and return the items in order
    pub async fn collect_all(mut self, ctx: &Context) -> Result<Vec<F::Item>> {
        let mut items = Vec::new();
        let mut page = Page::default();
        loop {
            let more = self.next(ctx, &mut page).await;
            if let Some(err) = self.err.take() {
                return Err(err);
            }
            items.append(&mut page.items);
            if !more {
                break;
            }
        }
        Ok(items)
    }

    /// Turn the iterator into a stream of pages.
    ///
    /// The stream ends after the last page or after yielding an error.
    pub fn into_stream(self, ctx: Context) -> impl Stream<Item = Result<Page<F::Item>>> {
        futures::stream::unfold(Some(self), move |state| {
            let ctx = ctx.clone();
            async move {
                let mut iter = state?;
                let mut page = Page::default();
                let more = iter.next(&ctx, &mut page).await;
                if let Some(err) = iter.err.take() {
                    return Some((Err(err), None));
                }
                let rest = if more { Some(iter) } else { None };
                Some((Ok(page), rest))
            }
        })
    }
}
