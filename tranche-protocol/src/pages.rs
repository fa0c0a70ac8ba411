//! Cursor pagination
//!
//! Presents a cursor-paginated listing as one logical sequence. The walk is
//! lazy and forward-only: each step follows the cursor of the previous page,
//! so there is never more than one fetch in flight and a consumed walk cannot
//! be restarted from an intermediate page.
//!
//! Some servers hand back the very cursor they were just asked for instead of
//! advancing. Following it again would reproduce the same response forever,
//! so the walker refuses to reuse a cursor it just fetched with.

use tracing::{debug, warn};
use tranche_core::domain::page::{Cursor, Page};

use crate::error::{ProtocolError, Result};
use crate::remote::PageSource;

/// Walks a paginated listing through a [`PageSource`]
pub struct PageWalker<T, S> {
    source: S,
    /// Items of the caller-supplied first page, not yet yielded
    first_items: Option<Vec<T>>,
    next_cursor: Option<Cursor>,
    /// Cursor used by the most recent successful fetch
    last_cursor: Option<Cursor>,
    fetches: usize,
    max_pages: Option<usize>,
}

impl<T, S> PageWalker<T, S>
where
    T: Send,
    S: PageSource<T>,
{
    /// Starts a walk from a page the caller already fetched
    pub fn new(source: S, first: Page<T>) -> Self {
        Self {
            source,
            first_items: Some(first.items),
            next_cursor: first.next_cursor,
            last_cursor: None,
            fetches: 0,
            max_pages: None,
        }
    }

    /// Caps the number of follow-up fetches
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Cursor the next fetch would use, `None` once the last page was seen
    pub fn pending_cursor(&self) -> Option<&Cursor> {
        self.next_cursor.as_ref()
    }

    /// Number of fetches issued so far, not counting the first page
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    /// Whether every page has been yielded
    pub fn is_exhausted(&self) -> bool {
        self.first_items.is_none() && self.next_cursor.is_none()
    }

    /// Yields the items of the next page, or `None` when the walk is done
    ///
    /// A failed fetch leaves the walker where it was, so calling again retries
    /// the same cursor. A stalled cursor fails every time without a call.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if let Some(items) = self.first_items.take() {
            return Ok(Some(items));
        }

        let Some(cursor) = self.next_cursor.clone() else {
            return Ok(None);
        };

        if self.last_cursor.as_ref() == Some(&cursor) {
            warn!("Server returned the cursor it was just given: {}", cursor);
            return Err(ProtocolError::StalledCursor { cursor });
        }

        if let Some(max_pages) = self.max_pages {
            if self.fetches >= max_pages {
                return Err(ProtocolError::PageLimitExceeded { pages: max_pages });
            }
        }

        debug!("Fetching page {} at {}", self.fetches + 2, cursor);
        let page = self
            .source
            .fetch_next(&cursor)
            .await
            .map_err(|cause| ProtocolError::FetchPageFailed {
                cursor: cursor.clone(),
                cause,
            })?;
        self.fetches += 1;

        debug!(
            "Fetched {} item(s){}",
            page.items.len(),
            if page.is_last() { ", last page" } else { "" }
        );

        self.last_cursor = Some(cursor);
        self.next_cursor = page.next_cursor;
        Ok(Some(page.items))
    }

    /// Drains the walk into one list in server order
    ///
    /// Items are not deduplicated.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut aggregated = Vec::new();

        while let Some(items) = self.next_page().await? {
            aggregated.extend(items);
        }

        debug!(
            "Collected {} item(s) over {} page(s)",
            aggregated.len(),
            self.fetches + 1
        );
        Ok(aggregated)
    }
}

impl<T, S> std::fmt::Debug for PageWalker<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageWalker")
            .field("next_cursor", &self.next_cursor)
            .field("last_cursor", &self.last_cursor)
            .field("fetches", &self.fetches)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

/// Collects every item of a listing, starting from its first page
pub async fn walk_all<T, S>(source: S, first: Page<T>) -> Result<Vec<T>>
where
    T: Send,
    S: PageSource<T>,
{
    PageWalker::new(source, first).collect_all().await
}
