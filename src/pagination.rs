//! Cursor pagination: the wire-independent page shape and a forward-only
//! accumulator over it.
//!
//! List endpoints return `{ items, nextCursor, hasMore, totalCount }` with
//! a resource-specific items field name; each resource client adapts its
//! wire shape into [`Page`] and hands a page fetcher to [`PagedQuery`].

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

/// One fetched page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub total_count: u64,
}

impl<T> Page<T> {
    /// True when no further page can be fetched after this one.
    pub fn is_terminal(&self) -> bool {
        !self.has_more || self.next_cursor.is_none()
    }
}

/// Fetches the page following `cursor` (`None` = first page).
pub type PageFetcher<T> =
    Box<dyn Fn(Option<String>) -> BoxFuture<'static, ApiResult<Page<T>>> + Send + Sync>;

/// Forward-only lazy sequence of pages for one fixed filter combination.
///
/// The aggregate visible list is the ordered concatenation of all fetched
/// pages. A different filter combination is a different `PagedQuery` (and a
/// different cache key), never a continuation. Dropping the query stops
/// driving further fetches; pages already in flight still land in the
/// shared cache for later reuse.
pub struct PagedQuery<T> {
    fetch: PageFetcher<T>,
    items: Vec<T>,
    next_cursor: Option<String>,
    started: bool,
    exhausted: bool,
    total_count: u64,
}

impl<T: DeserializeOwned> PagedQuery<T> {
    pub(crate) fn new(fetch: PageFetcher<T>) -> Self {
        Self {
            fetch,
            items: Vec::new(),
            next_cursor: None,
            started: false,
            exhausted: false,
            total_count: 0,
        }
    }

    /// Fetches the next page and appends its items. Once the sequence is
    /// exhausted this is a no-op returning the accumulated items. A failed
    /// fetch leaves the accumulator unchanged, so the same page can be
    /// retried.
    pub async fn load_more(&mut self) -> ApiResult<&[T]> {
        if self.exhausted {
            return Ok(&self.items);
        }

        let page = (self.fetch)(self.next_cursor.clone()).await?;

        self.started = true;
        self.total_count = page.total_count;
        self.exhausted = page.is_terminal();
        self.next_cursor = page.next_cursor;
        self.items.extend(page.items);

        Ok(&self.items)
    }

    /// Items fetched so far, in fetch order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// True once a terminal page (`hasMore=false` or no cursor) was seen.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// True once at least one page was fetched.
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Total result count as reported by the most recent page.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Forgets all fetched pages; the next `load_more` starts over from
    /// the first page.
    pub fn restart(&mut self) {
        self.items.clear();
        self.next_cursor = None;
        self.started = false;
        self.exhausted = false;
        self.total_count = 0;
    }
}
