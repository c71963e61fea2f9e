use crate::models::{Movie, MoviePage, SortCriteria};
use crate::tmdb::CatalogApi;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::{debug, error};

const FIRST_PAGE: u32 = 1;
// Fixed pool of workers driving page fetches for one loader.
const FETCH_WORKERS: usize = 5;

/// Which query a loader is bound to. A loader never switches between the
/// sort-ordered listing and the search listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageQuery {
    Sorted(SortCriteria),
    Search(String),
}

impl PageQuery {
    /// Search wins whenever a non-empty search string is present.
    pub fn from_parts(sort: SortCriteria, search: &str) -> Self {
        if search.trim().is_empty() {
            PageQuery::Sorted(sort)
        } else {
            PageQuery::Search(search.trim().to_string())
        }
    }
}

/// One successfully loaded page. `next_key` is absent once the catalog has
/// no further pages; there is no previous-key concept because this catalog
/// is only ever paged forward from page one.
#[derive(Debug, Clone)]
pub struct PageChunk {
    pub items: Vec<Movie>,
    pub next_key: Option<u32>,
}

/// Loads successive page-keyed snapshots of one catalog query.
///
/// Single-use: a loader is bound to one sort/search combination for its
/// whole life. A new sort order or search term means a new loader (and the
/// owning model discards any pages this one produced). A failed load
/// supplies nothing; there is no automatic retry.
pub struct PageLoader {
    catalog: Arc<dyn CatalogApi>,
    query: PageQuery,
    fetch_slots: Arc<Semaphore>,
    // Keys loaded or currently in flight; a failed key is removed again.
    loaded: Mutex<HashSet<u32>>,
}

impl PageLoader {
    pub fn new(catalog: Arc<dyn CatalogApi>, sort: SortCriteria, search: &str) -> Self {
        Self {
            catalog,
            query: PageQuery::from_parts(sort, search),
            fetch_slots: Arc::new(Semaphore::new(FETCH_WORKERS)),
            loaded: Mutex::new(HashSet::new()),
        }
    }

    pub fn query(&self) -> &PageQuery {
        &self.query
    }

    /// Loads page one of the bound query. `None` on failure (or if the
    /// initial page was already loaded); the list stays empty until the
    /// owner constructs a fresh loader.
    pub async fn load_initial(&self) -> Option<PageChunk> {
        self.load_page(FIRST_PAGE, "initializing the paged list").await
    }

    /// Appends the page for `key`. At most one request is in flight per
    /// key, and a key that already loaded successfully in this instance is
    /// never requested again.
    pub async fn load_after(&self, key: u32) -> Option<PageChunk> {
        self.load_page(key, "appending a page").await
    }

    /// Backward paging never occurs: the catalog is monotonically
    /// forward-paged from page one. Defined for contract symmetry.
    pub async fn load_before(&self, _key: u32) -> Option<PageChunk> {
        None
    }

    async fn load_page(&self, key: u32, what: &'static str) -> Option<PageChunk> {
        // Reserving up front keeps a second request for the same key from
        // starting while the first is still in flight.
        if !self.reserve(key) {
            debug!("Page {key} already loaded or loading for this query, skipping");
            return None;
        }
        let _slot = match self.fetch_slots.acquire().await {
            Ok(slot) => slot,
            Err(_) => {
                self.release(key);
                return None;
            }
        };
        match self.fetch(key).await {
            Ok(page) => {
                let next_key = if page.page >= page.total_pages {
                    None
                } else {
                    Some(key + 1)
                };
                Some(PageChunk {
                    items: page.results,
                    next_key,
                })
            }
            Err(e) => {
                error!("Failed {what} (page {key}): {e:#}");
                // The failed key stays requestable; nothing retries it on
                // its own.
                self.release(key);
                None
            }
        }
    }

    async fn fetch(&self, page: u32) -> Result<MoviePage> {
        match &self.query {
            PageQuery::Sorted(sort) => self.catalog.movies(*sort, page).await,
            PageQuery::Search(query) => self.catalog.search(query, page).await,
        }
    }

    /// Claims `key`; false when it is already loaded or in flight.
    fn reserve(&self, key: u32) -> bool {
        self.loaded
            .lock()
            .map(|mut set| set.insert(key))
            .unwrap_or(false)
    }

    fn release(&self, key: u32) {
        if let Ok(mut set) = self.loaded.lock() {
            set.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_blank_search_selects_the_sorted_listing() {
        assert_eq!(
            PageQuery::from_parts(SortCriteria::Popular, ""),
            PageQuery::Sorted(SortCriteria::Popular)
        );
        assert_eq!(
            PageQuery::from_parts(SortCriteria::TopRated, "   "),
            PageQuery::Sorted(SortCriteria::TopRated)
        );
        assert_eq!(
            PageQuery::from_parts(SortCriteria::Popular, " batman "),
            PageQuery::Search("batman".to_string())
        );
    }
}
