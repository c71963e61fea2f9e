use crate::models::{FavoriteEntry, MovieDetails, ReviewPage, SortCriteria, VideoPage};
use crate::observe::{Live, Source};
use crate::pager::PageLoader;
use crate::store::FavoritesStore;
use crate::tmdb::CatalogApi;
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

// Reviews are fetched one page deep, like the source material.
const REVIEW_PAGE: u32 = 1;

/// Mediator between the catalog client and the favorites store. Built once
/// at the composition root and shared by every screen.
///
/// Each network-backed read hands back a fresh single-request observable:
/// it settles to the parsed response, or to an absent value on any failure.
/// Failures never escape the public methods; they are logged and collapsed
/// into "no data" (indistinguishable from a legitimately empty result at
/// this contract).
pub struct Repository {
    catalog: Arc<dyn CatalogApi>,
    favorites: Arc<FavoritesStore>,
}

impl Repository {
    pub fn new(catalog: Arc<dyn CatalogApi>, favorites: Arc<FavoritesStore>) -> Self {
        Self { catalog, favorites }
    }

    pub fn movie_details(&self, movie_id: i64) -> Live<Option<MovieDetails>> {
        let catalog = Arc::clone(&self.catalog);
        fetch_live("movie details", async move { catalog.details(movie_id).await })
    }

    pub fn reviews(&self, movie_id: i64) -> Live<Option<ReviewPage>> {
        let catalog = Arc::clone(&self.catalog);
        fetch_live("reviews", async move {
            catalog.reviews(movie_id, REVIEW_PAGE).await
        })
    }

    pub fn videos(&self, movie_id: i64) -> Live<Option<VideoPage>> {
        let catalog = Arc::clone(&self.catalog);
        fetch_live("videos", async move { catalog.videos(movie_id).await })
    }

    /// Fresh single-use loader for one sort/search combination.
    pub fn pager(&self, sort: SortCriteria, search: &str) -> PageLoader {
        PageLoader::new(Arc::clone(&self.catalog), sort, search)
    }

    // Favorites pass straight through to the store, no transformation.

    pub fn favorite_movies(&self) -> Live<Vec<FavoriteEntry>> {
        self.favorites.all()
    }

    pub fn favorite_by_id(&self, movie_id: i64) -> Live<Option<FavoriteEntry>> {
        self.favorites.by_id(movie_id)
    }

    pub async fn add_favorite(&self, entry: FavoriteEntry) -> Result<()> {
        self.favorites.insert(entry).await
    }

    pub async fn remove_favorite(&self, entry: &FavoriteEntry) -> Result<()> {
        self.favorites.delete(entry).await
    }
}

/// One asynchronous request feeding one observable. The observable starts
/// absent, then settles exactly once.
fn fetch_live<T, Fut>(what: &'static str, fut: Fut) -> Live<Option<T>>
where
    T: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let source = Source::new(None);
    let live = source.live();
    tokio::spawn(async move {
        match fut.await {
            Ok(value) => source.set(Some(value)),
            Err(e) => {
                warn!("Failed getting {what}: {e:#}");
                source.set(None);
            }
        }
    });
    live
}
