//! Per-screen holders. Each one asks the repository for exactly one
//! observable (or one loader) when constructed and exposes it unchanged;
//! no transformation or merging happens in this layer.

use crate::models::{FavoriteEntry, Movie, MovieDetails, ReviewPage, SortCriteria, VideoPage};
use crate::observe::Live;
use crate::pager::PageLoader;
use crate::repository::Repository;

/// Backs the main list: one single-use page loader plus the buffered pages
/// it produced, and the live favorites row set for the favorites shelf.
pub struct MovieListModel {
    loader: PageLoader,
    movies: Vec<Movie>,
    next_key: Option<u32>,
    favorites: Live<Vec<FavoriteEntry>>,
}

impl MovieListModel {
    pub fn new(repository: &Repository, sort: SortCriteria, search: &str) -> Self {
        Self {
            loader: repository.pager(sort, search),
            movies: Vec::new(),
            next_key: None,
            favorites: repository.favorite_movies(),
        }
    }

    /// New loader for a new sort/search combination; buffered pages from
    /// the old loader are discarded.
    pub fn reset(&mut self, repository: &Repository, sort: SortCriteria, search: &str) {
        *self = MovieListModel::new(repository, sort, search);
    }

    /// First page. Returns how many items arrived (zero on failure; the
    /// list then stays empty until `reset`).
    pub async fn load_initial(&mut self) -> usize {
        match self.loader.load_initial().await {
            Some(chunk) => {
                let added = chunk.items.len();
                self.movies.extend(chunk.items);
                self.next_key = chunk.next_key;
                added
            }
            None => 0,
        }
    }

    /// Next page, if any remains. Zero on failure or at the end of the
    /// catalog; a failed append is not retried.
    pub async fn load_more(&mut self) -> usize {
        let Some(key) = self.next_key else {
            return 0;
        };
        match self.loader.load_after(key).await {
            Some(chunk) => {
                let added = chunk.items.len();
                self.movies.extend(chunk.items);
                self.next_key = chunk.next_key;
                added
            }
            None => 0,
        }
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn favorites_now(&self) -> Vec<FavoriteEntry> {
        self.favorites.current()
    }
}

/// Details for the information and cast tabs.
pub struct InfoModel {
    details: Live<Option<MovieDetails>>,
}

impl InfoModel {
    pub fn new(repository: &Repository, movie_id: i64) -> Self {
        Self {
            details: repository.movie_details(movie_id),
        }
    }

    pub async fn details(&mut self) -> Option<MovieDetails> {
        self.details.settled().await
    }
}

pub struct ReviewModel {
    reviews: Live<Option<ReviewPage>>,
}

impl ReviewModel {
    pub fn new(repository: &Repository, movie_id: i64) -> Self {
        Self {
            reviews: repository.reviews(movie_id),
        }
    }

    pub async fn reviews(&mut self) -> Option<ReviewPage> {
        self.reviews.settled().await
    }
}

pub struct TrailerModel {
    videos: Live<Option<VideoPage>>,
}

impl TrailerModel {
    pub fn new(repository: &Repository, movie_id: i64) -> Self {
        Self {
            videos: repository.videos(movie_id),
        }
    }

    pub async fn videos(&mut self) -> Option<VideoPage> {
        self.videos.settled().await
    }
}

/// Live favorite row for one movie; drives the favorite toggle.
pub struct FavoriteModel {
    entry: Live<Option<FavoriteEntry>>,
}

impl FavoriteModel {
    pub fn new(repository: &Repository, movie_id: i64) -> Self {
        Self {
            entry: repository.favorite_by_id(movie_id),
        }
    }

    pub fn entry(&self) -> Option<FavoriteEntry> {
        self.entry.current()
    }

    /// Waits for the row to appear after an insert commits.
    pub async fn wait_present(&mut self) -> Option<FavoriteEntry> {
        self.entry.wait_for(|v| v.is_some()).await.flatten()
    }

    /// Waits for the row to disappear after a delete commits.
    pub async fn wait_absent(&mut self) {
        let _ = self.entry.wait_for(|v| v.is_none()).await;
    }
}
