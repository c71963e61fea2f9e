use crate::format::{format_currency, format_date, format_number, format_runtime, release_year};
use crate::models::{FavoriteEntry, MovieDetails, SortCriteria};
use crate::repository::Repository;
use crate::tmdb::image_url;
use crate::viewmodel::{FavoriteModel, InfoModel, MovieListModel, ReviewModel, TrailerModel};
use anyhow::Result;
use chrono::Utc;
use std::io::Write;
use std::sync::Arc;

/// What the main list is currently showing: one of the catalog listings
/// (or a search over it), or the locally persisted favorites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shelf {
    Catalog,
    Favorites,
}

/// The list screen: sort selector, free-text search, incremental paging,
/// and the favorites shelf. Renders into any writer so tests can capture
/// the output.
pub struct MainScreen {
    repository: Arc<Repository>,
    model: MovieListModel,
    sort: SortCriteria,
    search: String,
    shelf: Shelf,
}

impl MainScreen {
    pub fn new(repository: Arc<Repository>, sort: SortCriteria) -> Self {
        let model = MovieListModel::new(&repository, sort, "");
        Self {
            repository,
            model,
            sort,
            search: String::new(),
            shelf: Shelf::Catalog,
        }
    }

    pub fn sort(&self) -> SortCriteria {
        self.sort
    }

    pub fn shelf(&self) -> Shelf {
        self.shelf
    }

    /// Initial page of the current query.
    pub async fn open(&mut self, out: &mut impl Write) -> Result<()> {
        self.model.load_initial().await;
        self.render_catalog(out, 0)
    }

    pub async fn set_sort(&mut self, sort: SortCriteria, out: &mut impl Write) -> Result<()> {
        self.sort = sort;
        self.search.clear();
        self.shelf = Shelf::Catalog;
        self.model.reset(&self.repository, self.sort, "");
        self.open(out).await
    }

    pub async fn set_search(&mut self, search: &str, out: &mut impl Write) -> Result<()> {
        self.search = search.trim().to_string();
        self.shelf = Shelf::Catalog;
        self.model.reset(&self.repository, self.sort, &self.search);
        self.open(out).await
    }

    /// Re-runs the current query from page one with a fresh loader.
    pub async fn refresh(&mut self, out: &mut impl Write) -> Result<()> {
        match self.shelf {
            Shelf::Catalog => {
                self.model.reset(&self.repository, self.sort, &self.search);
                self.open(out).await
            }
            Shelf::Favorites => self.show_favorites(out),
        }
    }

    pub fn show_favorites(&mut self, out: &mut impl Write) -> Result<()> {
        self.shelf = Shelf::Favorites;
        let entries = self.model.favorites_now();
        writeln!(out, "== Favorites ({}) ==", entries.len())?;
        if entries.is_empty() {
            writeln!(out, "No favorite movies yet.")?;
            return Ok(());
        }
        for (i, entry) in entries.iter().enumerate() {
            writeln!(
                out,
                "{:>3}. {} ({})  {:.1}",
                i + 1,
                entry.title,
                entry.release_year,
                entry.vote_average
            )?;
        }
        Ok(())
    }

    /// Appends the next page and renders only the new rows.
    pub async fn load_more(&mut self, out: &mut impl Write) -> Result<()> {
        if self.shelf == Shelf::Favorites {
            writeln!(out, "The favorites shelf is not paged.")?;
            return Ok(());
        }
        let before = self.model.movies().len();
        let added = self.model.load_more().await;
        if added == 0 {
            writeln!(out, "Nothing more to load.")?;
            return Ok(());
        }
        self.render_catalog(out, before)
    }

    /// Re-renders the current shelf without reloading anything.
    pub fn render(&mut self, out: &mut impl Write) -> Result<()> {
        match self.shelf {
            Shelf::Catalog => self.render_catalog(out, 0),
            Shelf::Favorites => self.show_favorites(out),
        }
    }

    /// The movie behind a 1-based row number, for opening a detail screen.
    pub fn movie_at(&self, row: usize) -> Option<(i64, String)> {
        if row == 0 {
            return None;
        }
        match self.shelf {
            Shelf::Catalog => self
                .model
                .movies()
                .get(row - 1)
                .map(|m| (m.id, m.title.clone())),
            Shelf::Favorites => self
                .model
                .favorites_now()
                .get(row - 1)
                .map(|e| (e.movie_id, e.title.clone())),
        }
    }

    fn render_catalog(&self, out: &mut impl Write, from: usize) -> Result<()> {
        if from == 0 {
            let heading = if self.search.is_empty() {
                self.sort.label().to_string()
            } else {
                format!("Search \"{}\"", self.search)
            };
            writeln!(out, "== {heading} ==")?;
        }
        let movies = self.model.movies();
        if movies.is_empty() {
            // Failure and "zero results" look the same here; the log tells
            // them apart.
            writeln!(out, "No movies to show. You may be offline; try `refresh`.")?;
            return Ok(());
        }
        for (i, movie) in movies.iter().enumerate().skip(from) {
            let year = movie
                .release_date
                .as_deref()
                .map(release_year)
                .unwrap_or_default();
            writeln!(
                out,
                "{:>3}. {} ({})  {:.1}",
                i + 1,
                movie.title,
                year,
                movie.vote_average
            )?;
        }
        Ok(())
    }
}

/// The detail screen: information / cast / trailers / reviews tabs, the
/// favorite toggle, and the share action.
pub struct DetailScreen {
    repository: Arc<Repository>,
    movie_id: i64,
    title: String,
    info: InfoModel,
    reviews: ReviewModel,
    trailers: TrailerModel,
    favorite: FavoriteModel,
}

impl DetailScreen {
    pub fn new(repository: Arc<Repository>, movie_id: i64, title: String) -> Self {
        let info = InfoModel::new(&repository, movie_id);
        let reviews = ReviewModel::new(&repository, movie_id);
        let trailers = TrailerModel::new(&repository, movie_id);
        let favorite = FavoriteModel::new(&repository, movie_id);
        Self {
            repository,
            movie_id,
            title,
            info,
            reviews,
            trailers,
            favorite,
        }
    }

    pub async fn show_info(&mut self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "== {} ==", self.title)?;
        let Some(details) = self.info.details().await else {
            writeln!(out, "Movie details are unavailable. You may be offline.")?;
            return Ok(());
        };
        if self.favorite.entry().is_some() {
            writeln!(out, "* favorited *")?;
        }
        if details.original_title != details.title {
            writeln!(out, "Original title: {}", details.original_title)?;
        }
        if let Some(date) = details.release_date.as_deref() {
            writeln!(out, "Released: {}", format_date(date))?;
        }
        if let Some(runtime) = details.runtime {
            writeln!(out, "Runtime: {}", format_runtime(runtime))?;
        }
        if let Some(status) = details.status.as_deref() {
            writeln!(out, "Status: {status}")?;
        }
        writeln!(
            out,
            "Rating: {:.1} ({} votes)",
            details.vote_average,
            format_number(details.vote_count)
        )?;
        if details.budget > 0 {
            writeln!(out, "Budget: {}", format_currency(details.budget))?;
        }
        if details.revenue > 0 {
            writeln!(out, "Revenue: {}", format_currency(details.revenue))?;
        }
        if !details.genres.is_empty() {
            writeln!(out, "Genres: {}", genre_text(&details))?;
        }
        if let Some(poster) = details.poster_path.as_deref() {
            writeln!(out, "Poster: {}", image_url(poster))?;
        }
        if !details.overview.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", details.overview)?;
        }
        Ok(())
    }

    pub async fn show_cast(&mut self, out: &mut impl Write) -> Result<()> {
        let Some(details) = self.info.details().await else {
            writeln!(out, "Cast is unavailable. You may be offline.")?;
            return Ok(());
        };
        if details.credits.cast.is_empty() {
            writeln!(out, "No cast information found.")?;
            return Ok(());
        }
        for member in &details.credits.cast {
            if member.character.is_empty() {
                writeln!(out, "{}", member.name)?;
            } else {
                writeln!(out, "{} as {}", member.name, member.character)?;
            }
        }
        let directors: Vec<&str> = details
            .credits
            .crew
            .iter()
            .filter(|c| c.job.as_deref() == Some("Director"))
            .map(|c| c.name.as_str())
            .collect();
        if !directors.is_empty() {
            writeln!(out, "Directed by {}", directors.join(", "))?;
        }
        Ok(())
    }

    /// Lists watch URLs for an external player; the first YouTube trailer
    /// is marked as primary.
    pub async fn show_trailers(&mut self, out: &mut impl Write) -> Result<()> {
        let Some(page) = self.trailers.videos().await else {
            writeln!(out, "Trailers are unavailable. You may be offline.")?;
            return Ok(());
        };
        if page.results.is_empty() {
            writeln!(out, "No trailers found.")?;
            return Ok(());
        }
        let primary = page.results.iter().position(|v| v.is_youtube_trailer());
        for (i, video) in page.results.iter().enumerate() {
            let marker = if Some(i) == primary { " (trailer)" } else { "" };
            writeln!(out, "{}{}: {}", video.name, marker, video.watch_url())?;
        }
        Ok(())
    }

    pub async fn show_reviews(&mut self, out: &mut impl Write) -> Result<()> {
        let Some(page) = self.reviews.reviews().await else {
            writeln!(out, "Reviews are unavailable. You may be offline.")?;
            return Ok(());
        };
        if page.results.is_empty() {
            writeln!(out, "No reviews found.")?;
            return Ok(());
        }
        for review in &page.results {
            writeln!(out, "-- {} --", review.author)?;
            writeln!(out, "{}", review.content)?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// Inserts or removes the favorites row for this movie and waits for
    /// the observable to reflect the commit before reporting.
    pub async fn toggle_favorite(&mut self, out: &mut impl Write) -> Result<()> {
        if let Some(entry) = self.favorite.entry() {
            self.repository.remove_favorite(&entry).await?;
            self.favorite.wait_absent().await;
            writeln!(out, "Removed \"{}\" from favorites.", self.title)?;
        } else {
            let Some(details) = self.info.details().await else {
                writeln!(out, "Details are unavailable; cannot favorite right now.")?;
                return Ok(());
            };
            self.repository
                .add_favorite(favorite_entry_from(&details))
                .await?;
            let _ = self.favorite.wait_present().await;
            writeln!(out, "Added \"{}\" to favorites.", self.title)?;
        }
        Ok(())
    }

    pub fn share(&self, out: &mut impl Write) -> Result<()> {
        writeln!(
            out,
            "Share: https://www.themoviedb.org/movie/{}",
            self.movie_id
        )?;
        Ok(())
    }
}

/// Favorites row seeded from a detail response, display strings included.
pub fn favorite_entry_from(details: &MovieDetails) -> FavoriteEntry {
    FavoriteEntry {
        movie_id: details.id,
        original_title: details.original_title.clone(),
        title: details.title.clone(),
        poster_path: details.poster_path.clone(),
        backdrop_path: details.backdrop_path.clone(),
        overview: details.overview.clone(),
        vote_average: details.vote_average,
        release_date: details.release_date.clone(),
        favored_at: Utc::now().to_rfc3339(),
        runtime_text: details.runtime.map(format_runtime).unwrap_or_default(),
        release_year: details
            .release_date
            .as_deref()
            .map(release_year)
            .unwrap_or_default(),
        genre_text: genre_text(details),
    }
}

fn genre_text(details: &MovieDetails) -> String {
    details
        .genres
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
