use crate::models::{MovieDetails, MoviePage, ReviewPage, SortCriteria, VideoPage};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Web URL of a poster or backdrop path returned by the catalog.
pub fn image_url(path: &str) -> String {
    format!("{POSTER_BASE}{path}")
}

/// The five read-only catalog endpoints. No retry, no caching: a failed
/// attempt surfaces as an error and the caller gets no data for it.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET movie/{sort_criteria}` -- one page of a sort-ordered listing.
    async fn movies(&self, sort: SortCriteria, page: u32) -> Result<MoviePage>;
    /// `GET search/movie` -- one page of free-text search results.
    async fn search(&self, query: &str, page: u32) -> Result<MoviePage>;
    /// `GET movie/{id}` with credits appended.
    async fn details(&self, movie_id: i64) -> Result<MovieDetails>;
    /// `GET movie/{id}/reviews`.
    async fn reviews(&self, movie_id: i64, page: u32) -> Result<ReviewPage>;
    /// `GET movie/{id}/videos`.
    async fn videos(&self, movie_id: i64) -> Result<VideoPage>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let language = env::var("MARQUEE_LANGUAGE").unwrap_or_else(|_| "en-US".to_string());
        Ok(Self {
            client: Client::new(),
            api_key,
            language,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self.client.get(url).send().await.context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(anyhow!("Invalid API key (status {})", status.as_u16()));
        }
        if !status.is_success() {
            return Err(anyhow!("{} -> {}", url, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn movies(&self, sort: SortCriteria, page: u32) -> Result<MoviePage> {
        let url = format!(
            "{TMDB_BASE}/movie/{}?api_key={}&language={}&page={page}",
            sort.as_path(),
            self.api_key,
            self.language
        );
        self.get_json(&url).await
    }

    async fn search(&self, query: &str, page: u32) -> Result<MoviePage> {
        let url = format!(
            "{TMDB_BASE}/search/movie?api_key={}&language={}&page={page}&query={}",
            self.api_key,
            self.language,
            urlencoding::encode(query)
        );
        self.get_json(&url).await
    }

    async fn details(&self, movie_id: i64) -> Result<MovieDetails> {
        let url = format!(
            "{TMDB_BASE}/movie/{movie_id}?api_key={}&language={}&append_to_response=credits",
            self.api_key, self.language
        );
        self.get_json(&url).await
    }

    async fn reviews(&self, movie_id: i64, page: u32) -> Result<ReviewPage> {
        let url = format!(
            "{TMDB_BASE}/movie/{movie_id}/reviews?api_key={}&language={}&page={page}",
            self.api_key, self.language
        );
        self.get_json(&url).await
    }

    async fn videos(&self, movie_id: i64) -> Result<VideoPage> {
        let url = format!(
            "{TMDB_BASE}/movie/{movie_id}/videos?api_key={}&language={}",
            self.api_key, self.language
        );
        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_listing_page() {
        let value = json!({
            "page": 1,
            "total_pages": 500,
            "results": [{
                "id": 299536,
                "original_title": "Avengers: Infinity War",
                "title": "Avengers: Infinity War",
                "poster_path": "/7WsyChQLEftFiDOVTGkv3hFpyyt.jpg",
                "overview": "As the Avengers and their allies...",
                "vote_average": 8.3,
                "release_date": "2018-04-25",
                "backdrop_path": "/bOGkgRGdhrBYJSLpXaxhXVstddV.jpg"
            }]
        });
        let page: MoviePage = serde_json::from_value(value).expect("page deserialize");
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 500);
        assert_eq!(page.results[0].id, 299536);
    }

    #[test]
    fn deserializes_details_with_appended_credits() {
        let value = json!({
            "id": 299536,
            "original_title": "Avengers: Infinity War",
            "title": "Avengers: Infinity War",
            "poster_path": null,
            "backdrop_path": null,
            "overview": "As the Avengers and their allies...",
            "vote_average": 8.3,
            "vote_count": 12000,
            "release_date": "2018-04-25",
            "runtime": 149,
            "budget": 300000000i64,
            "revenue": 2046239637i64,
            "status": "Released",
            "genres": [{ "id": 12, "name": "Adventure" }],
            "credits": {
                "cast": [{ "name": "Robert Downey Jr.", "character": "Tony Stark", "profile_path": null }],
                "crew": [{ "name": "Anthony Russo", "job": "Director", "profile_path": null }]
            }
        });
        let details: MovieDetails = serde_json::from_value(value).expect("details deserialize");
        assert_eq!(details.runtime, Some(149));
        assert_eq!(details.genres[0].name, "Adventure");
        assert_eq!(details.credits.cast[0].character, "Tony Stark");
        assert_eq!(details.credits.crew[0].job.as_deref(), Some("Director"));
    }

    #[test]
    fn deserializes_videos_and_picks_trailer_url() {
        let value = json!({
            "results": [
                { "id": "a", "key": "teaser-key", "name": "Teaser", "site": "YouTube", "type": "Teaser" },
                { "id": "b", "key": "trailer-key", "name": "Official Trailer", "site": "YouTube", "type": "Trailer" }
            ]
        });
        let page: VideoPage = serde_json::from_value(value).expect("videos deserialize");
        let trailer = page.results.iter().find(|v| v.is_youtube_trailer());
        assert_eq!(
            trailer.map(|v| v.watch_url()).as_deref(),
            Some("https://www.youtube.com/watch?v=trailer-key")
        );
    }
}
