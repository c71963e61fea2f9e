use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which catalog listing backs the main list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortCriteria {
    Popular,
    TopRated,
    Upcoming,
}

impl SortCriteria {
    /// Path segment of the listing endpoint (`GET movie/{sort_criteria}`).
    pub fn as_path(&self) -> &'static str {
        match self {
            SortCriteria::Popular => "popular",
            SortCriteria::TopRated => "top_rated",
            SortCriteria::Upcoming => "upcoming",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortCriteria::Popular => "Popular",
            SortCriteria::TopRated => "Top Rated",
            SortCriteria::Upcoming => "Upcoming",
        }
    }
}

impl fmt::Display for SortCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortCriteria {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "popular" => Ok(SortCriteria::Popular),
            "top-rated" | "top_rated" | "top" => Ok(SortCriteria::TopRated),
            "upcoming" => Ok(SortCriteria::Upcoming),
            other => Err(anyhow!("Unknown sort criteria '{}'", other)),
        }
    }
}

/// One movie as it appears in a listing or search result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub original_title: String,
    pub title: String,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub vote_average: f64,
    pub release_date: Option<String>,
    pub backdrop_path: Option<String>,
}

/// One page of a listing or search response. Transient: drives the paged
/// list loader and is not retained beyond the load that produced it.
#[derive(Debug, Clone, Deserialize)]
pub struct MoviePage {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<Movie>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Genre {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// Full detail response (`append_to_response=credits`). Fetched once per
/// detail view, never persisted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    pub original_title: String,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    pub release_date: Option<String>,
    pub runtime: Option<i64>,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub revenue: i64,
    pub status: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub credits: Credits,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub content: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewPage {
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    pub results: Vec<Review>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Video {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        self.site.eq_ignore_ascii_case("YouTube") && self.video_type == "Trailer"
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.key)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoPage {
    pub results: Vec<Video>,
}

/// The sole persisted entity: a movie the user favored, keyed by the movie
/// id. Carries three precomputed display strings so the favorites shelf
/// renders without touching the network.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteEntry {
    pub movie_id: i64,
    pub original_title: String,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: String,
    pub vote_average: f64,
    pub release_date: Option<String>,
    pub favored_at: String,
    pub runtime_text: String,
    pub release_year: String,
    pub genre_text: String,
}
