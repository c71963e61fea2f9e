use anyhow::{anyhow, Result};
use async_trait::async_trait;
use marquee::models::{Movie, MovieDetails, MoviePage, ReviewPage, SortCriteria, VideoPage};
use marquee::pager::{PageLoader, PageQuery};
use marquee::tmdb::CatalogApi;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Movies(String, u32),
    Search(String, u32),
}

struct FakeCatalog {
    calls: Mutex<Vec<Call>>,
    total_pages: u32,
    page_size: usize,
    fail: Mutex<bool>,
}

impl FakeCatalog {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            total_pages: 500,
            page_size: 20,
            fail: Mutex::new(false),
        }
    }

    fn failing() -> Self {
        Self {
            fail: Mutex::new(true),
            ..Self::new()
        }
    }

    fn page(&self, page: u32) -> MoviePage {
        MoviePage {
            page,
            total_pages: self.total_pages,
            results: (0..self.page_size)
                .map(|i| movie(page as i64 * 1000 + i as i64))
                .collect(),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

fn movie(id: i64) -> Movie {
    Movie {
        id,
        original_title: format!("Movie {id}"),
        title: format!("Movie {id}"),
        poster_path: None,
        overview: String::new(),
        vote_average: 7.0,
        release_date: Some("2018-06-23".to_string()),
        backdrop_path: None,
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn movies(&self, sort: SortCriteria, page: u32) -> Result<MoviePage> {
        // Suspend once so concurrent loads overlap like real requests do.
        tokio::task::yield_now().await;
        self.calls
            .lock()
            .unwrap()
            .push(Call::Movies(sort.as_path().to_string(), page));
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("network down"));
        }
        Ok(self.page(page))
    }

    async fn search(&self, query: &str, page: u32) -> Result<MoviePage> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Search(query.to_string(), page));
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("network down"));
        }
        Ok(self.page(page))
    }

    async fn details(&self, _movie_id: i64) -> Result<MovieDetails> {
        Err(anyhow!("not used by the pager"))
    }

    async fn reviews(&self, _movie_id: i64, _page: u32) -> Result<ReviewPage> {
        Err(anyhow!("not used by the pager"))
    }

    async fn videos(&self, _movie_id: i64) -> Result<VideoPage> {
        Err(anyhow!("not used by the pager"))
    }
}

#[tokio::test]
async fn initial_load_with_sort_hits_the_listing_endpoint() {
    let catalog = Arc::new(FakeCatalog::new());
    let loader = PageLoader::new(catalog.clone(), SortCriteria::Popular, "");

    let chunk = loader.load_initial().await.expect("initial page");
    assert_eq!(chunk.items.len(), 20);
    assert_eq!(chunk.next_key, Some(2));
    assert_eq!(catalog.calls(), vec![Call::Movies("popular".to_string(), 1)]);
}

#[tokio::test]
async fn every_sort_criteria_maps_to_its_own_path() {
    for (sort, path) in [
        (SortCriteria::Popular, "popular"),
        (SortCriteria::TopRated, "top_rated"),
        (SortCriteria::Upcoming, "upcoming"),
    ] {
        let catalog = Arc::new(FakeCatalog::new());
        let loader = PageLoader::new(catalog.clone(), sort, "");
        loader.load_initial().await.expect("initial page");
        assert_eq!(catalog.calls(), vec![Call::Movies(path.to_string(), 1)]);
    }
}

#[tokio::test]
async fn initial_load_with_search_hits_the_search_endpoint() {
    let catalog = Arc::new(FakeCatalog::new());
    let loader = PageLoader::new(catalog.clone(), SortCriteria::Popular, "batman");
    assert_eq!(loader.query(), &PageQuery::Search("batman".to_string()));

    let chunk = loader.load_initial().await.expect("initial page");
    assert_eq!(chunk.next_key, Some(2));
    assert_eq!(catalog.calls(), vec![Call::Search("batman".to_string(), 1)]);
}

#[tokio::test]
async fn appends_emit_incrementing_keys() {
    let catalog = Arc::new(FakeCatalog::new());
    let loader = PageLoader::new(catalog.clone(), SortCriteria::Popular, "");

    let first = loader.load_initial().await.expect("initial page");
    assert_eq!(first.items.len(), 20);
    assert_eq!(first.next_key, Some(2));

    let second = loader.load_after(2).await.expect("page two");
    assert_eq!(second.items.len(), 20);
    assert_eq!(second.next_key, Some(3));

    assert_eq!(
        catalog.calls(),
        vec![
            Call::Movies("popular".to_string(), 1),
            Call::Movies("popular".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn a_successfully_loaded_key_is_never_rerequested() {
    let catalog = Arc::new(FakeCatalog::new());
    let loader = PageLoader::new(catalog.clone(), SortCriteria::Popular, "");

    assert!(loader.load_after(2).await.is_some());
    assert!(loader.load_after(2).await.is_none());
    assert!(loader.load_initial().await.is_some());
    assert!(loader.load_initial().await.is_none());
    assert_eq!(
        catalog.calls(),
        vec![
            Call::Movies("popular".to_string(), 2),
            Call::Movies("popular".to_string(), 1),
        ]
    );
}

#[tokio::test]
async fn load_before_never_issues_a_network_call() {
    let catalog = Arc::new(FakeCatalog::new());
    let loader = PageLoader::new(catalog.clone(), SortCriteria::TopRated, "");

    assert!(loader.load_before(1).await.is_none());
    assert!(loader.load_before(7).await.is_none());
    assert!(catalog.calls().is_empty());
}

#[tokio::test]
async fn failed_loads_supply_nothing_and_are_not_retried() {
    let catalog = Arc::new(FakeCatalog::failing());
    let loader = PageLoader::new(catalog.clone(), SortCriteria::Popular, "");

    assert!(loader.load_initial().await.is_none());
    assert!(loader.load_after(2).await.is_none());
    // One attempt per trigger, nothing more.
    assert_eq!(catalog.calls().len(), 2);
}

#[tokio::test]
async fn next_key_is_absent_at_the_end_of_the_catalog() {
    let catalog = Arc::new(FakeCatalog {
        total_pages: 3,
        ..FakeCatalog::new()
    });
    let loader = PageLoader::new(catalog.clone(), SortCriteria::Upcoming, "");

    let last = loader.load_after(3).await.expect("last page");
    assert_eq!(last.next_key, None);
}

#[tokio::test]
async fn concurrent_appends_may_finish_out_of_order() {
    let catalog = Arc::new(FakeCatalog::new());
    let loader = PageLoader::new(catalog.clone(), SortCriteria::Popular, "");

    let (five, four) = tokio::join!(loader.load_after(5), loader.load_after(4));
    assert_eq!(five.expect("page five").next_key, Some(6));
    assert_eq!(four.expect("page four").next_key, Some(5));
}

#[tokio::test]
async fn concurrent_loads_of_one_key_fetch_it_once() {
    let catalog = Arc::new(FakeCatalog::new());
    let loader = PageLoader::new(catalog.clone(), SortCriteria::Popular, "");

    let (a, b) = tokio::join!(loader.load_after(2), loader.load_after(2));
    assert_eq!(a.is_some() as usize + b.is_some() as usize, 1);
    assert_eq!(catalog.calls(), vec![Call::Movies("popular".to_string(), 2)]);
}

#[tokio::test]
async fn a_failed_key_stays_requestable() {
    let catalog = Arc::new(FakeCatalog::new());
    let loader = PageLoader::new(catalog.clone(), SortCriteria::Popular, "");

    // The fake fails page loads on demand, one at a time.
    *catalog.fail.lock().unwrap() = true;
    assert!(loader.load_after(2).await.is_none());

    *catalog.fail.lock().unwrap() = false;
    assert_eq!(loader.load_after(2).await.expect("retrigger").next_key, Some(3));
}
