use crate::models::FavoriteEntry;
use crate::observe::{Live, Source};
use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, Row};
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

/// Single-table local store of favorited movies, keyed by the movie id.
/// `all` and `by_id` are live observables: every committed insert or delete
/// publishes the new row set exactly once.
pub struct FavoritesStore {
    pool: Pool<SqliteConnectionManager>,
    rows: Source<Vec<FavoriteEntry>>,
    // Serializes mutations so each emission reflects one committed write.
    write_lock: tokio::sync::Mutex<()>,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS favorite (
    movie_id       INTEGER PRIMARY KEY,
    original_title TEXT NOT NULL,
    title          TEXT NOT NULL,
    poster_path    TEXT,
    backdrop_path  TEXT,
    overview       TEXT NOT NULL,
    vote_average   REAL NOT NULL,
    release_date   TEXT,
    favored_at     TEXT NOT NULL,
    runtime_text   TEXT NOT NULL,
    release_year   TEXT NOT NULL,
    genre_text     TEXT NOT NULL
)";

/// `MARQUEE_DB`, or `<data_dir>/marquee/marquee.db`.
pub fn default_db_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("MARQUEE_DB") {
        return Ok(PathBuf::from(path));
    }
    let data = dirs::data_dir().context("could not determine the user data directory")?;
    Ok(data.join("marquee").join("marquee.db"))
}

impl FavoritesStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
        });
        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .context("creating the favorites connection pool")?;
        info!("Favorites database at {}", path.display());
        Self::with_pool(pool)
    }

    /// In-memory store for tests. A single pooled connection, so every
    /// handle sees the same database.
    pub fn in_memory() -> Result<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .context("creating the in-memory pool")?;
        Self::with_pool(pool)
    }

    fn with_pool(pool: Pool<SqliteConnectionManager>) -> Result<Self> {
        let conn = pool.get()?;
        conn.execute(SCHEMA, [])?;
        let initial = query_all(&conn)?;
        drop(conn);
        Ok(Self {
            pool,
            rows: Source::new(initial),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Insert-or-replace; at most one row per movie id.
    pub async fn insert(&self, entry: FavoriteEntry) -> Result<()> {
        let _write = self.write_lock.lock().await;
        let pool = self.pool.clone();
        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<FavoriteEntry>> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT OR REPLACE INTO favorite (
                    movie_id, original_title, title, poster_path, backdrop_path,
                    overview, vote_average, release_date, favored_at,
                    runtime_text, release_year, genre_text
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    entry.movie_id,
                    entry.original_title,
                    entry.title,
                    entry.poster_path,
                    entry.backdrop_path,
                    entry.overview,
                    entry.vote_average,
                    entry.release_date,
                    entry.favored_at,
                    entry.runtime_text,
                    entry.release_year,
                    entry.genre_text,
                ],
            )?;
            query_all(&conn)
        })
        .await
        .context("favorites writer task failed")??;
        self.rows.set(rows);
        Ok(())
    }

    pub async fn delete(&self, entry: &FavoriteEntry) -> Result<()> {
        let _write = self.write_lock.lock().await;
        let pool = self.pool.clone();
        let movie_id = entry.movie_id;
        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<FavoriteEntry>> {
            let conn = pool.get()?;
            conn.execute("DELETE FROM favorite WHERE movie_id = ?1", params![movie_id])?;
            query_all(&conn)
        })
        .await
        .context("favorites writer task failed")??;
        self.rows.set(rows);
        Ok(())
    }

    /// Live view of the whole table, most recently favored first.
    pub fn all(&self) -> Live<Vec<FavoriteEntry>> {
        self.rows.live()
    }

    /// Live view of one row, absent while the movie is not favored.
    pub fn by_id(&self, movie_id: i64) -> Live<Option<FavoriteEntry>> {
        self.rows
            .live()
            .map(move |rows| rows.iter().find(|e| e.movie_id == movie_id).cloned())
    }
}

fn query_all(conn: &Connection) -> Result<Vec<FavoriteEntry>> {
    let mut stmt =
        conn.prepare("SELECT * FROM favorite ORDER BY favored_at DESC, movie_id DESC")?;
    let entries = stmt
        .query_map([], row_to_entry)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

fn row_to_entry(row: &Row) -> rusqlite::Result<FavoriteEntry> {
    Ok(FavoriteEntry {
        movie_id: row.get("movie_id")?,
        original_title: row.get("original_title")?,
        title: row.get("title")?,
        poster_path: row.get("poster_path")?,
        backdrop_path: row.get("backdrop_path")?,
        overview: row.get("overview")?,
        vote_average: row.get("vote_average")?,
        release_date: row.get("release_date")?,
        favored_at: row.get("favored_at")?,
        runtime_text: row.get("runtime_text")?,
        release_year: row.get("release_year")?,
        genre_text: row.get("genre_text")?,
    })
}
