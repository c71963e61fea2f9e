use crate::models::SortCriteria;
use crate::prefs;
use crate::repository::Repository;
use crate::screens::{DetailScreen, MainScreen};
use crate::store::{default_db_path, FavoritesStore};
use crate::tmdb::{CatalogApi, TmdbClient};
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};

/// Composition root: builds the catalog client, the favorites store and
/// the repository once, then drives the interactive session until EOF or
/// Ctrl+C.
pub async fn run() -> Result<()> {
    let catalog: Arc<dyn CatalogApi> = Arc::new(TmdbClient::from_env()?);
    let store = Arc::new(FavoritesStore::open(&default_db_path()?)?);
    let repository = Arc::new(Repository::new(catalog, store));

    let prefs_path = prefs::default_path()?;
    let sort = prefs::preferred_sort(&prefs_path);
    info!("Starting on the {} listing", sort.label());

    let mut session = Session {
        repository: Arc::clone(&repository),
        prefs_path,
        main: MainScreen::new(repository, sort),
        detail: None,
    };

    let mut buf = Vec::new();
    writeln!(buf, "marquee -- type `help` for commands")?;
    session.main.open(&mut buf).await?;
    flush(&buf)?;

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received (Ctrl+C)");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let mut buf = Vec::new();
                let quit = session.handle(line.trim(), &mut buf).await?;
                flush(&buf)?;
                if quit {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn flush(buf: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(buf)?;
    stdout.flush()?;
    Ok(())
}

struct Session {
    repository: Arc<Repository>,
    prefs_path: PathBuf,
    main: MainScreen,
    detail: Option<DetailScreen>,
}

impl Session {
    /// Dispatches one command line. Returns true when the session should
    /// end.
    async fn handle(&mut self, line: &str, out: &mut Vec<u8>) -> Result<bool> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(false);
        };
        let args: Vec<&str> = parts.collect();

        match cmd {
            "help" => print_help(out)?,
            "quit" | "exit" => return Ok(true),
            "sort" => match args.first() {
                Some(&"favorites") => {
                    self.detail = None;
                    self.main.show_favorites(out)?;
                }
                Some(raw) => match raw.parse::<SortCriteria>() {
                    Ok(sort) => {
                        self.detail = None;
                        if let Err(e) = prefs::set_preferred_sort(&self.prefs_path, sort) {
                            warn!("Could not persist the sort preference: {e:#}");
                        }
                        self.main.set_sort(sort, out).await?;
                    }
                    Err(_) => writeln!(out, "Sorts: popular, top-rated, upcoming, favorites")?,
                },
                None => writeln!(out, "Usage: sort <popular|top-rated|upcoming|favorites>")?,
            },
            "search" => {
                if args.is_empty() {
                    writeln!(out, "Usage: search <text>")?;
                } else {
                    self.detail = None;
                    self.main.set_search(&args.join(" "), out).await?;
                }
            }
            "more" => self.main.load_more(out).await?,
            "refresh" => {
                self.detail = None;
                self.main.refresh(out).await?;
            }
            "open" => match args.first().and_then(|raw| raw.parse::<usize>().ok()) {
                Some(row) => match self.main.movie_at(row) {
                    Some((movie_id, title)) => {
                        let mut detail =
                            DetailScreen::new(Arc::clone(&self.repository), movie_id, title);
                        detail.show_info(out).await?;
                        self.detail = Some(detail);
                    }
                    None => writeln!(out, "No such row.")?,
                },
                None => writeln!(out, "Usage: open <row number>")?,
            },
            "info" | "cast" | "trailers" | "reviews" | "fav" | "share" => {
                let Some(detail) = self.detail.as_mut() else {
                    writeln!(out, "Open a movie first (`open <row>`).")?;
                    return Ok(false);
                };
                match cmd {
                    "info" => detail.show_info(out).await?,
                    "cast" => detail.show_cast(out).await?,
                    "trailers" => detail.show_trailers(out).await?,
                    "reviews" => detail.show_reviews(out).await?,
                    "fav" => detail.toggle_favorite(out).await?,
                    "share" => detail.share(out)?,
                    _ => unreachable!(),
                }
            }
            "back" => {
                self.detail = None;
                self.main.render(out)?;
            }
            other => writeln!(out, "Unknown command `{other}`; type `help`.")?,
        }
        Ok(false)
    }
}

fn print_help(out: &mut impl Write) -> Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  sort <popular|top-rated|upcoming|favorites>")?;
    writeln!(out, "  search <text>      search the catalog")?;
    writeln!(out, "  more               load the next page")?;
    writeln!(out, "  refresh            reload the current list from page one")?;
    writeln!(out, "  open <row>         open a movie's detail screen")?;
    writeln!(out, "  info|cast|trailers|reviews   detail tabs")?;
    writeln!(out, "  fav                toggle favorite for the open movie")?;
    writeln!(out, "  share              print the movie's web link")?;
    writeln!(out, "  back               return to the list")?;
    writeln!(out, "  quit")?;
    Ok(())
}
