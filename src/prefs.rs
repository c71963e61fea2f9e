use crate::models::SortCriteria;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct Prefs {
    sort_by: SortCriteria,
}

/// `MARQUEE_PREFS`, or `<data_dir>/marquee/prefs.json`.
pub fn default_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("MARQUEE_PREFS") {
        return Ok(PathBuf::from(path));
    }
    let data = dirs::data_dir().context("could not determine the user data directory")?;
    Ok(data.join("marquee").join("prefs.json"))
}

/// Sort criteria last chosen by the user; "popular" until one is stored.
pub fn preferred_sort(path: &Path) -> SortCriteria {
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<Prefs>(&raw) {
            Ok(prefs) => prefs.sort_by,
            Err(e) => {
                debug!("Ignoring malformed preferences file: {e}");
                SortCriteria::Popular
            }
        },
        Err(_) => SortCriteria::Popular,
    }
}

pub fn set_preferred_sort(path: &Path, sort_by: SortCriteria) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let raw = serde_json::to_string_pretty(&Prefs { sort_by })?;
    fs::write(path, raw).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_the_preferred_sort() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        assert_eq!(preferred_sort(&path), SortCriteria::Popular);
        set_preferred_sort(&path, SortCriteria::TopRated).expect("store");
        assert_eq!(preferred_sort(&path), SortCriteria::TopRated);
    }

    #[test]
    fn malformed_file_falls_back_to_popular() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").expect("write");
        assert_eq!(preferred_sort(&path), SortCriteria::Popular);
    }
}
