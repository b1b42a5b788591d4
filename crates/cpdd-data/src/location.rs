//! Local download location
//!
//! The process-wide location is resolved on every path computation, in
//! this order: a value set with [`set_download_location`], the
//! `CPDD_DOWNLOAD_LOCATION` environment variable, then `~/.cpdd_dataset`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;

/// Environment variable overriding the default download location
pub const LOCATION_ENV: &str = "CPDD_DOWNLOAD_LOCATION";

/// Directory name used below the home directory when nothing is configured
const DEFAULT_DIR_NAME: &str = ".cpdd_dataset";

static DOWNLOAD_LOCATION: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Current process-wide download location
pub fn download_location() -> PathBuf {
    let explicit = DOWNLOAD_LOCATION
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    resolve(explicit, std::env::var(LOCATION_ENV).ok())
}

/// Set the process-wide download location, creating the directory
///
/// Files already opened keep their paths; only paths computed afterwards
/// see the new location.
pub fn set_download_location(path: impl AsRef<Path>) -> io::Result<()> {
    let path = expand_tilde(path.as_ref());
    std::fs::create_dir_all(&path)?;
    info!(path = %path.display(), "Download location set");
    *DOWNLOAD_LOCATION
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(path);
    Ok(())
}

fn resolve(explicit: Option<PathBuf>, env: Option<String>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    match env {
        Some(value) if !value.trim().is_empty() => expand_tilde(Path::new(value.trim())),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME),
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Where a dataset keeps its downloaded files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LocationStore {
    /// Follow the process-wide download location
    #[default]
    Global,
    /// A location fixed for the lifetime of the dataset handle
    Fixed(PathBuf),
}

impl LocationStore {
    pub fn fixed(path: impl AsRef<Path>) -> Self {
        LocationStore::Fixed(expand_tilde(path.as_ref()))
    }

    /// Root directory, resolved now
    pub fn root(&self) -> PathBuf {
        match self {
            LocationStore::Global => download_location(),
            LocationStore::Fixed(path) => path.clone(),
        }
    }
}
