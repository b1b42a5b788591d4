//! Settings file loading

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::location::LocationStore;
use crate::remote::{RemoteLayout, DEFAULT_BUCKET, DEFAULT_PREFIX};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Contents of `cpdd.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub remote: RemoteSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Fixed download location; the process-wide location is used when absent
    #[serde(default)]
    pub location: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// HTTPS endpoint; derived from the bucket name when absent
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Local directory laid out like the bucket, used instead of HTTP
    #[serde(default)]
    pub mirror: Option<PathBuf>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            prefix: default_prefix(),
            endpoint: None,
            mirror: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_timeout() -> u64 {
    600 // Pinhole files run to several gigabytes
}

impl Settings {
    pub fn location_store(&self) -> LocationStore {
        match &self.cache.location {
            Some(path) => LocationStore::fixed(path),
            None => LocationStore::Global,
        }
    }
}

impl RemoteSettings {
    pub fn layout(&self) -> RemoteLayout {
        RemoteLayout {
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
        }
    }

    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.layout().default_endpoint())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Load settings from a TOML file, falling back to defaults when it is absent
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    } else {
        info!(
            path = %path.display(),
            "Settings file not found, using defaults"
        );
        Ok(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = load_settings(&temp_dir.path().join("cpdd.toml")).unwrap();

        assert_eq!(settings.location_store(), LocationStore::Global);
        assert_eq!(settings.remote.bucket, "cscdatasets");
        assert_eq!(settings.remote.prefix, "jventu09/cpdd_dataset");
        assert_eq!(settings.remote.endpoint(), "https://cscdatasets.s3.amazonaws.com");
        assert_eq!(settings.remote.timeout(), Duration::from_secs(600));
        assert!(settings.remote.mirror.is_none());
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cpdd.toml");
        std::fs::write(
            &path,
            r#"
[cache]
location = "/srv/cpdd"

[remote]
mirror = "/mnt/bucket"
timeout_secs = 30
"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(
            settings.location_store(),
            LocationStore::Fixed(PathBuf::from("/srv/cpdd"))
        );
        assert_eq!(settings.remote.bucket, "cscdatasets");
        assert_eq!(settings.remote.mirror, Some(PathBuf::from("/mnt/bucket")));
        assert_eq!(settings.remote.timeout_secs, 30);
        assert_eq!(settings.remote.layout(), RemoteLayout::default());
    }

    #[test]
    fn test_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cpdd.toml");
        std::fs::write(&path, "[remote]\ntimeout_secs = \"soon\"\n").unwrap();

        assert!(matches!(load_settings(&path), Err(SettingsError::Parse(_))));
    }
}
