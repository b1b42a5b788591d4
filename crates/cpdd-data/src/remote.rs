//! Remote object storage
//!
//! Capture files live in a public bucket under
//! `{prefix}/{storage key}/{filename}`. Two transports are provided:
//! plain HTTPS against the bucket endpoint, and a local directory laid out
//! like the bucket (mirrors, tests).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use cpdd_core::StorageKey;

/// Default bucket holding the dataset
pub const DEFAULT_BUCKET: &str = "cscdatasets";

/// Default key prefix of the dataset inside the bucket
pub const DEFAULT_PREFIX: &str = "jventu09/cpdd_dataset";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote returned status {status} for {key}")]
    Status {
        key: String,
        status: reqwest::StatusCode,
    },

    #[error("Object not found: {0}")]
    NotFound(String),
}

/// A store of objects addressed by slash-separated keys
pub trait ObjectStore: Send + Sync {
    /// Check for an object without transferring it
    fn exists(&self, key: &str) -> Result<bool, FetchError>;

    /// Write the object to `dest`, returning the number of bytes written
    fn fetch(&self, key: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// Where the dataset lives inside its bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLayout {
    pub bucket: String,
    pub prefix: String,
}

impl Default for RemoteLayout {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl RemoteLayout {
    /// Object key of a capture file: `{prefix}/{storage key}/{filename}`
    pub fn object_key(&self, key: &StorageKey, filename: &str) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{}/{}", key, filename)
        } else {
            format!("{}/{}/{}", prefix, key, filename)
        }
    }

    /// Human-readable location of an object, e.g. `s3://cscdatasets/...`
    pub fn url(&self, object_key: &str) -> String {
        format!("s3://{}/{}", self.bucket, object_key)
    }

    /// Public HTTPS endpoint of the bucket
    pub fn default_endpoint(&self) -> String {
        format!("https://{}.s3.amazonaws.com", self.bucket)
    }
}

/// Interpret the status of a HEAD probe
///
/// Only 404 means the object is absent. Anything else that is not a
/// success, 403 included, is reported to the caller.
fn probe_result(key: &str, status: reqwest::StatusCode) -> Result<bool, FetchError> {
    if status.is_success() {
        Ok(true)
    } else if status == reqwest::StatusCode::NOT_FOUND {
        Ok(false)
    } else {
        Err(FetchError::Status {
            key: key.to_string(),
            status,
        })
    }
}

/// Blocking HTTPS access to a public bucket
pub struct HttpObjectStore {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpObjectStore {
    /// Create a store for the given endpoint (e.g. `https://bucket.s3.amazonaws.com`)
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Full URL of an object
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), key)
    }
}

impl ObjectStore for HttpObjectStore {
    fn exists(&self, key: &str) -> Result<bool, FetchError> {
        let url = self.object_url(key);
        debug!(url = %url, "Probing remote object");

        let response = self.client.head(&url).send()?;
        probe_result(key, response.status())
    }

    fn fetch(&self, key: &str, dest: &Path) -> Result<u64, FetchError> {
        let url = self.object_url(key);
        let mut response = self.client.get(&url).send()?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                key: key.to_string(),
                status,
            });
        }

        let mut file = fs::File::create(dest)?;
        let bytes = response.copy_to(&mut file)?;
        file.sync_all()?;
        Ok(bytes)
    }
}

/// A local directory laid out like the bucket
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of an object inside the directory
    pub fn object_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

impl ObjectStore for DirectoryStore {
    fn exists(&self, key: &str) -> Result<bool, FetchError> {
        Ok(self.object_path(key).is_file())
    }

    fn fetch(&self, key: &str, dest: &Path) -> Result<u64, FetchError> {
        let source = self.object_path(key);
        if !source.is_file() {
            return Err(FetchError::NotFound(key.to_string()));
        }
        Ok(fs::copy(&source, dest)?)
    }
}
