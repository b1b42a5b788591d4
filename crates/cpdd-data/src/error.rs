//! Error type for capture file access

use std::io;
use thiserror::Error;

use crate::remote::FetchError;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("{0} is not downloaded")]
    NotDownloaded(String),

    #[error("Dataset {0:?} not found in container")]
    MissingDataset(String),

    #[error("Group {0:?} not found in container")]
    MissingGroup(String),

    #[error("Dataset {dataset:?} holds {found} values, expected {expected}")]
    DataType {
        dataset: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Dataset {dataset:?} has {found} dimensions, expected {expected}")]
    Shape {
        dataset: String,
        expected: usize,
        found: usize,
    },

    #[error("No container backend available to read {0} (enable the `hdf5` feature)")]
    BackendUnavailable(String),

    #[error("Container error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
