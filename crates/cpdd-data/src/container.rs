//! Container file backends
//!
//! Capture files are hierarchical containers: named arrays, optionally
//! nested in groups, addressed by slash paths (`front/rgb`). Readers only
//! need shapes and typed reads of the three element types the dataset
//! stores.

use ndarray::{Array, ArrayD, Dimension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::DataError;

/// Read access to one opened container file
///
/// Dropping the reader closes the file.
pub trait ContainerReader: Send {
    /// Whether a group exists at `path`
    fn has_group(&self, path: &str) -> bool;

    /// Shape of the dataset at `path`
    fn shape(&self, path: &str) -> Result<Vec<usize>, DataError>;

    fn read_u8(&self, path: &str) -> Result<ArrayD<u8>, DataError>;

    fn read_u16(&self, path: &str) -> Result<ArrayD<u16>, DataError>;

    fn read_f32(&self, path: &str) -> Result<ArrayD<f32>, DataError>;
}

/// Opens container files from local paths
pub trait ContainerOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn ContainerReader>, DataError>;
}

/// Opener used when no backend is configured explicitly
#[cfg(feature = "hdf5")]
pub fn default_opener() -> Arc<dyn ContainerOpener> {
    Arc::new(Hdf5Opener)
}

/// Opener used when no backend is configured explicitly
#[cfg(not(feature = "hdf5"))]
pub fn default_opener() -> Arc<dyn ContainerOpener> {
    Arc::new(UnavailableOpener)
}

/// Stands in for the HDF5 backend when it is compiled out
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableOpener;

impl ContainerOpener for UnavailableOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn ContainerReader>, DataError> {
        Err(DataError::BackendUnavailable(path.display().to_string()))
    }
}

/// Typed array stored in a [`MemoryContainer`]
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    F32(ArrayD<f32>),
}

impl ArrayData {
    fn type_name(&self) -> &'static str {
        match self {
            ArrayData::U8(_) => "u8",
            ArrayData::U16(_) => "u16",
            ArrayData::F32(_) => "f32",
        }
    }

    fn shape(&self) -> &[usize] {
        match self {
            ArrayData::U8(a) => a.shape(),
            ArrayData::U16(a) => a.shape(),
            ArrayData::F32(a) => a.shape(),
        }
    }
}

/// In-memory container for synthetic captures
///
/// Groups are implied by dataset paths: inserting `front/rgb` creates the
/// `front` group.
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    datasets: HashMap<String, ArrayData>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, data: ArrayData) {
        self.datasets.insert(path.trim_matches('/').to_string(), data);
    }

    pub fn with_u8<D: Dimension>(mut self, path: &str, array: Array<u8, D>) -> Self {
        self.insert(path, ArrayData::U8(array.into_dyn()));
        self
    }

    pub fn with_u16<D: Dimension>(mut self, path: &str, array: Array<u16, D>) -> Self {
        self.insert(path, ArrayData::U16(array.into_dyn()));
        self
    }

    pub fn with_f32<D: Dimension>(mut self, path: &str, array: Array<f32, D>) -> Self {
        self.insert(path, ArrayData::F32(array.into_dyn()));
        self
    }

    fn get(&self, path: &str) -> Result<&ArrayData, DataError> {
        self.datasets
            .get(path.trim_matches('/'))
            .ok_or_else(|| DataError::MissingDataset(path.to_string()))
    }

    fn type_mismatch(path: &str, expected: &'static str, found: &ArrayData) -> DataError {
        DataError::DataType {
            dataset: path.to_string(),
            expected,
            found: found.type_name(),
        }
    }
}

impl ContainerReader for MemoryContainer {
    fn has_group(&self, path: &str) -> bool {
        let prefix = format!("{}/", path.trim_matches('/'));
        self.datasets.keys().any(|key| key.starts_with(&prefix))
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>, DataError> {
        Ok(self.get(path)?.shape().to_vec())
    }

    fn read_u8(&self, path: &str) -> Result<ArrayD<u8>, DataError> {
        match self.get(path)? {
            ArrayData::U8(array) => Ok(array.clone()),
            other => Err(Self::type_mismatch(path, "u8", other)),
        }
    }

    fn read_u16(&self, path: &str) -> Result<ArrayD<u16>, DataError> {
        match self.get(path)? {
            ArrayData::U16(array) => Ok(array.clone()),
            other => Err(Self::type_mismatch(path, "u16", other)),
        }
    }

    fn read_f32(&self, path: &str) -> Result<ArrayD<f32>, DataError> {
        match self.get(path)? {
            ArrayData::F32(array) => Ok(array.clone()),
            other => Err(Self::type_mismatch(path, "f32", other)),
        }
    }
}

/// Serves [`MemoryContainer`]s for files present on disk
///
/// Containers are registered by file name (`pose.hdf5`) and shared by
/// every capture. The file itself must exist, so access-before-download
/// behaves as it does with a real backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    containers: HashMap<String, MemoryContainer>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, filename: &str, container: MemoryContainer) -> Self {
        self.containers.insert(filename.to_string(), container);
        self
    }
}

impl ContainerOpener for MemoryOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn ContainerReader>, DataError> {
        if !path.is_file() {
            return Err(DataError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.containers
            .get(&filename)
            .cloned()
            .map(|container| Box::new(container) as Box<dyn ContainerReader>)
            .ok_or_else(|| {
                DataError::Backend(format!("no in-memory container registered for {}", filename))
            })
    }
}

#[cfg(feature = "hdf5")]
pub use self::hdf5_backend::{Hdf5Container, Hdf5Opener};

#[cfg(feature = "hdf5")]
mod hdf5_backend {
    use super::*;
    use hdf5::H5Type;

    fn backend_error(err: hdf5::Error) -> DataError {
        DataError::Backend(err.to_string())
    }

    /// An HDF5 file opened read-only
    pub struct Hdf5Container {
        file: hdf5::File,
    }

    impl Hdf5Container {
        pub fn open(path: &Path) -> Result<Self, DataError> {
            let file = hdf5::File::open(path).map_err(backend_error)?;
            Ok(Self { file })
        }

        fn dataset(&self, path: &str) -> Result<hdf5::Dataset, DataError> {
            self.file
                .dataset(path)
                .map_err(|_| DataError::MissingDataset(path.to_string()))
        }

        fn read<T: H5Type>(&self, path: &str) -> Result<ArrayD<T>, DataError> {
            self.dataset(path)?.read_dyn::<T>().map_err(backend_error)
        }
    }

    impl ContainerReader for Hdf5Container {
        fn has_group(&self, path: &str) -> bool {
            self.file.group(path).is_ok()
        }

        fn shape(&self, path: &str) -> Result<Vec<usize>, DataError> {
            Ok(self.dataset(path)?.shape())
        }

        fn read_u8(&self, path: &str) -> Result<ArrayD<u8>, DataError> {
            self.read(path)
        }

        fn read_u16(&self, path: &str) -> Result<ArrayD<u16>, DataError> {
            self.read(path)
        }

        fn read_f32(&self, path: &str) -> Result<ArrayD<f32>, DataError> {
            self.read(path)
        }
    }

    /// Opens capture files with the HDF5 library
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Hdf5Opener;

    impl ContainerOpener for Hdf5Opener {
        fn open(&self, path: &Path) -> Result<Box<dyn ContainerReader>, DataError> {
            Ok(Box::new(Hdf5Container::open(path)?))
        }
    }
}
