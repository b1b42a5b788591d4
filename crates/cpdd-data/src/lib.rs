//! CPDD Data - Lazy access to capture files
//!
//! Every capture (a `Configuration`) owns one file per modality. Files are
//! fetched from the dataset bucket on first use and kept below the local
//! download location, mirroring the storage key layout:
//!
//! ```text
//! {download location}/
//!   town01/clear/noon/cars_30_peds_200_index_0/
//!     pose.hdf5
//!     cylindrical.hdf5
//!     spherical.hdf5
//!     pinhole.hdf5
//! ```
//!
//! Opening a downloaded file yields typed views over its arrays; a file
//! that has not been downloaded yet is never fetched implicitly.

pub mod container;
pub mod error;
pub mod location;
pub mod remote;
pub mod resource;
pub mod settings;
pub mod view;

pub use container::{default_opener, ContainerOpener, ContainerReader, MemoryContainer, MemoryOpener};
#[cfg(feature = "hdf5")]
pub use container::{Hdf5Container, Hdf5Opener};
pub use error::DataError;
pub use location::{download_location, set_download_location, LocationStore, LOCATION_ENV};
pub use remote::{DirectoryStore, FetchError, HttpObjectStore, ObjectStore, RemoteLayout};
pub use resource::{
    DataFile, DataSource, Dataset, PanoramaFile, PinholeFile, PinholeSide, PoseFile,
};
pub use settings::{load_settings, CacheSettings, RemoteSettings, Settings, SettingsError};
pub use view::{Data, DataHandle, PoseData, SplitData};
