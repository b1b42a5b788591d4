//! Lazily downloaded capture files
//!
//! A [`DataFile`] is one `(Configuration, Modality)` pair. It knows where
//! its file lives locally and remotely and runs the shared download and
//! probe routine. The typed wrappers add the views their modality supports:
//! [`PoseFile`] gives pose arrays, [`PanoramaFile`] and [`PinholeSide`] are
//! [`DataSource`]s with color and depth.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use cpdd_core::{Configuration, Modality, Side};

use crate::container::{default_opener, ContainerOpener, ContainerReader};
use crate::error::DataError;
use crate::location::LocationStore;
use crate::remote::{DirectoryStore, FetchError, HttpObjectStore, ObjectStore, RemoteLayout};
use crate::settings::Settings;
use crate::view::{Data, DataHandle, PoseData, SplitData};

type PathLocks = Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>;

/// Access to the dataset: where files are kept, where they come from and
/// how they are opened
#[derive(Clone)]
pub struct Dataset {
    location: LocationStore,
    layout: RemoteLayout,
    store: Arc<dyn ObjectStore>,
    opener: Arc<dyn ContainerOpener>,
    locks: PathLocks,
}

impl Dataset {
    pub fn new(location: LocationStore, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            location,
            layout: RemoteLayout::default(),
            store,
            opener: default_opener(),
            locks: Arc::default(),
        }
    }

    /// Build from settings: a directory mirror when one is configured,
    /// otherwise the bucket's HTTPS endpoint
    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let store: Arc<dyn ObjectStore> = match &settings.remote.mirror {
            Some(mirror) => {
                info!(mirror = %mirror.display(), "Using directory mirror");
                Arc::new(DirectoryStore::new(mirror))
            }
            None => {
                let endpoint = settings.remote.endpoint();
                info!(endpoint = %endpoint, "Using remote bucket");
                Arc::new(HttpObjectStore::new(endpoint, settings.remote.timeout())?)
            }
        };

        Ok(Self::new(settings.location_store(), store).with_layout(settings.remote.layout()))
    }

    pub fn with_layout(mut self, layout: RemoteLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_opener(mut self, opener: Arc<dyn ContainerOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn with_location(mut self, location: LocationStore) -> Self {
        self.location = location;
        self
    }

    pub fn location(&self) -> &LocationStore {
        &self.location
    }

    pub fn layout(&self) -> &RemoteLayout {
        &self.layout
    }

    pub fn file(&self, config: Configuration, modality: Modality) -> DataFile {
        DataFile {
            dataset: self.clone(),
            config,
            modality,
        }
    }

    pub fn pose_data(&self, config: Configuration) -> PoseFile {
        PoseFile(self.file(config, Modality::Pose))
    }

    pub fn cylindrical_data(&self, config: Configuration) -> PanoramaFile {
        PanoramaFile(self.file(config, Modality::Cylindrical))
    }

    pub fn spherical_data(&self, config: Configuration) -> PanoramaFile {
        PanoramaFile(self.file(config, Modality::Spherical))
    }

    pub fn pinhole_data(&self, config: Configuration) -> PinholeFile {
        PinholeFile(self.file(config, Modality::Pinhole))
    }

    /// Download every modality of a capture: pose, cylindrical, spherical,
    /// then pinhole
    pub fn download_all(&self, config: Configuration, force: bool) -> Result<(), DataError> {
        for modality in Modality::ALL {
            self.file(config, modality).download(force)?;
        }
        Ok(())
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Give back a lock taken with `path_lock`, forgetting the path once
    /// no other caller holds it
    fn release_path_lock(&self, path: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(lock);
        if locks.get(path).is_some_and(|held| Arc::strong_count(held) == 1) {
            locks.remove(path);
        }
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("location", &self.location)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// One modality file of one capture
#[derive(Debug, Clone)]
pub struct DataFile {
    dataset: Dataset,
    config: Configuration,
    modality: Modality,
}

impl DataFile {
    pub fn configuration(&self) -> Configuration {
        self.config
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Local path, below the download location as resolved right now
    pub fn download_file(&self) -> PathBuf {
        let key = self.config.storage_key();
        key.as_str()
            .split('/')
            .fold(self.dataset.location.root(), |path, segment| path.join(segment))
            .join(self.modality.filename())
    }

    /// Local path of a downloaded file
    pub fn download_file_if_exists(&self) -> Result<PathBuf, DataError> {
        let path = self.download_file();
        if path.is_file() {
            Ok(path)
        } else {
            Err(DataError::NotDownloaded(self.to_string()))
        }
    }

    /// Object key in the bucket
    pub fn remote_key(&self) -> String {
        self.dataset
            .layout
            .object_key(&self.config.storage_key(), self.modality.filename())
    }

    /// `s3://` location of the remote object
    pub fn remote_location(&self) -> String {
        self.dataset.layout.url(&self.remote_key())
    }

    /// Whether the file exists locally; contents are not checked
    pub fn is_downloaded(&self) -> bool {
        self.download_file().is_file()
    }

    /// Whether the file can be obtained; true without probing when it is
    /// already downloaded
    pub fn remote_exists(&self) -> Result<bool, FetchError> {
        if self.is_downloaded() {
            return Ok(true);
        }
        self.dataset.store.exists(&self.remote_key())
    }

    /// Fetch the file unless it is already present
    ///
    /// With `force` the file is fetched again. The transfer lands in a
    /// sibling `*.part-{uuid}` file that is renamed into place, so readers
    /// never see a partial file and a failed refresh keeps the old one.
    pub fn download(&self, force: bool) -> Result<&Self, DataError> {
        let path = self.download_file();
        let lock = self.dataset.path_lock(&path);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            self.fetch_into(&path, force)
        };
        self.dataset.release_path_lock(&path, lock);
        result.map(|()| self)
    }

    fn fetch_into(&self, path: &Path, force: bool) -> Result<(), DataError> {
        if path.is_file() && !force {
            debug!(path = %path.display(), "Already downloaded");
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let key = self.remote_key();
        let temp = path.with_file_name(format!(
            "{}.part-{}",
            self.modality.filename(),
            Uuid::new_v4()
        ));

        info!(
            remote = %self.dataset.layout.url(&key),
            path = %path.display(),
            force,
            "Downloading"
        );

        match self.dataset.store.fetch(&key, &temp) {
            Ok(bytes) => {
                fs::rename(&temp, path)?;
                info!(path = %path.display(), bytes, "Downloaded");
                Ok(())
            }
            Err(e) => {
                if let Err(remove) = fs::remove_file(&temp) {
                    if remove.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %temp.display(), error = %remove, "Failed to remove partial download");
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Open the downloaded file; never downloads implicitly
    pub fn open_reader(&self) -> Result<Box<dyn ContainerReader>, DataError> {
        let path = self.download_file_if_exists()?;
        debug!(path = %path.display(), "Opening");
        self.dataset.opener.open(&path)
    }
}

fn type_name(modality: Modality) -> &'static str {
    match modality {
        Modality::Pose => "Pose",
        Modality::Cylindrical => "Cylindrical",
        Modality::Spherical => "Spherical",
        Modality::Pinhole => "Pinhole",
    }
}

impl fmt::Display for DataFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}DataFile(config={}, location={}, downloaded={})",
            type_name(self.modality),
            self.config,
            self.download_file().display(),
            self.is_downloaded()
        )
    }
}

/// Pose track of a capture
#[derive(Debug, Clone)]
pub struct PoseFile(DataFile);

impl PoseFile {
    pub fn download(&self, force: bool) -> Result<&Self, DataError> {
        self.0.download(force)?;
        Ok(self)
    }

    pub fn open(&self) -> Result<PoseData, DataError> {
        Ok(PoseData::new(self.0.open_reader()?))
    }

    /// Run `f` with the opened pose arrays; the file is closed afterwards
    pub fn with_pose<R>(&self, f: impl FnOnce(&PoseData) -> Result<R, DataError>) -> Result<R, DataError> {
        let pose = self.open()?;
        f(&pose)
    }
}

impl Deref for PoseFile {
    type Target = DataFile;

    fn deref(&self) -> &DataFile {
        &self.0
    }
}

impl fmt::Display for PoseFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Cylindrical or spherical panorama of a capture
#[derive(Debug, Clone)]
pub struct PanoramaFile(DataFile);

impl PanoramaFile {
    pub fn download(&self, force: bool) -> Result<&Self, DataError> {
        self.0.download(force)?;
        Ok(self)
    }

    pub fn open(&self) -> Result<DataHandle, DataError> {
        Ok(DataHandle::new(self.0.open_reader()?))
    }

    pub fn with_data<R>(&self, f: impl FnOnce(Data<'_>) -> Result<R, DataError>) -> Result<R, DataError> {
        let handle = self.open()?;
        f(handle.data())
    }
}

impl Deref for PanoramaFile {
    type Target = DataFile;

    fn deref(&self) -> &DataFile {
        &self.0
    }
}

impl fmt::Display for PanoramaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Six-sided pinhole rig of a capture, stored as one file
#[derive(Debug, Clone)]
pub struct PinholeFile(DataFile);

impl PinholeFile {
    pub fn download(&self, force: bool) -> Result<&Self, DataError> {
        self.0.download(force)?;
        Ok(self)
    }

    /// Open the file with all six sides
    pub fn open(&self) -> Result<SplitData, DataError> {
        Ok(SplitData::new(self.0.open_reader()?))
    }

    pub fn with_split<R>(&self, f: impl FnOnce(&SplitData) -> Result<R, DataError>) -> Result<R, DataError> {
        let split = self.open()?;
        f(&split)
    }

    /// One side, opened independently of the others
    pub fn side(&self, side: Side) -> PinholeSide {
        PinholeSide {
            file: self.0.clone(),
            side,
        }
    }

    pub fn sides(&self) -> impl Iterator<Item = PinholeSide> + '_ {
        Side::ALL.into_iter().map(move |side| self.side(side))
    }

    pub fn top(&self) -> PinholeSide {
        self.side(Side::Top)
    }

    pub fn bottom(&self) -> PinholeSide {
        self.side(Side::Bottom)
    }

    pub fn left(&self) -> PinholeSide {
        self.side(Side::Left)
    }

    pub fn right(&self) -> PinholeSide {
        self.side(Side::Right)
    }

    pub fn front(&self) -> PinholeSide {
        self.side(Side::Front)
    }

    pub fn back(&self) -> PinholeSide {
        self.side(Side::Back)
    }
}

impl Deref for PinholeFile {
    type Target = DataFile;

    fn deref(&self) -> &DataFile {
        &self.0
    }
}

impl fmt::Display for PinholeFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One side of a pinhole file
///
/// Shares the downloaded file with the other sides; opening it scopes the
/// view to the side's group.
#[derive(Debug, Clone)]
pub struct PinholeSide {
    file: DataFile,
    side: Side,
}

impl PinholeSide {
    pub fn side(&self) -> Side {
        self.side
    }

    pub fn download(&self, force: bool) -> Result<&Self, DataError> {
        self.file.download(force)?;
        Ok(self)
    }

    pub fn open(&self) -> Result<DataHandle, DataError> {
        DataHandle::scoped(self.file.open_reader()?, self.side)
    }

    pub fn with_data<R>(&self, f: impl FnOnce(Data<'_>) -> Result<R, DataError>) -> Result<R, DataError> {
        let handle = self.open()?;
        f(handle.data())
    }
}

impl Deref for PinholeSide {
    type Target = DataFile;

    fn deref(&self) -> &DataFile {
        &self.file
    }
}

impl fmt::Display for PinholeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PinholeDataFile[{}](config={}, location={}, downloaded={})",
            self.side,
            self.file.config,
            self.file.download_file().display(),
            self.file.is_downloaded()
        )
    }
}

/// Anything that yields color and depth frames
#[derive(Debug, Clone)]
pub enum DataSource {
    Panorama(PanoramaFile),
    PinholeSide(PinholeSide),
}

impl DataSource {
    pub fn file(&self) -> &DataFile {
        match self {
            DataSource::Panorama(file) => &file.0,
            DataSource::PinholeSide(side) => &side.file,
        }
    }

    pub fn download(&self, force: bool) -> Result<&Self, DataError> {
        self.file().download(force)?;
        Ok(self)
    }

    pub fn open(&self) -> Result<DataHandle, DataError> {
        match self {
            DataSource::Panorama(file) => file.open(),
            DataSource::PinholeSide(side) => side.open(),
        }
    }

    pub fn with_data<R>(&self, f: impl FnOnce(Data<'_>) -> Result<R, DataError>) -> Result<R, DataError> {
        let handle = self.open()?;
        f(handle.data())
    }
}

impl From<PanoramaFile> for DataSource {
    fn from(file: PanoramaFile) -> Self {
        DataSource::Panorama(file)
    }
}

impl From<PinholeSide> for DataSource {
    fn from(side: PinholeSide) -> Self {
        DataSource::PinholeSide(side)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Panorama(file) => file.fmt(f),
            DataSource::PinholeSide(side) => side.fmt(f),
        }
    }
}
