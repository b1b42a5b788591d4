//! Expand a query, fetch the matching captures from a local mirror and read
//! them back through the typed views.

use std::fs;
use std::sync::Arc;

use cpdd_core::{City, Configuration, Modality, PartialConfiguration, Side};
use cpdd_data::{
    DataError, DataSource, Dataset, DirectoryStore, LocationStore, MemoryContainer, MemoryOpener,
    ObjectStore,
};
use ndarray::{Array2, Array3, Array4};
use tempfile::TempDir;

fn opener() -> MemoryOpener {
    let mut pinhole = MemoryContainer::new();
    for side in Side::ALL {
        pinhole = pinhole
            .with_u8(&format!("{}/rgb", side), Array4::<u8>::zeros((3, 4, 4, 3)))
            .with_u16(&format!("{}/depth", side), Array3::<u16>::zeros((3, 4, 4)));
    }

    let panorama = MemoryContainer::new()
        .with_u8("rgb", Array4::<u8>::from_elem((3, 4, 16, 3), 128))
        .with_u16("depth", Array3::<u16>::from_elem((3, 4, 16), 42));

    MemoryOpener::new()
        .with_container(
            "pose.hdf5",
            MemoryContainer::new()
                .with_f32("abs_pose", Array2::<f32>::zeros((3, 6)))
                .with_f32("rel_pose", Array2::<f32>::zeros((3, 6)))
                .with_f32("start_rel_pose", Array2::<f32>::zeros((3, 6))),
        )
        .with_container("cylindrical.hdf5", panorama.clone())
        .with_container("spherical.hdf5", panorama)
        .with_container("pinhole.hdf5", pinhole)
}

/// Populate a mirror with every modality of the given captures
fn mirror(root: &std::path::Path, dataset: &Dataset, configs: &[Configuration]) -> DirectoryStore {
    let store = DirectoryStore::new(root);
    for config in configs {
        for modality in Modality::ALL {
            let path = store.object_path(&dataset.file(*config, modality).remote_key());
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, modality.name()).unwrap();
        }
    }
    store
}

#[test]
fn test_expand_download_open() {
    let temp_dir = TempDir::new().unwrap();
    let configs = PartialConfiguration::new()
        .city(City::Town01)
        .sunset(true)
        .expand();
    assert_eq!(configs.len(), 4);

    // Layout only depends on settings, so a throwaway dataset computes keys
    let keys = Dataset::new(
        LocationStore::Global,
        Arc::new(DirectoryStore::new(temp_dir.path())),
    );
    let store = mirror(&temp_dir.path().join("bucket"), &keys, &configs);
    assert!(store
        .exists(&keys.file(configs[0], Modality::Pose).remote_key())
        .unwrap());

    let dataset = Dataset::new(
        LocationStore::fixed(temp_dir.path().join("cache")),
        Arc::new(store),
    )
    .with_opener(Arc::new(opener()));

    for config in &configs {
        let decoded: Configuration = config.storage_key().as_str().parse().unwrap();
        assert_eq!(&decoded, config);

        for modality in Modality::ALL {
            let file = dataset.file(*config, modality);
            assert!(!file.is_downloaded());
            assert!(file.remote_exists().unwrap());
        }

        dataset.download_all(*config, false).unwrap();

        let pose = dataset
            .pose_data(*config)
            .with_pose(|pose| pose.start_relative_pose())
            .unwrap();
        assert_eq!(pose.dim(), (3, 6));

        let spherical: DataSource = dataset.spherical_data(*config).into();
        let depth = spherical.with_data(|data| data.depth()).unwrap();
        assert!(depth.iter().all(|&d| d == 42));

        let pinhole = dataset.pinhole_data(*config);
        let split = pinhole.open().unwrap();
        for side in Side::ALL {
            assert_eq!(split.side(side).unwrap().frame_count().unwrap(), 3);
        }
        split.close();

        for side in pinhole.sides() {
            let source = DataSource::from(side);
            assert_eq!(source.open().unwrap().color().unwrap().dim(), (3, 4, 4, 3));
        }
    }

    let cached = temp_dir
        .path()
        .join("cache/town01/clear/sunset/cars_30_peds_200_index_3/pinhole.hdf5");
    assert_eq!(fs::read(cached).unwrap(), b"pinhole");
}

#[test]
fn test_nothing_is_fetched_implicitly() {
    let temp_dir = TempDir::new().unwrap();
    let config = Configuration::new(City::Town05, cpdd_core::Rain::Clear, false, 40, 200, 0);

    let keys = Dataset::new(
        LocationStore::Global,
        Arc::new(DirectoryStore::new(temp_dir.path())),
    );
    let store = mirror(&temp_dir.path().join("bucket"), &keys, &[config]);

    let dataset = Dataset::new(
        LocationStore::fixed(temp_dir.path().join("cache")),
        Arc::new(store),
    )
    .with_opener(Arc::new(opener()));

    let front: DataSource = dataset.pinhole_data(config).front().into();
    assert!(matches!(front.open(), Err(DataError::NotDownloaded(_))));
    assert!(!front.file().is_downloaded());

    front.download(false).unwrap();
    assert!(front.open().is_ok());
    // The whole pinhole file is shared by every side
    assert!(dataset.pinhole_data(config).back().is_downloaded());
    assert!(!dataset.pose_data(config).is_downloaded());
}
