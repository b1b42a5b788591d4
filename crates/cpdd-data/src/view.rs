//! Typed views over opened capture files
//!
//! Array contracts:
//! - `rgb`: `(frames, height, width, 3)` of `u8`
//! - `depth`: `u16` in units of 0.1 m, `(frames, height, width)` in the
//!   captures seen so far; read with dynamic rank
//! - `abs_pose`, `rel_pose`, `start_rel_pose`: `(frames, 6)` of `f32`
//!
//! Handles own the opened file and close it when dropped. Views borrow
//! their handle and cannot outlive it.

use ndarray::{Array, Array2, Array4, ArrayD, Dimension};
use std::fmt;

use cpdd_core::Side;

use crate::container::ContainerReader;
use crate::error::DataError;

const COLOR: &str = "rgb";
const DEPTH: &str = "depth";
const ABSOLUTE_POSE: &str = "abs_pose";
const RELATIVE_POSE: &str = "rel_pose";
const START_RELATIVE_POSE: &str = "start_rel_pose";

/// Convert a dynamic-rank read into the documented fixed rank
fn fixed_rank<T, D: Dimension>(dataset: &str, array: ArrayD<T>) -> Result<Array<T, D>, DataError> {
    let found = array.ndim();
    array.into_dimensionality::<D>().map_err(|_| DataError::Shape {
        dataset: dataset.to_string(),
        expected: D::NDIM.unwrap_or(found),
        found,
    })
}

fn dataset_path(group: Option<Side>, name: &str) -> String {
    match group {
        Some(side) => format!("{}/{}", side.group_name(), name),
        None => name.to_string(),
    }
}

/// Pose arrays of a capture
pub struct PoseData {
    reader: Box<dyn ContainerReader>,
}

impl PoseData {
    pub(crate) fn new(reader: Box<dyn ContainerReader>) -> Self {
        Self { reader }
    }

    fn pose(&self, name: &str) -> Result<Array2<f32>, DataError> {
        fixed_rank(name, self.reader.read_f32(name)?)
    }

    /// Absolute pose per frame, `(frames, 6)`
    pub fn absolute_pose(&self) -> Result<Array2<f32>, DataError> {
        self.pose(ABSOLUTE_POSE)
    }

    /// Pose relative to the previous frame, `(frames, 6)`
    pub fn relative_pose(&self) -> Result<Array2<f32>, DataError> {
        self.pose(RELATIVE_POSE)
    }

    /// Pose relative to the first frame, `(frames, 6)`
    pub fn start_relative_pose(&self) -> Result<Array2<f32>, DataError> {
        self.pose(START_RELATIVE_POSE)
    }

    /// Close the file
    pub fn close(self) {}
}

impl fmt::Debug for PoseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoseData").finish_non_exhaustive()
    }
}

/// Color and depth frames of a panorama or of one pinhole side
#[derive(Clone, Copy)]
pub struct Data<'a> {
    reader: &'a dyn ContainerReader,
    group: Option<Side>,
}

impl<'a> Data<'a> {
    fn new(reader: &'a dyn ContainerReader, group: Option<Side>) -> Self {
        Self { reader, group }
    }

    /// Pinhole side this view is scoped to, if any
    pub fn side(&self) -> Option<Side> {
        self.group
    }

    /// Color frames, `(frames, height, width, 3)`
    pub fn color(&self) -> Result<Array4<u8>, DataError> {
        let path = dataset_path(self.group, COLOR);
        fixed_rank(&path, self.reader.read_u8(&path)?)
    }

    /// Depth frames in units of 0.1 m
    pub fn depth(&self) -> Result<ArrayD<u16>, DataError> {
        self.reader.read_u16(&dataset_path(self.group, DEPTH))
    }

    /// Number of frames, read from the color shape without loading pixels
    pub fn frame_count(&self) -> Result<usize, DataError> {
        let path = dataset_path(self.group, COLOR);
        let shape = self.reader.shape(&path)?;
        shape.first().copied().ok_or(DataError::Shape {
            dataset: path,
            expected: 4,
            found: 0,
        })
    }
}

/// An opened panorama file, or one side of an opened pinhole file
pub struct DataHandle {
    reader: Box<dyn ContainerReader>,
    group: Option<Side>,
}

impl DataHandle {
    pub(crate) fn new(reader: Box<dyn ContainerReader>) -> Self {
        Self { reader, group: None }
    }

    pub(crate) fn scoped(reader: Box<dyn ContainerReader>, side: Side) -> Result<Self, DataError> {
        if !reader.has_group(side.group_name()) {
            return Err(DataError::MissingGroup(side.group_name().to_string()));
        }
        Ok(Self {
            reader,
            group: Some(side),
        })
    }

    pub fn data(&self) -> Data<'_> {
        Data::new(self.reader.as_ref(), self.group)
    }

    pub fn color(&self) -> Result<Array4<u8>, DataError> {
        self.data().color()
    }

    pub fn depth(&self) -> Result<ArrayD<u16>, DataError> {
        self.data().depth()
    }

    pub fn frame_count(&self) -> Result<usize, DataError> {
        self.data().frame_count()
    }

    /// Close the file
    pub fn close(self) {}
}

impl fmt::Debug for DataHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataHandle")
            .field("side", &self.group)
            .finish_non_exhaustive()
    }
}

/// An opened pinhole file with its six sides
pub struct SplitData {
    reader: Box<dyn ContainerReader>,
}

impl SplitData {
    pub(crate) fn new(reader: Box<dyn ContainerReader>) -> Self {
        Self { reader }
    }

    pub fn side(&self, side: Side) -> Result<Data<'_>, DataError> {
        if !self.reader.has_group(side.group_name()) {
            return Err(DataError::MissingGroup(side.group_name().to_string()));
        }
        Ok(Data::new(self.reader.as_ref(), Some(side)))
    }

    pub fn top(&self) -> Result<Data<'_>, DataError> {
        self.side(Side::Top)
    }

    pub fn bottom(&self) -> Result<Data<'_>, DataError> {
        self.side(Side::Bottom)
    }

    pub fn left(&self) -> Result<Data<'_>, DataError> {
        self.side(Side::Left)
    }

    pub fn right(&self) -> Result<Data<'_>, DataError> {
        self.side(Side::Right)
    }

    pub fn front(&self) -> Result<Data<'_>, DataError> {
        self.side(Side::Front)
    }

    pub fn back(&self) -> Result<Data<'_>, DataError> {
        self.side(Side::Back)
    }

    /// Close the file
    pub fn close(self) {}
}

impl fmt::Debug for SplitData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitData").finish_non_exhaustive()
    }
}

impl fmt::Debug for Data<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("side", &self.group)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;
    use ndarray::Array3;

    fn pinhole() -> MemoryContainer {
        let mut container = MemoryContainer::new();
        for (i, side) in Side::ALL.into_iter().enumerate() {
            let frames = i + 1;
            container = container
                .with_u8(
                    &format!("{}/rgb", side),
                    Array4::<u8>::from_elem((frames, 2, 3, 3), i as u8),
                )
                .with_u16(&format!("{}/depth", side), Array3::<u16>::zeros((frames, 2, 3)));
        }
        container
    }

    #[test]
    fn test_pose_arrays() {
        let container = MemoryContainer::new()
            .with_f32("abs_pose", Array2::<f32>::ones((5, 6)))
            .with_f32("rel_pose", Array2::<f32>::zeros((5, 6)))
            .with_f32("start_rel_pose", ndarray::Array1::<f32>::zeros(30));
        let pose = PoseData::new(Box::new(container));

        assert_eq!(pose.absolute_pose().unwrap().dim(), (5, 6));
        assert_eq!(pose.relative_pose().unwrap().sum(), 0.0);
        assert!(matches!(
            pose.start_relative_pose(),
            Err(DataError::Shape { expected: 2, found: 1, .. })
        ));
        pose.close();
    }

    #[test]
    fn test_panorama_handle() {
        let container = MemoryContainer::new()
            .with_u8("rgb", Array4::<u8>::zeros((3, 4, 8, 3)))
            .with_u16("depth", Array3::<u16>::from_elem((3, 4, 8), 25));
        let handle = DataHandle::new(Box::new(container));

        assert_eq!(handle.frame_count().unwrap(), 3);
        assert_eq!(handle.color().unwrap().dim(), (3, 4, 8, 3));
        let depth = handle.depth().unwrap();
        assert_eq!(depth.shape(), &[3, 4, 8]);
        assert!(depth.iter().all(|&d| d == 25));
        assert_eq!(handle.data().side(), None);
    }

    #[test]
    fn test_split_sides_are_scoped() {
        let split = SplitData::new(Box::new(pinhole()));
        for (i, side) in Side::ALL.into_iter().enumerate() {
            let data = split.side(side).unwrap();
            assert_eq!(data.side(), Some(side));
            assert_eq!(data.frame_count().unwrap(), i + 1);
            assert!(data.color().unwrap().iter().all(|&p| p == i as u8));
        }
        assert_eq!(split.back().unwrap().frame_count().unwrap(), 6);
    }

    #[test]
    fn test_missing_side() {
        let container = MemoryContainer::new().with_u8("top/rgb", Array4::<u8>::zeros((1, 1, 1, 3)));
        let split = SplitData::new(Box::new(container.clone()));
        assert!(split.top().is_ok());
        assert!(matches!(split.front(), Err(DataError::MissingGroup(_))));

        assert!(matches!(
            DataHandle::scoped(Box::new(container), Side::Left),
            Err(DataError::MissingGroup(_))
        ));
    }

    #[test]
    fn test_debug_output() {
        let handle = DataHandle::scoped(Box::new(pinhole()), Side::Front).unwrap();
        assert_eq!(format!("{:?}", handle), "DataHandle { side: Some(Front), .. }");
        assert_eq!(
            format!("{:?}", handle.data()),
            "Data { side: Some(Front), .. }"
        );

        let split = SplitData::new(Box::new(pinhole()));
        assert_eq!(format!("{:?}", split), "SplitData { .. }");
        assert_eq!(
            format!("{:?}", PoseData::new(Box::new(MemoryContainer::new()))),
            "PoseData { .. }"
        );

        let err = SplitData::new(Box::new(MemoryContainer::new()))
            .top()
            .unwrap_err();
        assert!(matches!(err, DataError::MissingGroup(_)));
    }
}
