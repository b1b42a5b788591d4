//! Sensor modalities recorded per capture

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::city::{NameError, NameKind};

/// One sensor-projection family; each is stored as its own file per capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Vehicle pose track
    Pose,
    /// Cylindrical panorama (color + depth)
    Cylindrical,
    /// Spherical panorama (color + depth)
    Spherical,
    /// Six-sided pinhole rig (color + depth per side)
    Pinhole,
}

impl Modality {
    /// All modalities, in download order
    pub const ALL: [Modality; 4] = [
        Modality::Pose,
        Modality::Cylindrical,
        Modality::Spherical,
        Modality::Pinhole,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Modality::Pose => "pose",
            Modality::Cylindrical => "cylindrical",
            Modality::Spherical => "spherical",
            Modality::Pinhole => "pinhole",
        }
    }

    /// File name of this modality inside a capture directory
    pub fn filename(&self) -> &'static str {
        match self {
            Modality::Pose => "pose.hdf5",
            Modality::Cylindrical => "cylindrical.hdf5",
            Modality::Spherical => "spherical.hdf5",
            Modality::Pinhole => "pinhole.hdf5",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Modality {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Modality::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| NameError::new(NameKind::Modality, s))
    }
}

/// Camera direction of the pinhole rig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
    Front,
    Back,
}

impl Side {
    pub const ALL: [Side; 6] = [
        Side::Top,
        Side::Bottom,
        Side::Left,
        Side::Right,
        Side::Front,
        Side::Back,
    ];

    /// Name of the top-level group holding this side in a pinhole file
    pub fn group_name(&self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
            Side::Front => "front",
            Side::Back => "back",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_name())
    }
}

impl FromStr for Side {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Side::ALL
            .into_iter()
            .find(|side| side.group_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| NameError::new(NameKind::Side, s))
    }
}
