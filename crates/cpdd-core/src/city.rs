//! Simulation maps, rain settings and weather

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which enumerated domain a rejected token was checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    City,
    Rain,
    Time,
    Modality,
    Side,
}

impl NameKind {
    /// Accepted spellings, for error messages
    fn expected(&self) -> &'static str {
        match self {
            NameKind::City => "town01, town02, town03, town04, town05",
            NameKind::Rain => "clear, cloudy, wet, wetcloudy, soft, mid, hard",
            NameKind::Time => "noon, sunset",
            NameKind::Modality => "pose, cylindrical, spherical, pinhole",
            NameKind::Side => "top, bottom, left, right, front, back",
        }
    }
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::City => write!(f, "city"),
            NameKind::Rain => write!(f, "rain"),
            NameKind::Time => write!(f, "time"),
            NameKind::Modality => write!(f, "modality"),
            NameKind::Side => write!(f, "side"),
        }
    }
}

/// A token that matched no member of its enumerated domain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name} is not a valid {kind} (expected one of: {})", .kind.expected())]
pub struct NameError {
    pub kind: NameKind,
    pub name: String,
}

impl NameError {
    pub fn new(kind: NameKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Simulation map a capture was recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum City {
    Town01,
    Town02,
    Town03,
    Town04,
    Town05,
}

impl City {
    /// Every city, in dataset order
    pub const ALL: [City; 5] = [
        City::Town01,
        City::Town02,
        City::Town03,
        City::Town04,
        City::Town05,
    ];

    /// Name as used by the simulator (e.g., "Town01")
    pub fn name(&self) -> &'static str {
        match self {
            City::Town01 => "Town01",
            City::Town02 => "Town02",
            City::Town03 => "Town03",
            City::Town04 => "Town04",
            City::Town05 => "Town05",
        }
    }

    /// Simulator asset path of the map
    pub fn map(&self) -> String {
        format!("/Game/Carla/Maps/{}", self.name())
    }

    /// Number of cars spawned in this city (maps differ in size)
    pub fn default_num_cars(&self) -> u32 {
        match self {
            City::Town01 => 30,
            City::Town02 => 10,
            City::Town03 => 40,
            City::Town04 => 30,
            City::Town05 => 40,
        }
    }

    /// Number of recorded runs per city and time of day
    ///
    /// Town01 was recorded more densely than the other maps, and sunset
    /// captures exist for roughly half as many runs as noon captures.
    pub fn index_count(&self, sunset: bool) -> u32 {
        match (self, sunset) {
            (City::Town01, true) => 4,
            (City::Town01, false) => 10,
            (_, true) => 2,
            (_, false) => 5,
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = NameError;

    /// Case-insensitive match against the city names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        City::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| NameError::new(NameKind::City, s))
    }
}

/// Rain intensity of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rain {
    Clear,
    Cloudy,
    Wet,
    WetCloudy,
    Soft,
    Mid,
    Hard,
}

impl Rain {
    pub const ALL: [Rain; 7] = [
        Rain::Clear,
        Rain::Cloudy,
        Rain::Wet,
        Rain::WetCloudy,
        Rain::Soft,
        Rain::Mid,
        Rain::Hard,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rain::Clear => "Clear",
            Rain::Cloudy => "Cloudy",
            Rain::Wet => "Wet",
            Rain::WetCloudy => "WetCloudy",
            Rain::Soft => "Soft",
            Rain::Mid => "Mid",
            Rain::Hard => "Hard",
        }
    }
}

impl fmt::Display for Rain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rain {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rain::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| NameError::new(NameKind::Rain, s))
    }
}

/// Weather of a capture: rain intensity plus time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Weather {
    pub rain: Rain,
    pub sunset: bool,
}

impl Weather {
    pub fn new(rain: Rain, sunset: bool) -> Self {
        Self { rain, sunset }
    }

    /// Time-of-day segment used in storage keys
    pub fn time(&self) -> &'static str {
        if self.sunset {
            "sunset"
        } else {
            "noon"
        }
    }
}
