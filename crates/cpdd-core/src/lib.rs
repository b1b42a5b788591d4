//! CPDD Core - Capture identities for the simulated-driving dataset
//!
//! This crate provides the value types shared by the rest of the workspace:
//! - Cities, rain settings and weather of a simulated capture
//! - `Configuration`, the identity of one capture
//! - Storage keys (`town01/clear/noon/cars_30_peds_200_index_0`) and their decoding
//! - Wildcard expansion of partially specified configurations
//! - Sensor modalities and the six pinhole rig sides
//!
//! Nothing in here touches the filesystem or the network.

pub mod city;
pub mod configuration;
pub mod expand;
pub mod key;
pub mod modality;

pub use city::{City, NameError, NameKind, Rain, Weather};
pub use configuration::Configuration;
pub use expand::{
    all_configurations, expand_wildcards, parse_time, PartialConfiguration, Wildcard,
    DEFAULT_NUM_PEDS, DEFAULT_RAIN,
};
pub use key::{KeyError, StorageKey};
pub use modality::{Modality, Side};
