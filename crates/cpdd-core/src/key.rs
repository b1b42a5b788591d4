//! Hierarchical storage keys for captures
//!
//! A capture lives under `{city}/{rain}/{time}/cars_{n}_peds_{m}_index_{i}`,
//! both on disk below the download location and in the remote bucket.
//! Keys are written lower-case and read case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::city::{City, NameError, Rain};
use crate::configuration::Configuration;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error(transparent)]
    Name(#[from] NameError),
    #[error("Storage key {key:?} has {found} segments, expected at least 4")]
    MissingSegment { key: String, found: usize },
    #[error("Capture segment {0:?} is not of the form cars_N_peds_M[_index_I]")]
    MalformedCapture(String),
    #[error("Capture segment {segment:?}: {value:?} is not a valid count")]
    InvalidNumber { segment: String, value: String },
}

/// Canonical storage key of a configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the key back into a configuration
    pub fn configuration(&self) -> Result<Configuration, KeyError> {
        Configuration::from_storage_key(&self.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&Configuration> for StorageKey {
    fn from(config: &Configuration) -> Self {
        config.storage_key()
    }
}

impl Configuration {
    /// Encode as `{city}/{rain}/{time}/cars_{n}_peds_{m}_index_{i}`
    pub fn storage_key(&self) -> StorageKey {
        StorageKey(format!(
            "{}/{}/{}/cars_{}_peds_{}_index_{}",
            self.city().name().to_lowercase(),
            self.rain().name().to_lowercase(),
            self.weather().time(),
            self.num_cars(),
            self.num_peds(),
            self.index()
        ))
    }

    /// Decode a storage key
    ///
    /// Accepts `[/]{city}/{rain}/{time}/{capture}[/...]`. City and rain are
    /// matched case-insensitively; any time other than `sunset` means noon.
    /// The capture segment is read positionally, so the index component is
    /// optional and defaults to 0 when absent.
    pub fn from_storage_key(key: &str) -> Result<Self, KeyError> {
        let parts: Vec<&str> = key.trim_matches('/').split('/').collect();
        if parts.len() < 4 {
            return Err(KeyError::MissingSegment {
                key: key.to_string(),
                found: parts.len(),
            });
        }

        let city: City = parts[0].parse()?;
        let rain: Rain = parts[1].parse()?;
        let sunset = parts[2].eq_ignore_ascii_case("sunset");

        let capture = parts[3];
        let fields: Vec<&str> = capture.split('_').collect();
        if fields.len() < 4 {
            return Err(KeyError::MalformedCapture(capture.to_string()));
        }

        let number = |value: &str| {
            value.parse::<u32>().map_err(|_| KeyError::InvalidNumber {
                segment: capture.to_string(),
                value: value.to_string(),
            })
        };

        let num_cars = number(fields[1])?;
        let num_peds = number(fields[3])?;
        let index = if fields.len() > 5 {
            number(fields[5])?
        } else {
            0
        };

        Ok(Configuration::new(city, rain, sunset, num_cars, num_peds, index))
    }
}

impl FromStr for Configuration {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Configuration::from_storage_key(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::NameKind;
    use crate::expand::all_configurations;

    #[test]
    fn test_encode() {
        let config = Configuration::new(City::Town01, Rain::WetCloudy, true, 30, 200, 3);
        assert_eq!(
            config.storage_key().as_str(),
            "town01/wetcloudy/sunset/cars_30_peds_200_index_3"
        );

        let noon = Configuration::new(City::Town04, Rain::Clear, false, 30, 200, 0);
        assert_eq!(noon.storage_key().as_str(), "town04/clear/noon/cars_30_peds_200_index_0");
    }

    #[test]
    fn test_decode_case_insensitive() {
        let config: Configuration = "/Town03/CLEAR/Sunset/cars_40_peds_200_index_1/".parse().unwrap();
        assert_eq!(
            config,
            Configuration::new(City::Town03, Rain::Clear, true, 40, 200, 1)
        );
    }

    #[test]
    fn test_decode_missing_index_defaults_to_zero() {
        let config = Configuration::from_storage_key("town02/hard/noon/cars_10_peds_150").unwrap();
        assert_eq!(config.index(), 0);
        assert_eq!(config.num_peds(), 150);
        assert!(!config.sunset());
    }

    #[test]
    fn test_decode_unknown_time_is_noon() {
        let config = Configuration::from_storage_key("town02/clear/dusk/cars_10_peds_200_index_1").unwrap();
        assert!(!config.sunset());
    }

    #[test]
    fn test_decode_ignores_trailing_segments() {
        let config =
            Configuration::from_storage_key("town05/mid/noon/cars_40_peds_200_index_4/pose.hdf5").unwrap();
        assert_eq!(config.index(), 4);
    }

    #[test]
    fn test_decode_errors() {
        let err = Configuration::from_storage_key("town09/clear/noon/cars_1_peds_2").unwrap_err();
        assert_eq!(
            err,
            KeyError::Name(NameError::new(NameKind::City, "town09"))
        );

        let err = Configuration::from_storage_key("town01/snow/noon/cars_1_peds_2").unwrap_err();
        assert!(err.to_string().starts_with("snow is not a valid rain"));

        assert!(matches!(
            Configuration::from_storage_key("town01/clear"),
            Err(KeyError::MissingSegment { found: 2, .. })
        ));
        assert!(matches!(
            Configuration::from_storage_key("town01/clear/noon/cars_30"),
            Err(KeyError::MalformedCapture(_))
        ));
        assert!(matches!(
            Configuration::from_storage_key("town01/clear/noon/cars_x_peds_200"),
            Err(KeyError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_every_configuration_survives_encode_decode() {
        for config in all_configurations() {
            let key = config.storage_key();
            assert_eq!(key.configuration().unwrap(), config, "key {key}");
        }
    }

    #[test]
    fn test_decode_then_encode_needs_explicit_index() {
        let with_index = "town01/clear/noon/cars_30_peds_200_index_0";
        let config = Configuration::from_storage_key(with_index).unwrap();
        assert_eq!(config.storage_key().as_str(), with_index);

        let without_index = "town01/clear/noon/cars_30_peds_200";
        let config = Configuration::from_storage_key(without_index).unwrap();
        assert_ne!(config.storage_key().as_str(), without_index);
    }
}
