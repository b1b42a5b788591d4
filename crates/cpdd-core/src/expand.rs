//! Wildcard expansion of partially specified configurations
//!
//! Fields are resolved in a fixed order (city, rain, sunset, cars, peds,
//! index) because the valid values of the later fields depend on the
//! values chosen for the earlier ones.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::city::{City, NameError, NameKind, Rain};
use crate::configuration::Configuration;

/// Pedestrian count used for every recorded capture
pub const DEFAULT_NUM_PEDS: u32 = 200;

/// The only rain setting a wildcard rain currently resolves to
pub const DEFAULT_RAIN: Rain = Rain::Clear;

/// A configuration field that is either fixed or left open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wildcard<T> {
    Any,
    Exact(T),
}

impl<T> Default for Wildcard<T> {
    fn default() -> Self {
        Wildcard::Any
    }
}

impl<T> Wildcard<T> {
    pub fn is_any(&self) -> bool {
        matches!(self, Wildcard::Any)
    }

    /// Parse a token, treating `*` as a wildcard and handing anything
    /// else to `parse`
    pub fn parse_with<E>(token: &str, parse: impl FnOnce(&str) -> Result<T, E>) -> Result<Self, E> {
        if token.trim() == "*" {
            Ok(Wildcard::Any)
        } else {
            parse(token.trim()).map(Wildcard::Exact)
        }
    }
}

impl<T> From<T> for Wildcard<T> {
    fn from(value: T) -> Self {
        Wildcard::Exact(value)
    }
}

impl<T> From<Option<T>> for Wildcard<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Wildcard::Exact(v),
            None => Wildcard::Any,
        }
    }
}

impl<T: FromStr> FromStr for Wildcard<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Wildcard::parse_with(s, str::parse)
    }
}

impl<T: fmt::Display> fmt::Display for Wildcard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wildcard::Any => f.write_str("*"),
            Wildcard::Exact(value) => value.fmt(f),
        }
    }
}

/// Parse a time-of-day token: `sunset` or `noon`, case-insensitive
pub fn parse_time(token: &str) -> Result<bool, NameError> {
    if token.eq_ignore_ascii_case("sunset") {
        Ok(true)
    } else if token.eq_ignore_ascii_case("noon") {
        Ok(false)
    } else {
        Err(NameError::new(NameKind::Time, token))
    }
}

/// A query over configurations; each field may be a wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PartialConfiguration {
    pub city: Wildcard<City>,
    pub rain: Wildcard<Rain>,
    pub sunset: Wildcard<bool>,
    pub num_cars: Wildcard<u32>,
    pub num_peds: Wildcard<u32>,
    pub index: Wildcard<u32>,
}

impl PartialConfiguration {
    /// All fields wildcarded; expands to every configuration in the dataset
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city(mut self, city: City) -> Self {
        self.city = Wildcard::Exact(city);
        self
    }

    pub fn rain(mut self, rain: Rain) -> Self {
        self.rain = Wildcard::Exact(rain);
        self
    }

    pub fn sunset(mut self, sunset: bool) -> Self {
        self.sunset = Wildcard::Exact(sunset);
        self
    }

    pub fn num_cars(mut self, num_cars: u32) -> Self {
        self.num_cars = Wildcard::Exact(num_cars);
        self
    }

    pub fn num_peds(mut self, num_peds: u32) -> Self {
        self.num_peds = Wildcard::Exact(num_peds);
        self
    }

    pub fn index(mut self, index: u32) -> Self {
        self.index = Wildcard::Exact(index);
        self
    }

    /// Expand into every concrete configuration matching this query
    pub fn expand(&self) -> Vec<Configuration> {
        expand_wildcards(*self)
    }

    /// Returns the configuration if no field is a wildcard
    fn resolved(&self) -> Option<Configuration> {
        match *self {
            PartialConfiguration {
                city: Wildcard::Exact(city),
                rain: Wildcard::Exact(rain),
                sunset: Wildcard::Exact(sunset),
                num_cars: Wildcard::Exact(num_cars),
                num_peds: Wildcard::Exact(num_peds),
                index: Wildcard::Exact(index),
            } => Some(Configuration::new(city, rain, sunset, num_cars, num_peds, index)),
            _ => None,
        }
    }
}

impl From<Configuration> for PartialConfiguration {
    fn from(config: Configuration) -> Self {
        Self {
            city: config.city().into(),
            rain: config.rain().into(),
            sunset: config.sunset().into(),
            num_cars: config.num_cars().into(),
            num_peds: config.num_peds().into(),
            index: config.index().into(),
        }
    }
}

/// Expand wildcards into the existing configurations
///
/// Works breadth-first: each step resolves the first open field of a
/// pending item, either in place (rain, cars, peds) or by branching into
/// one item per candidate value (city, sunset, index). Every step removes
/// one wildcard, so the queue drains.
///
/// The result is in breadth-first order, but callers should treat it as a
/// set.
pub fn expand_wildcards(partial: PartialConfiguration) -> Vec<Configuration> {
    let mut done = Vec::new();
    let mut waiting = VecDeque::from([partial]);

    while let Some(item) = waiting.pop_front() {
        match item {
            PartialConfiguration {
                city: Wildcard::Any,
                ..
            } => {
                waiting.extend(City::ALL.into_iter().map(|c| PartialConfiguration {
                    city: c.into(),
                    ..item
                }));
            }
            PartialConfiguration {
                rain: Wildcard::Any,
                ..
            } => {
                // TODO: enumerate Rain::ALL once captures exist for the other rain settings
                waiting.push_back(PartialConfiguration {
                    rain: DEFAULT_RAIN.into(),
                    ..item
                });
            }
            PartialConfiguration {
                sunset: Wildcard::Any,
                ..
            } => {
                waiting.extend([false, true].map(|s| PartialConfiguration {
                    sunset: s.into(),
                    ..item
                }));
            }
            PartialConfiguration {
                city: Wildcard::Exact(city),
                num_cars: Wildcard::Any,
                ..
            } => {
                waiting.push_back(PartialConfiguration {
                    num_cars: city.default_num_cars().into(),
                    ..item
                });
            }
            PartialConfiguration {
                num_peds: Wildcard::Any,
                ..
            } => {
                waiting.push_back(PartialConfiguration {
                    num_peds: DEFAULT_NUM_PEDS.into(),
                    ..item
                });
            }
            PartialConfiguration {
                city: Wildcard::Exact(city),
                sunset: Wildcard::Exact(sunset),
                index: Wildcard::Any,
                ..
            } => {
                waiting.extend((0..city.index_count(sunset)).map(|i| PartialConfiguration {
                    index: i.into(),
                    ..item
                }));
            }
            _ => {
                if let Some(config) = item.resolved() {
                    done.push(config);
                }
            }
        }
    }

    done
}

/// Every configuration in the dataset
pub fn all_configurations() -> Vec<Configuration> {
    expand_wildcards(PartialConfiguration::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_wildcards_counts() {
        let all = all_configurations();
        let expected: u32 = City::ALL
            .iter()
            .map(|c| c.index_count(false) + c.index_count(true))
            .sum();
        assert_eq!(all.len() as u32, expected);
        assert_eq!(all.len(), 42);

        for city in City::ALL {
            for sunset in [false, true] {
                let count = all
                    .iter()
                    .filter(|c| c.city() == city && c.sunset() == sunset)
                    .count() as u32;
                assert_eq!(count, city.index_count(sunset), "{city} sunset={sunset}");
            }
        }

        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn test_expanded_defaults() {
        for config in all_configurations() {
            assert_eq!(config.rain(), DEFAULT_RAIN);
            assert_eq!(config.num_peds(), DEFAULT_NUM_PEDS);
            assert_eq!(config.num_cars(), config.city().default_num_cars());
            assert!(config.index() < config.city().index_count(config.sunset()));
        }
    }

    #[test]
    fn test_town01_sunset() {
        let configs = PartialConfiguration::new().city(City::Town01).sunset(true).expand();
        assert_eq!(configs.len(), 4);

        let indices: Vec<u32> = configs.iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        for config in &configs {
            assert_eq!(config.num_cars(), 30);
            assert_eq!(config.num_peds(), 200);
        }
    }

    #[test]
    fn test_designated_counts() {
        let town03 = PartialConfiguration::new().city(City::Town03).expand();
        assert!(town03.iter().all(|c| c.num_cars() == 40));
        assert_eq!(town03.len(), 7);

        let town02 = PartialConfiguration::new().city(City::Town02).expand();
        assert!(town02.iter().all(|c| c.num_cars() == 10));
    }

    #[test]
    fn test_explicit_values_pass_through() {
        let configs = PartialConfiguration::new()
            .city(City::Town02)
            .rain(Rain::Hard)
            .num_cars(12)
            .num_peds(50)
            .index(9)
            .expand();
        assert_eq!(configs.len(), 2);
        for config in &configs {
            assert_eq!(config.rain(), Rain::Hard);
            assert_eq!(config.num_cars(), 12);
            assert_eq!(config.num_peds(), 50);
            assert_eq!(config.index(), 9);
        }
    }

    #[test]
    fn test_fully_specified_yields_itself() {
        let config = Configuration::new(City::Town04, Rain::Mid, false, 30, 200, 2);
        assert_eq!(expand_wildcards(config.into()), vec![config]);
    }

    #[test]
    fn test_wildcard_parse() {
        assert_eq!("*".parse::<Wildcard<City>>().unwrap(), Wildcard::Any);
        assert_eq!(
            "town02".parse::<Wildcard<City>>().unwrap(),
            Wildcard::Exact(City::Town02)
        );
        assert_eq!("12".parse::<Wildcard<u32>>().unwrap(), Wildcard::Exact(12));
        assert!("town9".parse::<Wildcard<City>>().is_err());

        assert_eq!(Wildcard::parse_with("Sunset", parse_time).unwrap(), Wildcard::Exact(true));
        assert_eq!(Wildcard::parse_with("noon", parse_time).unwrap(), Wildcard::Exact(false));
        let err = Wildcard::parse_with("dawn", parse_time).unwrap_err();
        assert!(err.to_string().starts_with("dawn is not a valid time"));
    }

    #[test]
    fn test_wildcard_display() {
        assert_eq!(Wildcard::<City>::Any.to_string(), "*");
        assert_eq!(Wildcard::Exact(City::Town05).to_string(), "Town05");
    }
}
