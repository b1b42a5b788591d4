//! Identity of a single recorded capture

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::city::{City, Rain, Weather};

/// One capture of the dataset: where, under which weather, with how many
/// agents, and which of the recorded runs
///
/// Configurations are plain values; they are never mutated after
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Configuration {
    city: City,
    rain: Rain,
    sunset: bool,
    num_cars: u32,
    num_peds: u32,
    index: u32,
}

impl Configuration {
    pub fn new(
        city: City,
        rain: Rain,
        sunset: bool,
        num_cars: u32,
        num_peds: u32,
        index: u32,
    ) -> Self {
        Self {
            city,
            rain,
            sunset,
            num_cars,
            num_peds,
            index,
        }
    }

    pub fn city(&self) -> City {
        self.city
    }

    pub fn rain(&self) -> Rain {
        self.rain
    }

    pub fn sunset(&self) -> bool {
        self.sunset
    }

    pub fn num_cars(&self) -> u32 {
        self.num_cars
    }

    pub fn num_peds(&self) -> u32 {
        self.num_peds
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Weather view over the rain and sunset fields
    pub fn weather(&self) -> Weather {
        Weather::new(self.rain, self.sunset)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config(city={}, rain={}, sunset={}, num_cars={}, num_peds={}, index={})",
            self.city, self.rain, self.sunset, self.num_cars, self.num_peds, self.index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_view() {
        let config = Configuration::new(City::Town02, Rain::Soft, true, 10, 200, 1);
        let weather = config.weather();
        assert_eq!(weather.rain, Rain::Soft);
        assert!(weather.sunset);
    }

    #[test]
    fn test_display() {
        let config = Configuration::new(City::Town01, Rain::Clear, false, 30, 200, 7);
        assert_eq!(
            config.to_string(),
            "Config(city=Town01, rain=Clear, sunset=false, num_cars=30, num_peds=200, index=7)"
        );
    }

    #[test]
    fn test_json_round_trip() {
        let config = Configuration::new(City::Town05, Rain::WetCloudy, true, 40, 200, 0);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"city\":\"town05\""));
        let parsed: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
