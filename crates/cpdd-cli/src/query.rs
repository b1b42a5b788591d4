//! Wildcard query arguments shared by `expand` and `download`

use anyhow::{Context, Result};
use clap::Args;

use cpdd_core::{parse_time, PartialConfiguration, Wildcard};

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// City (Town01..Town05) or *
    #[arg(long, default_value = "*")]
    pub city: String,

    /// Rain setting or *
    #[arg(long, default_value = "*")]
    pub rain: String,

    /// Time of day (noon, sunset) or *
    #[arg(long, default_value = "*")]
    pub time: String,

    /// Number of cars or *
    #[arg(long, default_value = "*")]
    pub cars: String,

    /// Number of pedestrians or *
    #[arg(long, default_value = "*")]
    pub peds: String,

    /// Capture index or *
    #[arg(long, default_value = "*")]
    pub index: String,
}

impl QueryArgs {
    pub fn to_partial(&self) -> Result<PartialConfiguration> {
        Ok(PartialConfiguration {
            city: self.city.parse()?,
            rain: self.rain.parse()?,
            sunset: Wildcard::parse_with(&self.time, parse_time)?,
            num_cars: self
                .cars
                .parse()
                .with_context(|| format!("Invalid car count {:?}", self.cars))?,
            num_peds: self
                .peds
                .parse()
                .with_context(|| format!("Invalid pedestrian count {:?}", self.peds))?,
            index: self
                .index
                .parse()
                .with_context(|| format!("Invalid index {:?}", self.index))?,
        })
    }
}
