//! Geographic unit types and their naming conventions

use serde::{Deserialize, Serialize};

use crate::error::PrepError;

/// The closed set of geographic granularities the harmonizer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GeoUnit {
    State,
    County,
    Tract,
    BlockGroup,
    Zipcode,
    LatLong,
}

impl GeoUnit {
    pub const ALL: [GeoUnit; 6] = [
        GeoUnit::State,
        GeoUnit::County,
        GeoUnit::Tract,
        GeoUnit::BlockGroup,
        GeoUnit::Zipcode,
        GeoUnit::LatLong,
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            GeoUnit::State => "state",
            GeoUnit::County => "county",
            GeoUnit::Tract => "tract",
            GeoUnit::BlockGroup => "block_group",
            GeoUnit::Zipcode => "zipcode",
            GeoUnit::LatLong => "lat_long",
        }
    }

    /// Stem used in source file names: `{stem}_geometry[_<start>_<end>].<format>`
    pub fn file_stem(&self) -> &'static str {
        match self {
            GeoUnit::State => "state",
            GeoUnit::County => "County",
            GeoUnit::Tract => "Tract",
            GeoUnit::BlockGroup => "BG",
            GeoUnit::Zipcode => "zipcode",
            GeoUnit::LatLong => "lat_long",
        }
    }

    /// Name the `geometry` column is renamed to. Unique per unit so unit
    /// tables can be joined without collisions.
    pub fn geometry_column(&self) -> &'static str {
        match self {
            GeoUnit::State => "geometry_state",
            GeoUnit::County => "geometry_county",
            GeoUnit::Tract => "geometry_tract",
            GeoUnit::BlockGroup => "geometry_BG",
            GeoUnit::Zipcode => "geometry_zipcode",
            GeoUnit::LatLong => "geometry_lat_long",
        }
    }
}

impl std::fmt::Display for GeoUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for GeoUnit {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "state" => Ok(GeoUnit::State),
            "county" => Ok(GeoUnit::County),
            "tract" => Ok(GeoUnit::Tract),
            "block_group" | "blockgroup" | "bg" => Ok(GeoUnit::BlockGroup),
            "zipcode" | "zip" => Ok(GeoUnit::Zipcode),
            "lat_long" | "latlong" => Ok(GeoUnit::LatLong),
            _ => Err(PrepError::Configuration(format!(
                "Unknown geographic unit: '{}'. Use one of: state, county, tract, block_group, zipcode, lat_long",
                s
            ))),
        }
    }
}

impl TryFrom<String> for GeoUnit {
    type Error = PrepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GeoUnit> for String {
    fn from(unit: GeoUnit) -> Self {
        unit.name().to_string()
    }
}
