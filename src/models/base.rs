use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type FacilityId = u32;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Base {
    pub name: String,
    pub id: FacilityId,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Continent {
    Indar,
    Hossin,
    Amerish,
    Esamir,
    Oshur,
}

impl Continent {
    pub const ALL: [Continent; 5] = [
        Continent::Indar,
        Continent::Hossin,
        Continent::Amerish,
        Continent::Esamir,
        Continent::Oshur,
    ];

    /// Census zone id of the continent.
    pub fn zone_id(&self) -> u32 {
        match self {
            Continent::Indar => 2,
            Continent::Hossin => 4,
            Continent::Amerish => 6,
            Continent::Esamir => 8,
            Continent::Oshur => 334,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Continent::Indar => "Indar",
            Continent::Hossin => "Hossin",
            Continent::Amerish => "Amerish",
            Continent::Esamir => "Esamir",
            Continent::Oshur => "Oshur",
        }
    }
}

impl Default for Continent {
    fn default() -> Self {
        Continent::Indar
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown continent: {0}")]
pub struct UnknownContinent(pub String);

impl FromStr for Continent {
    type Err = UnknownContinent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Continent::ALL
            .into_iter()
            .find(|continent| continent.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownContinent(s.to_string()))
    }
}
