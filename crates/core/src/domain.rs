//! Data domains and entity identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Number of HHS regions reported by the flu source.
pub const HHS_REGION_COUNT: u8 = 10;

/// Which counter schema and which pair of tables a pass works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// County-level cumulative cases and deaths.
    Covid,
    /// HHS-region influenza-like-illness counts.
    Flu,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Covid, Domain::Flu];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Covid => "covid",
            Self::Flu => "flu",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "covid" => Ok(Self::Covid),
            "flu" => Ok(Self::Flu),
            other => Err(Error::config(format!("unknown domain: {}", other))),
        }
    }
}

/// Identifier of the unit of aggregation.
///
/// Counties are `state-county` (lowercase, e.g. `california-alameda`); HHS
/// regions are `hhs1` through `hhs10`. State names never contain `-`, so the
/// state of a county id is everything before the first one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps a raw id as stored, lowercased.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    /// Builds a county id from its state and county names.
    pub fn county(state: &str, county: &str) -> Self {
        Self(format!(
            "{}-{}",
            state.trim().to_lowercase(),
            county.trim().to_lowercase()
        ))
    }

    /// Builds an HHS region id.
    pub fn hhs_region(region: u8) -> Self {
        Self(format!("hhs{}", region))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// State part of a county id.
    pub fn state(&self) -> Option<&str> {
        self.0.split_once('-').map(|(state, _)| state)
    }

    /// County part of a county id.
    pub fn county_name(&self) -> Option<&str> {
        self.0.split_once('-').map(|(_, county)| county)
    }

    /// Region number of an HHS region id.
    pub fn region_number(&self) -> Option<u8> {
        self.0
            .strip_prefix("hhs")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=HHS_REGION_COUNT).contains(n))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
