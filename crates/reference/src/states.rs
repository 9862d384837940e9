//! States list with HHS regions.

use etl_core::{EntityId, Error, Result, HHS_REGION_COUNT};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct StateRow {
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Region")]
    region: String,
}

/// Ordered states and the HHS region each belongs to.
#[derive(Debug, Clone, Default)]
pub struct StateRegions {
    states: Vec<String>,
    regions: HashMap<String, u8>,
}

impl StateRegions {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::Reader::from_path(path)
            .map_err(|e| Error::reference(format!("open {}: {}", path.display(), e)))?;
        Self::from_csv(reader)
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        Self::from_csv(csv::Reader::from_reader(rdr))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let mut table = Self::default();

        for (line, row) in reader.deserialize::<StateRow>().enumerate() {
            let row = row.map_err(|e| Error::reference(format!("states row {}: {}", line + 1, e)))?;
            let region = parse_region(&row.region).ok_or_else(|| {
                Error::reference(format!(
                    "states row {}: region {:?} is not 1..={}",
                    line + 1,
                    row.region,
                    HHS_REGION_COUNT
                ))
            })?;

            let state = row.state.trim().to_string();
            if table.regions.insert(state.to_lowercase(), region).is_none() {
                table.states.push(state);
            }
        }

        debug!(states = table.states.len(), "Loaded states list");
        Ok(table)
    }

    /// States in file order, as spelled in the file.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// HHS region number of a state, ignoring case.
    pub fn region_of(&self, state: &str) -> Option<u8> {
        self.regions.get(&state.trim().to_lowercase()).copied()
    }

    /// HHS region entity of a state.
    pub fn region_entity(&self, state: &str) -> Result<EntityId> {
        self.region_of(state)
            .map(EntityId::hhs_region)
            .ok_or_else(|| Error::not_found(format!("no HHS region for state {}", state)))
    }
}

/// Accepts `9` or `hhs9`.
fn parse_region(raw: &str) -> Option<u8> {
    let raw = raw.trim().to_lowercase();
    let digits = raw.strip_prefix("hhs").unwrap_or(&raw);
    digits
        .parse::<u8>()
        .ok()
        .filter(|n| (1..=HHS_REGION_COUNT).contains(n))
}
