//! Postal code to county table.

use etl_core::{EntityId, Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct GeoRow {
    zipcode: String,
    state: String,
    county: String,
}

/// State and county a postal code falls in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoLocation {
    pub state: String,
    pub county: String,
}

impl GeoLocation {
    pub fn entity(&self) -> EntityId {
        EntityId::county(&self.state, &self.county)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeoTable {
    by_zip: HashMap<String, GeoLocation>,
}

impl GeoTable {
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
        let mut by_zip = HashMap::new();

        for (line, row) in reader.deserialize::<GeoRow>().enumerate() {
            let row = row.map_err(|e| Error::reference(format!("geo row {}: {}", line + 1, e)))?;
            let zip = normalize_zip(&row.zipcode);
            let location = GeoLocation {
                state: row.state.trim().to_string(),
                county: row.county.trim().to_string(),
            };
            // First row wins.
            if by_zip.contains_key(&zip) {
                warn!(zipcode = %zip, line = line + 1, "Duplicate postal code in geo table");
                continue;
            }
            by_zip.insert(zip, location);
        }

        debug!(postal_codes = by_zip.len(), "Loaded geo table");
        Ok(Self { by_zip })
    }

    pub fn len(&self) -> usize {
        self.by_zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_zip.is_empty()
    }

    pub fn lookup(&self, postal_code: &str) -> Option<&GeoLocation> {
        self.by_zip.get(&normalize_zip(postal_code))
    }

    /// County entity of a postal code.
    pub fn county_of(&self, postal_code: &str) -> Result<EntityId> {
        self.lookup(postal_code)
            .map(GeoLocation::entity)
            .ok_or_else(|| Error::not_found(format!("postal code {} not in geo table", postal_code)))
    }
}

/// Five-digit ZIP: drops a `+4` suffix and restores leading zeros lost to
/// spreadsheets.
fn normalize_zip(raw: &str) -> String {
    let base = raw.trim().split('-').next().unwrap_or_default();
    if !base.is_empty() && base.len() < 5 && base.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>5}", base)
    } else {
        base.to_string()
    }
}
