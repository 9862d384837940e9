//! DynamoDB configuration.

use etl_core::Domain;
use serde::{Deserialize, Serialize};

/// DynamoDB client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamoConfig {
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override (DynamoDB Local, LocalStack)
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Table names by role
    #[serde(default)]
    pub tables: TableNames,
}

/// Table names keyed by logical role.
///
/// The aliases accept the legacy name-mapping file keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNames {
    #[serde(default = "default_covid_raw", alias = "covidtable")]
    pub covid_raw: String,
    #[serde(default = "default_covid_monthly", alias = "covidmonthlytable")]
    pub covid_monthly: String,
    #[serde(default = "default_flu_raw", alias = "flutable")]
    pub flu_raw: String,
    #[serde(default = "default_flu_monthly", alias = "flumonthlytable")]
    pub flu_monthly: String,
}

impl TableNames {
    /// Table of daily snapshots for a domain.
    pub fn raw(&self, domain: Domain) -> &str {
        match domain {
            Domain::Covid => &self.covid_raw,
            Domain::Flu => &self.flu_raw,
        }
    }

    /// Table of wide monthly records for a domain.
    pub fn monthly(&self, domain: Domain) -> &str {
        match domain {
            Domain::Covid => &self.covid_monthly,
            Domain::Flu => &self.flu_monthly,
        }
    }
}

fn default_region() -> String {
    "us-east-2".to_string()
}

fn default_covid_raw() -> String {
    "covidtable".to_string()
}

fn default_covid_monthly() -> String {
    "covidmonthly".to_string()
}

fn default_flu_raw() -> String {
    "flutable".to_string()
}

fn default_flu_monthly() -> String {
    "flumonthly".to_string()
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            covid_raw: default_covid_raw(),
            covid_monthly: default_covid_monthly(),
            flu_raw: default_flu_raw(),
            flu_monthly: default_flu_monthly(),
        }
    }
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint_url: None,
            tables: TableNames::default(),
        }
    }
}
