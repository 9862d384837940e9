//! S3 configuration.

use etl_core::Domain;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override (LocalStack, MinIO)
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Path-style addressing, needed by most local S3 emulators
    #[serde(default)]
    pub force_path_style: bool,
    #[serde(default)]
    pub buckets: BucketNames,
}

/// Bucket names keyed by domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketNames {
    #[serde(default = "default_covid_bucket", alias = "covidbucket")]
    pub covid: String,
    #[serde(default = "default_flu_bucket", alias = "flubucket")]
    pub flu: String,
}

impl BucketNames {
    pub fn for_domain(&self, domain: Domain) -> &str {
        match domain {
            Domain::Covid => &self.covid,
            Domain::Flu => &self.flu,
        }
    }
}

fn default_region() -> String {
    "us-east-2".to_string()
}

fn default_covid_bucket() -> String {
    "sunshine-covidapibucket-dev".to_string()
}

fn default_flu_bucket() -> String {
    "sunshine-fluapibucket-dev".to_string()
}

impl Default for BucketNames {
    fn default() -> Self {
        Self {
            covid: default_covid_bucket(),
            flu: default_flu_bucket(),
        }
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint_url: None,
            force_path_style: false,
            buckets: BucketNames::default(),
        }
    }
}
