//! Object key layout of the raw buckets.

use chrono::NaiveDate;
use etl_core::partition_key;

/// `covid/{state}/{date}_last1`. Spaces and underscores in the state name
/// are written as `%20`, the way the extractor stored them.
pub fn covid_key(state: &str, date: NaiveDate) -> String {
    let state = state.trim().replace([' ', '_'], "%20");
    format!("covid/{}/{}_last1", state, partition_key(date))
}

/// `flu/hhs{region}/{date}`.
pub fn flu_key(region: u8, date: NaiveDate) -> String {
    format!("flu/hhs{}/{}", region, partition_key(date))
}
