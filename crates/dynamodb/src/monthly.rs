//! Dashboard lookups against the monthly tables.

use crate::traits::MonthlyReader;
use etl_core::{CovidCounters, CovidRecord, EntityId, FluCounters, FluRecord, Result};
use serde::{Deserialize, Serialize};
use telemetry::metrics;
use tracing::debug;

/// What the dashboard shows for a county.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CovidSummary {
    pub daily_cases: i64,
    pub daily_deaths: i64,
    pub monthly_case_rate: f64,
    pub monthly_death_rate: f64,
}

impl From<&CovidRecord> for CovidSummary {
    fn from(record: &CovidRecord) -> Self {
        Self {
            daily_cases: record.slots.today.cases,
            daily_deaths: record.slots.today.deaths,
            monthly_case_rate: record.rates.monthly_case_rate,
            monthly_death_rate: record.rates.monthly_death_rate,
        }
    }
}

/// What the dashboard shows for an HHS region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluSummary {
    pub today_rate: f64,
    pub week3_rate: f64,
}

impl From<&FluRecord> for FluSummary {
    fn from(record: &FluRecord) -> Self {
        Self {
            today_rate: record.rates.today_ili_rate,
            week3_rate: record.rates.week3_ili_rate,
        }
    }
}

/// Looks up a county. `Ok(None)` when it has no monthly record.
pub async fn covid_summary<R>(reader: &R, entity: &EntityId) -> Result<Option<CovidSummary>>
where
    R: MonthlyReader<CovidCounters> + ?Sized,
{
    metrics().monthly_lookups.inc();
    let record = reader.get_record(entity).await?;
    debug!(entity = %entity, found = record.is_some(), "Covid monthly lookup");
    Ok(record.as_ref().map(CovidSummary::from))
}

/// Looks up an HHS region. `Ok(None)` when it has no monthly record.
pub async fn flu_summary<R>(reader: &R, region: &EntityId) -> Result<Option<FluSummary>>
where
    R: MonthlyReader<FluCounters> + ?Sized,
{
    metrics().monthly_lookups.inc();
    let record = reader.get_record(region).await?;
    debug!(region = %region, found = record.is_some(), "Flu monthly lookup");
    Ok(record.as_ref().map(FluSummary::from))
}
