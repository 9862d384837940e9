//! Raw object ingestion.
//!
//! Turns the extractor's JSON objects into dated snapshots and writes them to
//! the raw tables. A missing object or a body that does not parse fails the
//! whole call.

use chrono::NaiveDate;
use dynamodb_client::SnapshotSink;
use etl_core::{
    partition_key, CovidCounters, EntityId, Error, FluCounters, FluRelease, Result, Snapshot, HHS_REGION_COUNT,
};
use s3_source::{covid_key, flu_key, BucketNames, ObjectSource};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Date format of the timeline keys in county objects.
const TIMELINE_DATE_FORMAT: &str = "%m/%d/%y";

#[derive(Debug, Deserialize)]
struct CountyRow {
    province: String,
    county: String,
    timeline: Timeline,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    cases: HashMap<String, i64>,
    deaths: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct FluObject {
    epidata: Vec<FluRow>,
}

#[derive(Debug, Deserialize)]
struct FluRow {
    region: String,
    num_ili: i64,
    num_patients: i64,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    ili: Option<f64>,
}

/// Counties the source reports for bookkeeping rather than a place.
fn is_placeholder_county(county: &str) -> bool {
    let county = county.trim().to_lowercase();
    county.contains("out of") || county == "unassigned"
}

/// Value at the latest date of a timeline series.
fn latest_value(series: &HashMap<String, i64>, field: &str, entity: &EntityId) -> Result<i64> {
    let mut latest: Option<(NaiveDate, i64)> = None;
    for (raw, value) in series {
        let date = NaiveDate::parse_from_str(raw, TIMELINE_DATE_FORMAT).map_err(|e| {
            Error::decode(format!("{} timeline date {:?} for {}: {}", field, raw, entity, e))
        })?;
        if latest.map_or(true, |(d, _)| date > d) {
            latest = Some((date, *value));
        }
    }
    latest
        .map(|(_, value)| value)
        .ok_or_else(|| Error::decode(format!("empty {} timeline for {}", field, entity)))
}

/// Parses a county object into snapshots dated `date`.
///
/// Placeholder counties are dropped. When a county appears twice the later
/// row wins, keeping the position of the first.
pub fn parse_covid_object(body: &[u8], date: NaiveDate) -> Result<Vec<Snapshot<CovidCounters>>> {
    let rows: Vec<CountyRow> = serde_json::from_slice(body)
        .map_err(|e| Error::decode(format!("county object: {}", e)))?;

    let mut snapshots: Vec<Snapshot<CovidCounters>> = Vec::with_capacity(rows.len());
    let mut seen: HashMap<EntityId, usize> = HashMap::new();
    let mut dropped = 0usize;

    for row in rows {
        if is_placeholder_county(&row.county) {
            dropped += 1;
            continue;
        }

        let entity = EntityId::county(&row.province, &row.county);
        let counters = CovidCounters::new(
            latest_value(&row.timeline.cases, "cases", &entity)?,
            latest_value(&row.timeline.deaths, "deaths", &entity)?,
        );

        match seen.get(&entity) {
            Some(&i) => snapshots[i].counters = counters,
            None => {
                seen.insert(entity.clone(), snapshots.len());
                snapshots.push(Snapshot::new(entity, date, counters));
            }
        }
    }

    debug!(
        counties = snapshots.len(),
        dropped = dropped,
        "Parsed county object"
    );
    Ok(snapshots)
}

/// Parses one region's flu object. The last row for the region wins.
pub fn parse_flu_object(body: &[u8], region: u8, date: NaiveDate) -> Result<Snapshot<FluCounters>> {
    let object: FluObject = serde_json::from_slice(body)
        .map_err(|e| Error::decode(format!("flu object for hhs{}: {}", region, e)))?;

    let entity = EntityId::hhs_region(region);
    let row = object
        .epidata
        .iter()
        .rev()
        .find(|row| EntityId::new(&row.region) == entity)
        .ok_or_else(|| Error::decode(format!("no epidata rows for {}", entity)))?;

    Ok(Snapshot::new(
        entity,
        date,
        FluCounters::new(row.num_ili, row.num_patients),
    )
    .with_meta(FluRelease::new(row.release_date.clone(), row.ili)))
}

/// Fetches raw objects and stores them as snapshots.
pub struct Ingestor<O: ?Sized, W: ?Sized> {
    source: Arc<O>,
    sink: Arc<W>,
    buckets: BucketNames,
}

impl<O, W> Ingestor<O, W>
where
    O: ObjectSource + ?Sized,
    W: SnapshotSink<CovidCounters> + SnapshotSink<FluCounters> + ?Sized,
{
    pub fn new(source: Arc<O>, sink: Arc<W>, buckets: BucketNames) -> Self {
        Self {
            source,
            sink,
            buckets,
        }
    }

    /// Loads one state's county object for `date` into the covid raw table.
    pub async fn ingest_covid_state(&self, state: &str, date: NaiveDate) -> Result<usize> {
        let key = covid_key(state, date);
        let body = self.source.get_object(&self.buckets.covid, &key).await?;
        let snapshots = parse_covid_object(&body, date)?;

        let written = SnapshotSink::<CovidCounters>::put_snapshots(&*self.sink, &snapshots).await?;

        info!(
            state = state,
            key = %key,
            written = written,
            "Ingested covid state"
        );
        Ok(written)
    }

    /// Loads every HHS region's flu object for `date` and writes them in one
    /// bulk call.
    pub async fn ingest_flu(&self, date: NaiveDate) -> Result<usize> {
        let mut snapshots = Vec::with_capacity(HHS_REGION_COUNT as usize);

        for region in 1..=HHS_REGION_COUNT {
            let key = flu_key(region, date);
            let body = self.source.get_object(&self.buckets.flu, &key).await?;
            snapshots.push(parse_flu_object(&body, region, date)?);
            debug!(region = region, key = %key, "Fetched flu region");
        }

        let written = SnapshotSink::<FluCounters>::put_snapshots(&*self.sink, &snapshots).await?;

        info!(
            date = %partition_key(date),
            written = written,
            "Ingested flu regions"
        );
        Ok(written)
    }
}
