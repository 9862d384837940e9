//! Test fixtures and object generators.

use chrono::NaiveDate;
use etl_core::{CovidCounters, EntityId, FluCounters, Offset, Snapshot, HHS_REGION_COUNT};
use reference::{EventDetails, GeoTable, StateRegions};
use s3_source::{covid_key, flu_key, BucketNames};

use crate::mocks::MemoryObjects;

/// Reference date used across the tests (a Monday).
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 3, 22).unwrap()
}

/// Date of an offset from [`reference_date`].
pub fn day(offset: Offset) -> NaiveDate {
    offset.target_date(reference_date())
}

pub fn covid(entity: &str, date: NaiveDate, cases: i64, deaths: i64) -> Snapshot<CovidCounters> {
    Snapshot::new(EntityId::new(entity), date, CovidCounters::new(cases, deaths))
}

pub fn flu(region: u8, date: NaiveDate, num_ili: i64, num_patients: i64) -> Snapshot<FluCounters> {
    Snapshot::new(
        EntityId::hhs_region(region),
        date,
        FluCounters::new(num_ili, num_patients),
    )
}

/// One county row as the extractor stores it, with a two-day timeline
/// ending the day before `date`.
pub fn county_row(state: &str, county: &str, cases: i64, deaths: i64, date: NaiveDate) -> serde_json::Value {
    let last = date.pred_opt().unwrap();
    let prev = last.pred_opt().unwrap();
    let fmt = |d: NaiveDate| d.format("%-m/%-d/%y").to_string();
    serde_json::json!({
        "country": "US",
        "province": state,
        "county": county,
        "timeline": {
            "cases": { fmt(prev): cases - 1, fmt(last): cases },
            "deaths": { fmt(prev): deaths, fmt(last): deaths },
        }
    })
}

/// A county object holding the given rows.
pub fn county_object(rows: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::Value::Array(rows)
}

/// A flu object for one region, with an older row that must be ignored.
pub fn flu_object(region: u8, num_ili: i64, num_patients: i64) -> serde_json::Value {
    serde_json::json!({
        "result": 1,
        "message": "success",
        "epidata": [
            {"release_date": "2021-03-12", "region": format!("hhs{}", region),
             "epiweek": 202109, "num_ili": 1, "num_patients": 1, "ili": 100.0},
            {"release_date": "2021-03-19", "region": format!("hhs{}", region),
             "epiweek": 202110, "num_ili": num_ili, "num_patients": num_patients, "ili": 1.5}
        ]
    })
}

pub fn buckets() -> BucketNames {
    BucketNames {
        covid: "covid-bucket".to_string(),
        flu: "flu-bucket".to_string(),
    }
}

pub const STATES_CSV: &str = "State,Region\nCalifornia,9\nNew York,2\n";

pub const GEO_CSV: &str = "zipcode,state,county\n94501,California,Alameda\n10001,New York,New York\n97401,Oregon,Lane\n";

pub fn states() -> StateRegions {
    StateRegions::from_reader(STATES_CSV.as_bytes()).unwrap()
}

pub fn geo() -> GeoTable {
    GeoTable::from_reader(GEO_CSV.as_bytes()).unwrap()
}

/// Fills the buckets with a complete day: both states of [`STATES_CSV`]
/// plus every flu region.
pub fn seed_objects(objects: &MemoryObjects, date: NaiveDate) {
    let buckets = buckets();

    objects.put_json(
        &buckets.covid,
        &covid_key("California", date),
        &county_object(vec![
            county_row("California", "Alameda", 1000, 20, date),
            county_row("California", "San Mateo", 400, 5, date),
            county_row("California", "out of ca", 12, 0, date),
            county_row("California", "unassigned", 3, 0, date),
        ]),
    );
    objects.put_json(
        &buckets.covid,
        &covid_key("New York", date),
        &county_object(vec![county_row("New York", "New York", 5000, 100, date)]),
    );

    for region in 1..=HHS_REGION_COUNT {
        objects.put_json(
            &buckets.flu,
            &flu_key(region, date),
            &flu_object(region, 10 * region as i64, 1000),
        );
    }
}

pub fn event(postal_code: &str) -> EventDetails {
    EventDetails {
        name: "Spring Street Fair".to_string(),
        description: "Food trucks and live music".to_string(),
        start_time: "2021-03-27T11:00:00".to_string(),
        venue_id: "venue-1".to_string(),
        address: "1 Park St".to_string(),
        postal_code: postal_code.to_string(),
    }
}
