//! Conversion between typed snapshots/records and DynamoDB items.
//!
//! Attribute names match what the dashboard already reads: `state-county`,
//! `cases-week3`, `monthly-case-rate`, `today-num_ili` and so on. Unset
//! historical slots are left out of the item.

use aws_sdk_dynamodb::types::AttributeValue;
use etl_core::{
    parse_partition_key, partition_key, AggregatedRecord, Counters, CovidCounters, CovidRates,
    EntityId, Error, FluCounters, FluRates, FluRelease, Offset, OffsetSlots, Result, Snapshot,
};
use std::collections::HashMap;

/// One DynamoDB item.
pub type Item = HashMap<String, AttributeValue>;

/// Partition key of raw tables.
pub const DATE_ATTR: &str = "date";

/// Row format of a domain's raw and monthly tables.
pub trait ItemCodec: Counters {
    /// Attribute holding the entity id.
    const ENTITY_ATTR: &'static str;

    fn snapshot_to_item(snapshot: &Snapshot<Self>) -> Item;

    fn snapshot_from_item(item: &Item) -> Result<Snapshot<Self>>;

    fn record_to_item(record: &AggregatedRecord<Self>) -> Item;

    fn record_from_item(item: &Item) -> Result<AggregatedRecord<Self>>;

    /// Primary key of an entity's monthly row.
    fn record_key(entity: &EntityId) -> Item;
}

fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

fn n(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

fn get_s<'a>(item: &'a Item, key: &str) -> Result<&'a str> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| Error::decode(format!("missing string attribute '{}'", key)))
}

fn get_opt_s<'a>(item: &'a Item, key: &str) -> Option<&'a str> {
    item.get(key).and_then(|v| v.as_s().ok()).map(String::as_str)
}

fn get_opt_n<T: std::str::FromStr>(item: &Item, key: &str) -> Result<Option<T>> {
    match item.get(key) {
        None => Ok(None),
        Some(value) => {
            let raw = value
                .as_n()
                .map_err(|_| Error::decode(format!("attribute '{}' is not a number", key)))?;
            parse_number(raw)
                .map(Some)
                .ok_or_else(|| Error::decode(format!("attribute '{}' = '{}' is not valid", key, raw)))
        }
    }
}

fn get_n<T: std::str::FromStr>(item: &Item, key: &str) -> Result<T> {
    get_opt_n(item, key)?
        .ok_or_else(|| Error::decode(format!("missing number attribute '{}'", key)))
}

/// Parses a DynamoDB number. Integer counters written by older loaders may
/// carry a trailing `.0`.
fn parse_number<T: std::str::FromStr>(raw: &str) -> Option<T> {
    raw.parse::<T>()
        .ok()
        .or_else(|| raw.strip_suffix(".0").and_then(|r| r.parse::<T>().ok()))
}

/// Rebuilds the slots from `{prefix}{label}{suffix}` attribute pairs.
fn read_slots<C>(
    item: &Item,
    read: impl Fn(&Item, Offset) -> Result<Option<C>>,
) -> Result<OffsetSlots<C>> {
    let today = read(item, Offset::Today)?
        .ok_or_else(|| Error::decode("monthly row has no today counters"))?;
    let mut slots = OffsetSlots::new(today);
    for offset in Offset::HISTORY {
        if let Some(counters) = read(item, offset)? {
            slots.set(offset, counters);
        }
    }
    Ok(slots)
}

impl ItemCodec for CovidCounters {
    const ENTITY_ATTR: &'static str = "state-county";

    fn snapshot_to_item(snapshot: &Snapshot<Self>) -> Item {
        let mut item = Item::new();
        item.insert(DATE_ATTR.into(), s(partition_key(snapshot.date)));
        item.insert(Self::ENTITY_ATTR.into(), s(snapshot.entity.as_str()));
        item.insert(
            "state".into(),
            s(snapshot.entity.state().unwrap_or_default()),
        );
        item.insert(
            "county".into(),
            s(snapshot.entity.county_name().unwrap_or_default()),
        );
        item.insert("cases".into(), n(snapshot.counters.cases));
        item.insert("deaths".into(), n(snapshot.counters.deaths));
        item
    }

    fn snapshot_from_item(item: &Item) -> Result<Snapshot<Self>> {
        Ok(Snapshot {
            entity: EntityId::new(get_s(item, Self::ENTITY_ATTR)?),
            date: parse_partition_key(get_s(item, DATE_ATTR)?)?,
            counters: CovidCounters::new(get_n(item, "cases")?, get_n(item, "deaths")?),
            meta: (),
        })
    }

    fn record_to_item(record: &AggregatedRecord<Self>) -> Item {
        let mut item = Self::record_key(&record.entity);
        for offset in Offset::ALL {
            if let Some(counters) = record.slots.get(offset) {
                item.insert(format!("cases-{}", offset.label()), n(counters.cases));
                item.insert(format!("deaths-{}", offset.label()), n(counters.deaths));
            }
        }
        item.insert(
            "monthly-case-rate".into(),
            n(record.rates.monthly_case_rate),
        );
        item.insert(
            "monthly-death-rate".into(),
            n(record.rates.monthly_death_rate),
        );
        item
    }

    fn record_from_item(item: &Item) -> Result<AggregatedRecord<Self>> {
        let slots = read_slots(item, |item, offset| {
            let cases: Option<i64> = get_opt_n(item, &format!("cases-{}", offset.label()))?;
            let deaths: Option<i64> = get_opt_n(item, &format!("deaths-{}", offset.label()))?;
            Ok(match (cases, deaths) {
                (None, None) => None,
                (cases, deaths) => Some(CovidCounters::new(
                    cases.unwrap_or_default(),
                    deaths.unwrap_or_default(),
                )),
            })
        })?;

        Ok(AggregatedRecord {
            entity: EntityId::new(get_s(item, Self::ENTITY_ATTR)?),
            slots,
            rates: CovidRates {
                monthly_case_rate: get_opt_n::<f64>(item, "monthly-case-rate")?.unwrap_or_default(),
                monthly_death_rate: get_opt_n::<f64>(item, "monthly-death-rate")?.unwrap_or_default(),
            },
        })
    }

    fn record_key(entity: &EntityId) -> Item {
        let mut key = Item::new();
        key.insert(Self::ENTITY_ATTR.into(), s(entity.as_str()));
        key.insert("state".into(), s(entity.state().unwrap_or_default()));
        key
    }
}

impl ItemCodec for FluCounters {
    const ENTITY_ATTR: &'static str = "region";

    fn snapshot_to_item(snapshot: &Snapshot<Self>) -> Item {
        let mut item = Item::new();
        item.insert(DATE_ATTR.into(), s(partition_key(snapshot.date)));
        item.insert(Self::ENTITY_ATTR.into(), s(snapshot.entity.as_str()));
        item.insert("num_ili".into(), n(snapshot.counters.num_ili));
        item.insert("num_patients".into(), n(snapshot.counters.num_patients));
        if let Some(ref release_date) = snapshot.meta.release_date {
            item.insert("release_date".into(), s(release_date.as_str()));
        }
        if let Some(ref ili) = snapshot.meta.ili {
            item.insert("ili".into(), s(ili.as_str()));
        }
        item
    }

    fn snapshot_from_item(item: &Item) -> Result<Snapshot<Self>> {
        Ok(Snapshot {
            entity: EntityId::new(get_s(item, Self::ENTITY_ATTR)?),
            date: parse_partition_key(get_s(item, DATE_ATTR)?)?,
            counters: FluCounters::new(get_n(item, "num_ili")?, get_n(item, "num_patients")?),
            meta: FluRelease {
                release_date: get_opt_s(item, "release_date").map(str::to_string),
                ili: get_opt_s(item, "ili").map(str::to_string),
            },
        })
    }

    fn record_to_item(record: &AggregatedRecord<Self>) -> Item {
        let mut item = Self::record_key(&record.entity);
        for offset in Offset::ALL {
            if let Some(counters) = record.slots.get(offset) {
                item.insert(format!("{}-num_ili", offset.label()), n(counters.num_ili));
                item.insert(
                    format!("{}-num_patients", offset.label()),
                    n(counters.num_patients),
                );
            }
        }
        item.insert("today-case-rate".into(), n(record.rates.today_ili_rate));
        item.insert("week3-case-rate".into(), n(record.rates.week3_ili_rate));
        item
    }

    fn record_from_item(item: &Item) -> Result<AggregatedRecord<Self>> {
        let slots = read_slots(item, |item, offset| {
            let ili: Option<i64> = get_opt_n(item, &format!("{}-num_ili", offset.label()))?;
            let patients: Option<i64> = get_opt_n(item, &format!("{}-num_patients", offset.label()))?;
            Ok(match (ili, patients) {
                (None, None) => None,
                (ili, patients) => Some(FluCounters::new(
                    ili.unwrap_or_default(),
                    patients.unwrap_or_default(),
                )),
            })
        })?;

        Ok(AggregatedRecord {
            entity: EntityId::new(get_s(item, Self::ENTITY_ATTR)?),
            slots,
            rates: FluRates {
                today_ili_rate: get_opt_n::<f64>(item, "today-case-rate")?.unwrap_or_default(),
                week3_ili_rate: get_opt_n::<f64>(item, "week3-case-rate")?.unwrap_or_default(),
            },
        })
    }

    fn record_key(entity: &EntityId) -> Item {
        let mut key = Item::new();
        key.insert(Self::ENTITY_ATTR.into(), s(entity.as_str()));
        key
    }
}
