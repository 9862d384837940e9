//! Raw dated observations and their per-domain counters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::{Domain, EntityId};
use crate::rates::{CovidRates, FluRates};
use crate::record::OffsetSlots;

/// Counter set carried by one snapshot of a domain.
pub trait Counters: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Derived fields computed from the four slots.
    type Rates: Clone + Debug + Default + PartialEq + Send + Sync + 'static;

    /// Source fields stored on the raw row but never aggregated.
    type Meta: Clone + Debug + Default + PartialEq + Send + Sync + 'static;

    const DOMAIN: Domain;

    /// Computes the derived fields. Unset slots count as zero.
    fn rates(slots: &OffsetSlots<Self>) -> Self::Rates;
}

/// Cumulative COVID-19 counters for a county.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovidCounters {
    pub cases: i64,
    pub deaths: i64,
}

impl CovidCounters {
    pub fn new(cases: i64, deaths: i64) -> Self {
        Self { cases, deaths }
    }
}

impl Counters for CovidCounters {
    type Rates = CovidRates;
    type Meta = ();

    const DOMAIN: Domain = Domain::Covid;

    fn rates(slots: &OffsetSlots<Self>) -> CovidRates {
        CovidRates::from_slots(slots)
    }
}

/// Influenza-like-illness counters for an HHS region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluCounters {
    pub num_ili: i64,
    pub num_patients: i64,
}

impl FluCounters {
    pub fn new(num_ili: i64, num_patients: i64) -> Self {
        Self {
            num_ili,
            num_patients,
        }
    }
}

/// Release fields of a flu row, kept on raw rows as the source reported them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FluRelease {
    pub release_date: Option<String>,
    /// ILI percent rounded to two decimals, as text
    pub ili: Option<String>,
}

impl FluRelease {
    pub fn new(release_date: Option<String>, ili: Option<f64>) -> Self {
        Self {
            release_date,
            ili: ili.map(|v| format!("{:?}", (v * 100.0).round_ties_even() / 100.0)),
        }
    }
}

impl Counters for FluCounters {
    type Rates = FluRates;
    type Meta = FluRelease;

    const DOMAIN: Domain = Domain::Flu;

    fn rates(slots: &OffsetSlots<Self>) -> FluRates {
        FluRates::from_slots(slots)
    }
}

/// One raw observation for an entity on a date.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<C: Counters> {
    pub entity: EntityId,
    pub date: NaiveDate,
    pub counters: C,
    pub meta: C::Meta,
}

impl<C: Counters> Snapshot<C> {
    pub fn new(entity: EntityId, date: NaiveDate, counters: C) -> Self {
        Self {
            entity,
            date,
            counters,
            meta: Default::default(),
        }
    }

    pub fn with_meta(mut self, meta: C::Meta) -> Self {
        self.meta = meta;
        self
    }
}
