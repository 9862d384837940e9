//! The wide per-entity monthly record.

use serde::{Deserialize, Serialize};

use crate::domain::EntityId;
use crate::offset::Offset;
use crate::snapshot::{Counters, CovidCounters, FluCounters};

/// Counters for the four time slices of one entity.
///
/// `today` is always present since the today partition defines which
/// entities get a record. Historical slots stay `None` when the entity had no
/// row in that partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetSlots<C> {
    pub today: C,
    pub week1: Option<C>,
    pub week2: Option<C>,
    pub week3: Option<C>,
}

impl<C> OffsetSlots<C> {
    pub fn new(today: C) -> Self {
        Self {
            today,
            week1: None,
            week2: None,
            week3: None,
        }
    }

    pub fn get(&self, offset: Offset) -> Option<&C> {
        match offset {
            Offset::Today => Some(&self.today),
            Offset::Week1 => self.week1.as_ref(),
            Offset::Week2 => self.week2.as_ref(),
            Offset::Week3 => self.week3.as_ref(),
        }
    }

    pub fn set(&mut self, offset: Offset, counters: C) {
        match offset {
            Offset::Today => self.today = counters,
            Offset::Week1 => self.week1 = Some(counters),
            Offset::Week2 => self.week2 = Some(counters),
            Offset::Week3 => self.week3 = Some(counters),
        }
    }
}

/// One wide row per entity per aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord<C: Counters> {
    pub entity: EntityId,
    pub slots: OffsetSlots<C>,
    pub rates: C::Rates,
}

impl<C: Counters> AggregatedRecord<C> {
    /// Builds a record and computes its rates from the slots.
    pub fn from_slots(entity: EntityId, slots: OffsetSlots<C>) -> Self {
        let rates = C::rates(&slots);
        Self {
            entity,
            slots,
            rates,
        }
    }
}

pub type CovidRecord = AggregatedRecord<CovidCounters>;
pub type FluRecord = AggregatedRecord<FluCounters>;
