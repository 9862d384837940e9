//! Monthly rate aggregation.
//!
//! One pass reads four date partitions of a raw table (the reference date
//! and 7, 14 and 21 days before it), joins them onto the entities present
//! on the reference date and computes the rate fields:
//!
//! 1. Query each partition once, in offset order
//! 2. Re-query the reference date for any historical partition that is empty
//! 3. Start one record per entity of the reference date, in scan order
//! 4. Fill the historical slots of entities already known; ignore the rest

use chrono::NaiveDate;
use dynamodb_client::SnapshotStore;
use etl_core::{partition_key, AggregatedRecord, Counters, EntityId, Offset, OffsetSlots, Result, Snapshot};
use std::collections::HashMap;
use std::sync::Arc;
use telemetry::metrics;
use tracing::{debug, info, warn};

/// Joins dated snapshots into wide monthly records.
pub struct RateAggregator<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> RateAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Builds one record per entity present on `reference`.
    ///
    /// Any read failure aborts the pass; nothing is retried.
    pub async fn aggregate<C>(&self, reference: NaiveDate) -> Result<Vec<AggregatedRecord<C>>>
    where
        C: Counters,
        S: SnapshotStore<C>,
    {
        let mut working: Vec<(EntityId, OffsetSlots<C>)> = Vec::new();
        let mut index: HashMap<EntityId, usize> = HashMap::new();

        for offset in Offset::ALL {
            let snapshots = self.fetch_partition::<C>(offset, reference).await?;

            if offset == Offset::Today {
                for snapshot in snapshots {
                    if index.contains_key(&snapshot.entity) {
                        continue;
                    }
                    index.insert(snapshot.entity.clone(), working.len());
                    working.push((snapshot.entity, OffsetSlots::new(snapshot.counters)));
                }
                continue;
            }

            let mut matched = 0usize;
            for snapshot in snapshots {
                if let Some(&i) = index.get(&snapshot.entity) {
                    working[i].1.set(offset, snapshot.counters);
                    matched += 1;
                }
            }
            debug!(
                domain = %C::DOMAIN,
                offset = offset.label(),
                matched = matched,
                entities = working.len(),
                "Merged offset"
            );
        }

        let records: Vec<_> = working
            .into_iter()
            .map(|(entity, slots)| AggregatedRecord::from_slots(entity, slots))
            .collect();

        info!(
            domain = %C::DOMAIN,
            reference = %partition_key(reference),
            records = records.len(),
            "Aggregated monthly records"
        );

        Ok(records)
    }

    /// Reads the partition for `offset`, falling back to the reference date
    /// when a historical partition is empty.
    async fn fetch_partition<C>(&self, offset: Offset, reference: NaiveDate) -> Result<Vec<Snapshot<C>>>
    where
        C: Counters,
        S: SnapshotStore<C>,
    {
        let target = offset.target_date(reference);
        let snapshots = SnapshotStore::<C>::query_partition(&*self.store, target).await?;

        if !snapshots.is_empty() || offset == Offset::Today {
            if snapshots.is_empty() {
                warn!(
                    domain = %C::DOMAIN,
                    date = %partition_key(target),
                    "Reference partition is empty, no records will be produced"
                );
            }
            return Ok(snapshots);
        }

        // The substituted rows make this slot equal to today.
        warn!(
            domain = %C::DOMAIN,
            offset = offset.label(),
            missing = %partition_key(target),
            substitute = %partition_key(reference),
            "Historical partition empty, using reference date"
        );
        metrics().partition_fallbacks.inc();

        SnapshotStore::<C>::query_partition(&*self.store, reference).await
    }
}
