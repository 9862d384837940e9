//! Store seams the pipeline depends on.
//!
//! The pipeline only sees these traits, so tests can run it against
//! in-memory tables. [`DynamoClient`](crate::DynamoClient) implements all
//! four for both counter types.

use async_trait::async_trait;
use chrono::NaiveDate;
use etl_core::{AggregatedRecord, Counters, EntityId, Result, Snapshot};

/// Reads one date partition of a raw table.
#[async_trait]
pub trait SnapshotStore<C: Counters>: Send + Sync {
    /// Every snapshot stored under `date`, across all pages.
    ///
    /// An empty partition is `Ok(vec![])`, never an error.
    async fn query_partition(&self, date: NaiveDate) -> Result<Vec<Snapshot<C>>>;
}

/// Writes daily snapshots into a raw table.
#[async_trait]
pub trait SnapshotSink<C: Counters>: Send + Sync {
    /// Puts every snapshot, overwriting rows with the same `(date, entity)`.
    async fn put_snapshots(&self, snapshots: &[Snapshot<C>]) -> Result<usize>;
}

/// Writes wide records into a monthly table.
#[async_trait]
pub trait AggregateWriter<C: Counters>: Send + Sync {
    /// Upserts every record as a whole item keyed by entity.
    async fn upsert_records(&self, records: &[AggregatedRecord<C>]) -> Result<usize>;
}

/// Point reads against a monthly table.
#[async_trait]
pub trait MonthlyReader<C: Counters>: Send + Sync {
    async fn get_record(&self, entity: &EntityId) -> Result<Option<AggregatedRecord<C>>>;
}

/// Everything a pipeline pass needs from the tables of one domain.
pub trait DomainStore<C: Counters>: SnapshotStore<C> + SnapshotSink<C> + AggregateWriter<C> {}

impl<C, T> DomainStore<C> for T
where
    C: Counters,
    T: SnapshotStore<C> + SnapshotSink<C> + AggregateWriter<C> + ?Sized,
{
}
