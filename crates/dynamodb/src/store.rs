//! Store trait implementations over DynamoDB.

use crate::client::DynamoClient;
use crate::codec::{Item, ItemCodec, DATE_ATTR};
use crate::traits::{AggregateWriter, MonthlyReader, SnapshotSink, SnapshotStore};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::NaiveDate;
use etl_core::{
    partition_key, AggregatedRecord, EntityId, Error, Result, Snapshot, StoreErrorCode,
};
use std::time::Instant;
use telemetry::metrics;
use tracing::debug;

impl DynamoClient {
    /// Queries every page of a raw table partition.
    async fn query_items(&self, table: &str, date: NaiveDate) -> Result<Vec<Item>> {
        let key = partition_key(date);
        let start = Instant::now();
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;
        let mut pages = 0u32;

        loop {
            let output = self
                .inner()
                .query()
                .table_name(table)
                .key_condition_expression("#date = :date")
                .expression_attribute_names("#date", DATE_ATTR)
                .expression_attribute_values(":date", AttributeValue::S(key.clone()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| {
                    metrics().store_errors.inc();
                    Error::store(
                        StoreErrorCode::ReadFailed,
                        format!("query {} for {}: {}", table, key, DisplayErrorContext(&e)),
                    )
                })?;

            pages += 1;
            items.extend(output.items.unwrap_or_default());

            match output.last_evaluated_key {
                Some(last) if !last.is_empty() => start_key = Some(last),
                _ => break,
            }
        }

        let elapsed = start.elapsed();
        metrics().store_latency_ms.observe(elapsed.as_millis() as u64);

        debug!(
            table = table,
            date = %key,
            pages = pages,
            rows = items.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Queried partition"
        );

        Ok(items)
    }
}

#[async_trait]
impl<C: ItemCodec> SnapshotStore<C> for DynamoClient {
    async fn query_partition(&self, date: NaiveDate) -> Result<Vec<Snapshot<C>>> {
        let table = self.tables().raw(C::DOMAIN).to_string();
        let items = self.query_items(&table, date).await?;

        let snapshots = items
            .iter()
            .map(C::snapshot_from_item)
            .collect::<Result<Vec<_>>>()?;

        metrics().snapshots_read.inc_by(snapshots.len() as u64);
        Ok(snapshots)
    }
}

#[async_trait]
impl<C: ItemCodec> SnapshotSink<C> for DynamoClient {
    async fn put_snapshots(&self, snapshots: &[Snapshot<C>]) -> Result<usize> {
        let table = self.tables().raw(C::DOMAIN).to_string();
        let items = snapshots.iter().map(C::snapshot_to_item).collect();

        let written = self.write_items(&table, items).await?;
        metrics().snapshots_written.inc_by(written as u64);
        Ok(written)
    }
}

#[async_trait]
impl<C: ItemCodec> AggregateWriter<C> for DynamoClient {
    async fn upsert_records(&self, records: &[AggregatedRecord<C>]) -> Result<usize> {
        let table = self.tables().monthly(C::DOMAIN).to_string();
        let items = records.iter().map(C::record_to_item).collect();

        let written = self.write_items(&table, items).await?;
        metrics().records_written.inc_by(written as u64);
        Ok(written)
    }
}

#[async_trait]
impl<C: ItemCodec> MonthlyReader<C> for DynamoClient {
    async fn get_record(&self, entity: &EntityId) -> Result<Option<AggregatedRecord<C>>> {
        let table = self.tables().monthly(C::DOMAIN).to_string();
        let start = Instant::now();

        let output = self
            .inner()
            .get_item()
            .table_name(&table)
            .set_key(Some(C::record_key(entity)))
            .send()
            .await
            .map_err(|e| {
                metrics().store_errors.inc();
                Error::store(
                    StoreErrorCode::ReadFailed,
                    format!("get {} from {}: {}", entity, table, DisplayErrorContext(&e)),
                )
            })?;

        metrics()
            .store_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        output.item.as_ref().map(C::record_from_item).transpose()
    }
}
