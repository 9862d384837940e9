//! DynamoDB client wrapper.

use crate::codec::Item;
use crate::config::{DynamoConfig, TableNames};
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use etl_core::{Error, Result, StoreErrorCode};
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, info};

/// Maximum put requests DynamoDB accepts in one `BatchWriteItem` call.
pub const BATCH_WRITE_LIMIT: usize = 25;

/// DynamoDB client bound to the pipeline's tables.
#[derive(Clone)]
pub struct DynamoClient {
    inner: Client,
    config: DynamoConfig,
}

impl std::fmt::Debug for DynamoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoClient")
            .field("region", &self.config.region)
            .field("tables", &self.config.tables)
            .finish()
    }
}

impl DynamoClient {
    /// Loads AWS credentials from the environment and creates a client.
    pub async fn connect(config: DynamoConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some(ref endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        Self::from_sdk_config(&sdk_config, config)
    }

    /// Creates a client from an already loaded SDK config.
    pub fn from_sdk_config(sdk_config: &SdkConfig, config: DynamoConfig) -> Self {
        info!(
            region = %config.region,
            endpoint = config.endpoint_url.as_deref().unwrap_or("default"),
            "Created DynamoDB client"
        );

        Self::from_client(Client::new(sdk_config), config)
    }

    /// Wraps an existing SDK client.
    pub fn from_client(inner: Client, config: DynamoConfig) -> Self {
        Self { inner, config }
    }

    /// Returns the inner SDK client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    pub fn config(&self) -> &DynamoConfig {
        &self.config
    }

    pub fn tables(&self) -> &TableNames {
        &self.config.tables
    }

    /// Writes items in batches of [`BATCH_WRITE_LIMIT`].
    ///
    /// Puts overwrite whole items. Items DynamoDB hands back as unprocessed
    /// fail the call; nothing already written is rolled back.
    pub async fn write_items(&self, table: &str, items: Vec<Item>) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let count = items.len();
        let start = Instant::now();

        for (batch_no, chunk) in items.chunks(BATCH_WRITE_LIMIT).enumerate() {
            let requests = chunk
                .iter()
                .map(|item| {
                    PutRequest::builder()
                        .set_item(Some(item.clone()))
                        .build()
                        .map(|put| WriteRequest::builder().put_request(put).build())
                        .map_err(|e| Error::internal(format!("put request: {}", e)))
                })
                .collect::<Result<Vec<_>>>()?;

            let output = self
                .inner
                .batch_write_item()
                .request_items(table, requests)
                .send()
                .await
                .map_err(|e| {
                    metrics().store_errors.inc();
                    Error::store(
                        StoreErrorCode::WriteFailed,
                        format!("batch write to {}: {}", table, DisplayErrorContext(&e)),
                    )
                })?;

            let unprocessed: usize = output
                .unprocessed_items
                .as_ref()
                .map(|pending| pending.values().map(Vec::len).sum())
                .unwrap_or(0);
            if unprocessed > 0 {
                metrics().store_errors.inc();
                return Err(Error::store(
                    StoreErrorCode::Unprocessed,
                    format!(
                        "{} of {} items unprocessed in batch {} for {}",
                        unprocessed,
                        chunk.len(),
                        batch_no,
                        table
                    ),
                ));
            }
        }

        let elapsed = start.elapsed();
        metrics().store_latency_ms.observe(elapsed.as_millis() as u64);

        debug!(
            table = table,
            count = count,
            elapsed_ms = elapsed.as_millis() as u64,
            "Wrote items"
        );

        Ok(count)
    }
}
