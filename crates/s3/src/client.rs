//! S3 client wrapper and the object source seam.

use crate::config::{BucketNames, S3Config};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use etl_core::{Error, Result, SourceErrorCode};
use std::time::Instant;
use telemetry::metrics;
use tracing::debug;

/// Reads whole raw objects.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Body of `bucket/key`. A missing object is `SOURCE_002`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct S3Client {
    inner: Client,
    config: S3Config,
}

impl std::fmt::Debug for S3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Client")
            .field("region", &self.config.region)
            .field("buckets", &self.config.buckets)
            .finish()
    }
}

impl S3Client {
    /// Loads AWS credentials from the environment and creates a client.
    pub async fn connect(config: S3Config) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some(ref endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        Self::from_sdk_config(&sdk_config, config)
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig, config: S3Config) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        debug!(
            region = %config.region,
            path_style = config.force_path_style,
            "Created S3 client"
        );

        Self {
            inner: Client::from_conf(s3_config),
            config,
        }
    }

    pub fn inner(&self) -> &Client {
        &self.inner
    }

    pub fn buckets(&self) -> &BucketNames {
        &self.config.buckets
    }
}

#[async_trait]
impl ObjectSource for S3Client {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let start = Instant::now();

        let output = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                metrics().object_fetch_errors.inc();
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if missing {
                    Error::source(
                        SourceErrorCode::ObjectMissing,
                        format!("s3://{}/{} does not exist", bucket, key),
                    )
                } else {
                    Error::source(
                        SourceErrorCode::FetchFailed,
                        format!("get s3://{}/{}: {}", bucket, key, DisplayErrorContext(&e)),
                    )
                }
            })?;

        let body = output.body.collect().await.map_err(|e| {
            metrics().object_fetch_errors.inc();
            Error::source(
                SourceErrorCode::FetchFailed,
                format!("read body of s3://{}/{}: {}", bucket, key, e),
            )
        })?;
        let bytes = body.into_bytes().to_vec();

        let elapsed = start.elapsed();
        metrics().objects_fetched.inc();
        metrics().object_latency_ms.observe(elapsed.as_millis() as u64);

        debug!(
            bucket = bucket,
            key = key,
            bytes = bytes.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Fetched object"
        );

        Ok(bytes)
    }
}
