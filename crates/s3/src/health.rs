//! S3 health checks.

use crate::client::S3Client;
use aws_sdk_s3::error::DisplayErrorContext;
use tracing::{debug, error};

/// Check that both raw buckets are reachable.
pub async fn check_connection(client: &S3Client) -> bool {
    let buckets = client.buckets();
    for bucket in [&buckets.covid, &buckets.flu] {
        if let Err(e) = client.inner().head_bucket().bucket(bucket).send().await {
            error!(bucket = %bucket, "S3 health check failed: {}", DisplayErrorContext(&e));
            return false;
        }
    }

    debug!("S3 buckets reachable");
    true
}
