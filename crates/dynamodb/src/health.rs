//! DynamoDB health checks.

use crate::client::DynamoClient;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use tracing::{debug, error};

/// Check that the credentials and endpoint can reach DynamoDB.
pub async fn check_connection(client: &DynamoClient) -> bool {
    match client.inner().list_tables().limit(1).send().await {
        Ok(_) => {
            debug!("DynamoDB connection healthy");
            true
        }
        Err(e) => {
            error!("DynamoDB health check failed: {}", DisplayErrorContext(&e));
            false
        }
    }
}

