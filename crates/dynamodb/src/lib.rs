//! DynamoDB access for the sunshine ETL.
//!
//! Raw tables hold one row per `(date, entity)`; monthly tables hold one wide
//! row per entity. The traits in [`traits`] are what the pipeline depends on;
//! [`DynamoClient`] implements them against DynamoDB.

pub mod client;
pub mod codec;
pub mod config;
pub mod health;
pub mod monthly;
pub mod store;
pub mod traits;

pub use client::*;
pub use codec::{Item, ItemCodec};
pub use config::*;
pub use monthly::*;
pub use traits::*;
