//! Batch workers for the sunshine ETL.
//!
//! - Ingest (S3 objects → raw tables)
//! - Aggregator (raw tables → monthly records)
//! - Orchestrator (sequencing of a scheduled run)

pub mod aggregator;
pub mod ingest;
pub mod orchestrator;

pub use aggregator::RateAggregator;
pub use ingest::*;
pub use orchestrator::*;
