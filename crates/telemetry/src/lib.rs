//! Telemetry for the sunshine ETL.
//!
//! Structured logging setup, in-process run metrics, and the health of the
//! AWS components the pipeline talks to. Metrics are logged at the end of a
//! run rather than exported.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
