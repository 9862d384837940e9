//! Core types and rate math for the sunshine ETL.
//!
//! Everything here is storage-agnostic: entities, dated snapshots, the wide
//! monthly record, and the rate formulas. Row formats live with the store
//! clients.

pub mod domain;
pub mod error;
pub mod offset;
pub mod rates;
pub mod record;
pub mod snapshot;

pub use domain::*;
pub use error::{Error, Result, SourceErrorCode, StoreErrorCode};
pub use offset::*;
pub use rates::*;
pub use record::*;
pub use snapshot::*;
