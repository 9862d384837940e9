//! Reference data loaded from CSV.
//!
//! The states list drives COVID ingestion and maps states to HHS regions;
//! the geo table maps postal codes to counties. Both are loaded once at
//! startup and passed to whatever needs them.

pub mod geo;
pub mod states;
pub mod venue;

pub use geo::*;
pub use states::*;
pub use venue::*;
