//! S3 access for the raw COVID and flu objects.

pub mod client;
pub mod config;
pub mod health;
pub mod keys;

pub use client::*;
pub use config::*;
pub use keys::*;
