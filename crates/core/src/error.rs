//! Unified error types for the ETL pipeline.
//!
//! Error codes:
//! - STORE_001-003: Table store read/write errors
//! - SOURCE_001-002: Object storage errors
//! - DATA_001: Malformed rows or object bodies

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Table store error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// STORE_001: Query or get failed
    ReadFailed,
    /// STORE_002: Batch write failed
    WriteFailed,
    /// STORE_003: Batch write returned unprocessed items
    Unprocessed,
}

impl StoreErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReadFailed => "STORE_001",
            Self::WriteFailed => "STORE_002",
            Self::Unprocessed => "STORE_003",
        }
    }
}

/// Object storage error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorCode {
    /// SOURCE_001: Object fetch failed
    FetchFailed,
    /// SOURCE_002: Object does not exist
    ObjectMissing,
}

impl SourceErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FetchFailed => "SOURCE_001",
            Self::ObjectMissing => "SOURCE_002",
        }
    }
}

/// Unified error type for the ETL pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Table store error with code.
    #[error("[{code}] {message}")]
    Store { code: &'static str, message: String },

    /// Object storage error with code.
    #[error("[{code}] {message}")]
    Source { code: &'static str, message: String },

    /// DATA_001: a row or object body could not be decoded.
    #[error("[DATA_001] {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("reference data error: {0}")]
    Reference(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a table store error.
    pub fn store(code: StoreErrorCode, msg: impl Into<String>) -> Self {
        Self::Store {
            code: code.code(),
            message: msg.into(),
        }
    }

    /// Create an object storage error.
    pub fn source(code: SourceErrorCode, msg: impl Into<String>) -> Self {
        Self::Source {
            code: code.code(),
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn reference(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Store { code, .. } => Some(code),
            Self::Source { code, .. } => Some(code),
            Self::Decode(_) => Some("DATA_001"),
            _ => None,
        }
    }

    /// Whether this error means the thing asked for does not exist, as opposed
    /// to the backend failing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Source { code, .. } => *code == SourceErrorCode::ObjectMissing.code(),
            _ => false,
        }
    }
}
