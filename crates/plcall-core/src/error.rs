//! Error types for plcall

use thiserror::Error;

/// Core error type for plcall operations
///
/// Absence of a routine or synonym is not an error: lookups return
/// `Ok(None)` and leave the decision to the caller.
#[derive(Error, Debug)]
pub enum PlcallError {
    /// A type appeared that the engine cannot bind or fetch, e.g. a
    /// package-local composite with no SQL-level backing, or a tag
    /// combination with no conversion.
    #[error("unsupported type {type_name}: {reason}")]
    UnsupportedType { type_name: String, reason: String },

    /// A structured value did not match the declared record fields.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The catalog row stream violated a builder assumption (duplicate
    /// position, child row with no recorded parent level).
    #[error("metadata defect: {0}")]
    MetadataDefect(String),

    /// DDL for temp-storage materialization failed.
    #[error("temporary storage creation failed: {0}")]
    StorageCreation(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("bind error: {0}")]
    Bind(String),
}

impl PlcallError {
    pub fn unsupported_type(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for plcall operations
pub type Result<T> = std::result::Result<T, PlcallError>;
