//! Error types for the Quiver database
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations. Variants fall into three groups:
//!
//! - **Validation**: caller mistakes, raised at the API boundary before
//!   any mutation (missing target, dimension mismatch, unsupported
//!   comparator, bad target type)
//! - **Consistency**: internal invariant violations that indicate
//!   corruption; should never surface during correct operation
//! - **Storage**: propagated unchanged from the key-value substrate

use thiserror::Error;

/// Result type alias for Quiver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Quiver database
#[derive(Debug, Error)]
pub enum Error {
    /// Search invoked without a target vector
    #[error("target vector must be provided")]
    MissingTargetVector,

    /// Vector length does not match the index's configured dimensionality
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimensionality declared at index creation
        expected: usize,
        /// Dimensionality of the offending vector
        got: usize,
    },

    /// Empty vector supplied where a non-empty one is required
    #[error("empty vector for attribute {attribute}")]
    EmptyVector {
        /// Name of the indexed attribute
        attribute: String,
    },

    /// Invalid dimensionality in index configuration (must be > 0)
    #[error("invalid dimension: {dimension} (must be > 0)")]
    InvalidDimension {
        /// The invalid dimension value
        dimension: usize,
    },

    /// Ordering comparator applied to a vector-typed attribute
    #[error("comparator {comparator} not supported for vector attribute {attribute}")]
    ComparatorUnsupported {
        /// The offending comparator, as written in the query
        comparator: String,
        /// Name of the vector attribute
        attribute: String,
    },

    /// Non-array (or non-numeric) value supplied where a vector target is required
    #[error("invalid target for vector attribute {attribute}: {reason}")]
    InvalidTargetType {
        /// Name of the vector attribute
        attribute: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Unknown distance metric name in index configuration
    #[error("unknown distance metric: {name}")]
    UnknownMetric {
        /// The unrecognized metric name
        name: String,
    },

    /// Internal graph invariant violation detected
    #[error("index corruption: {0}")]
    Corruption(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage layer error, propagated from the key-value substrate
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// True for errors callers can fix by correcting their request
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingTargetVector
                | Error::DimensionMismatch { .. }
                | Error::EmptyVector { .. }
                | Error::InvalidDimension { .. }
                | Error::ComparatorUnsupported { .. }
                | Error::InvalidTargetType { .. }
                | Error::UnknownMetric { .. }
        )
    }
}
