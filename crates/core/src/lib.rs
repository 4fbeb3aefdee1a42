//! Core types for the Quiver database
//!
//! This crate defines the foundational types shared by the storage
//! substrate and the secondary-index subsystem:
//!
//! - `RecordId`: opaque primary key of an indexed record
//! - `Error` / `Result`: the error taxonomy (validation, consistency, storage)
//! - `DistanceMetric`: closed enumeration of similarity metrics
//! - `IndexConfig`: immutable per-index configuration
//! - `JsonScalar` / `MetadataFilter`: scalar-equality metadata filtering

pub mod config;
pub mod error;
pub mod filter;
pub mod id;
pub mod metric;

pub use config::IndexConfig;
pub use error::{Error, Result};
pub use filter::{JsonScalar, MetadataFilter};
pub use id::RecordId;
pub use metric::DistanceMetric;
