//! Per-index configuration
//!
//! Declared once at index creation and immutable thereafter. Graph
//! tuning parameters (fan-out, beam widths) are deliberately NOT part
//! of this struct; they belong to the index backend's own config.

use crate::error::{Error, Result};
use crate::metric::DistanceMetric;
use serde::{Deserialize, Serialize};

/// Immutable vector-index configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Embedding dimensionality (e.g. 384, 768, 1536). Must be > 0.
    pub dimension: usize,

    /// Distance metric used for ranking
    pub metric: DistanceMetric,
}

impl IndexConfig {
    /// Create a new IndexConfig with validation
    pub fn new(dimension: usize, metric: DistanceMetric) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidDimension { dimension });
        }
        Ok(IndexConfig { dimension, metric })
    }

    /// Create from a metric name as declared in index DDL
    pub fn with_metric_name(dimension: usize, metric: &str) -> Result<Self> {
        Self::new(dimension, DistanceMetric::parse(metric)?)
    }
}
