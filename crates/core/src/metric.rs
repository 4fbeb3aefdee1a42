//! Distance metric enumeration
//!
//! The metric is fixed at index-creation time, so it is modeled as a
//! closed enum dispatched through a match rather than runtime
//! polymorphism. The actual distance computation lives in the index
//! crate; this enum is only the declaration surface.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Distance metric for similarity ranking
///
/// All metrics are oriented "lower = closer". This orientation is part
/// of the interface contract: search results are sorted by ascending
/// distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Cosine distance: 1 - dot(a,b) / (||a|| * ||b||)
    /// Range: [0, 2], lower = closer
    #[default]
    Cosine,

    /// Euclidean distance: L2 norm of (a - b)
    /// Range: [0, inf), lower = closer
    Euclidean,

    /// Negated dot product: -dot(a,b)
    /// Range: unbounded, lower = closer
    /// Assumes pre-normalized embeddings for meaningful comparison.
    DotProduct,
}

impl DistanceMetric {
    /// Human-readable name for display and configuration
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dot_product",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "dot_product" | "dot" | "inner_product" => Ok(DistanceMetric::DotProduct),
            _ => Err(Error::UnknownMetric {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert_eq!(DistanceMetric::Cosine.name(), "cosine");
        assert_eq!(DistanceMetric::Euclidean.name(), "euclidean");
        assert_eq!(DistanceMetric::DotProduct.name(), "dot_product");
    }

    #[test]
    fn test_metric_default() {
        assert_eq!(DistanceMetric::default(), DistanceMetric::Cosine);
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!(DistanceMetric::parse("cosine").unwrap(), DistanceMetric::Cosine);
        assert_eq!(DistanceMetric::parse("COSINE").unwrap(), DistanceMetric::Cosine);
        assert_eq!(DistanceMetric::parse("l2").unwrap(), DistanceMetric::Euclidean);
        assert_eq!(
            DistanceMetric::parse("inner_product").unwrap(),
            DistanceMetric::DotProduct
        );
        assert!(matches!(
            DistanceMetric::parse("hamming"),
            Err(Error::UnknownMetric { .. })
        ));
    }

    #[test]
    fn test_metric_parse_name_roundtrip() {
        for metric in [
            DistanceMetric::Cosine,
            DistanceMetric::Euclidean,
            DistanceMetric::DotProduct,
        ] {
            assert_eq!(DistanceMetric::parse(metric.name()).unwrap(), metric);
        }
    }
}
