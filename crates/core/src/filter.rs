//! Metadata filtering for vector search
//!
//! Supports only top-level field equality on scalar values. The query
//! layer builds a `MetadataFilter` from the non-vector conditions of a
//! query and hands the index a predicate derived from it; the index
//! itself never interprets metadata.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// JSON scalar value usable in equality filters
///
/// Complex types (arrays, objects) are not supported as filter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JsonScalar {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (stored as f64)
    Number(f64),
    /// String value
    String(String),
}

impl JsonScalar {
    /// Check if this scalar matches a JSON value
    pub fn matches_json(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (JsonScalar::Null, serde_json::Value::Null) => true,
            (JsonScalar::Bool(a), serde_json::Value::Bool(b)) => a == b,
            (JsonScalar::Number(a), serde_json::Value::Number(b)) => {
                b.as_f64().is_some_and(|n| (a - n).abs() < f64::EPSILON)
            }
            (JsonScalar::String(a), serde_json::Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for JsonScalar {
    fn from(v: bool) -> Self {
        JsonScalar::Bool(v)
    }
}

impl From<i32> for JsonScalar {
    fn from(v: i32) -> Self {
        JsonScalar::Number(v as f64)
    }
}

impl From<i64> for JsonScalar {
    fn from(v: i64) -> Self {
        JsonScalar::Number(v as f64)
    }
}

impl From<f64> for JsonScalar {
    fn from(v: f64) -> Self {
        JsonScalar::Number(v)
    }
}

impl From<&str> for JsonScalar {
    fn from(v: &str) -> Self {
        JsonScalar::String(v.to_string())
    }
}

impl From<String> for JsonScalar {
    fn from(v: String) -> Self {
        JsonScalar::String(v)
    }
}

/// Equality-only metadata filter (AND semantics across conditions)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Top-level field equality (scalar values only)
    pub equals: HashMap<String, JsonScalar>,
}

impl MetadataFilter {
    /// Create an empty filter (matches all)
    pub fn new() -> Self {
        MetadataFilter {
            equals: HashMap::new(),
        }
    }

    /// Add an equality condition
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonScalar>) -> Self {
        self.equals.insert(field.into(), value.into());
        self
    }

    /// Check if metadata matches this filter
    ///
    /// Returns false if metadata is None and the filter is non-empty.
    pub fn matches(&self, metadata: &Option<serde_json::Value>) -> bool {
        if self.equals.is_empty() {
            return true;
        }

        let Some(meta) = metadata else {
            return false;
        };

        let Some(obj) = meta.as_object() else {
            return false;
        };

        self.equals.iter().all(|(key, expected)| {
            obj.get(key)
                .is_some_and(|actual| expected.matches_json(actual))
        })
    }

    /// Check if the filter is empty (matches all)
    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = MetadataFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&None));
        assert!(filter.matches(&Some(json!({"any": "value"}))));
    }

    #[test]
    fn test_filter_matches_exact() {
        let filter = MetadataFilter::new().eq("category", "document").eq("year", 2024);
        assert!(filter.matches(&Some(json!({
            "category": "document",
            "year": 2024,
            "extra": "ignored"
        }))));
        assert!(!filter.matches(&Some(json!({"category": "image", "year": 2024}))));
    }

    #[test]
    fn test_filter_missing_field() {
        let filter = MetadataFilter::new().eq("category", "document").eq("year", 2024);
        assert!(!filter.matches(&Some(json!({"category": "document"}))));
    }

    #[test]
    fn test_filter_none_metadata() {
        let filter = MetadataFilter::new().eq("category", "document");
        assert!(!filter.matches(&None));
    }

    #[test]
    fn test_filter_non_object_metadata() {
        let filter = MetadataFilter::new().eq("category", "document");
        assert!(!filter.matches(&Some(json!("not an object"))));
        assert!(!filter.matches(&Some(json!([1, 2, 3]))));
    }

    #[test]
    fn test_filter_null_and_bool_values() {
        let filter = MetadataFilter::new().eq("deleted", JsonScalar::Null);
        assert!(filter.matches(&Some(json!({"deleted": null}))));
        assert!(!filter.matches(&Some(json!({"deleted": false}))));

        let filter = MetadataFilter::new().eq("active", true);
        assert!(filter.matches(&Some(json!({"active": true}))));
        assert!(!filter.matches(&Some(json!({"active": 1}))));
    }

    #[test]
    fn test_json_scalar_matches() {
        assert!(JsonScalar::Number(42.0).matches_json(&json!(42)));
        assert!(JsonScalar::String("hi".into()).matches_json(&json!("hi")));
        assert!(!JsonScalar::Number(42.0).matches_json(&json!("42")));
    }
}
