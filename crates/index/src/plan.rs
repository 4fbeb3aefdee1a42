//! Query-boundary validation
//!
//! Vector attributes only answer nearest-neighbor and exact-equality
//! predicates; ordering comparators are rejected before any graph
//! traversal happens. Targets arrive as JSON from the query layer and
//! are checked here for shape and dimension.

use serde_json::Value;

use quiver_core::{Error, Result};

/// Comparison operators the query layer can hand to an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Nearest,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Nearest => "nearest",
        }
    }
}

/// Validate a comparator + JSON target pair against a vector
/// attribute and extract the target vector.
///
/// Ordering comparators have no meaning over vectors and fail with a
/// validation error naming the operator. A JSON `null` target maps to
/// the missing-target error so the caller's message is uniform with
/// the search path.
pub fn parse_vector_target(
    attribute: &str,
    comparator: Comparator,
    value: &Value,
    dimension: usize,
) -> Result<Vec<f32>> {
    match comparator {
        Comparator::Eq | Comparator::Nearest => {}
        other => {
            return Err(Error::ComparatorUnsupported {
                comparator: other.symbol().to_string(),
                attribute: attribute.to_string(),
            })
        }
    }

    let Value::Array(items) = value else {
        if value.is_null() {
            return Err(Error::MissingTargetVector);
        }
        return Err(Error::InvalidTargetType {
            attribute: attribute.to_string(),
            reason: format!("expected a numeric array, got {}", json_kind(value)),
        });
    };

    if items.len() != dimension {
        return Err(Error::DimensionMismatch {
            expected: dimension,
            got: items.len(),
        });
    }

    let mut target = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let Some(component) = item.as_f64() else {
            return Err(Error::InvalidTargetType {
                attribute: attribute.to_string(),
                reason: format!("element {position} is {}, not a number", json_kind(item)),
            });
        };
        target.push(component as f32);
    }
    Ok(target)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
