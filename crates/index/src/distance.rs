//! Distance functions for vector similarity ranking
//!
//! All metrics are oriented "lower = closer" and accumulate in f64 to
//! keep ranking stable for high-dimensional f32 embeddings. Functions
//! are deterministic and side-effect-free; they run on read-only
//! search paths.

use quiver_core::{DistanceMetric, Error, Result};

/// Compute the distance between two equal-length vectors
///
/// No implicit normalization: vectors are used as-is.
pub fn distance(a: &[f32], b: &[f32], metric: DistanceMetric) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(match metric {
        DistanceMetric::Cosine => cosine_distance(a, b),
        DistanceMetric::Euclidean => euclidean_distance(a, b),
        DistanceMetric::DotProduct => -dot_product(a, b),
    })
}

/// Cosine distance: 1 - dot(a,b) / (||a|| * ||b||)
///
/// A zero-norm operand has no direction; the distance degrades to the
/// orthogonal case (1.0) rather than dividing by zero.
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot_product(a, b) / (norm_a * norm_b)
}

/// Euclidean distance (L2 norm of the difference)
fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Inner product, accumulated in f64
fn dot_product(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| *x as f64 * *y as f64)
        .sum()
}

/// L2 norm (Euclidean length)
fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|x| *x as f64 * *x as f64).sum::<f64>().sqrt()
}
