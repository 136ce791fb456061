//! Distance functions for vector similarity.
//!
//! Three metrics are supported, all computed with double-precision
//! accumulators regardless of the f32 payload:
//!
//! - **Euclidean (L2)**: straight-line distance
//! - **Cosine**: angle-based, good for normalized embeddings
//! - **Inner Product**: negated dot product, for maximum inner product search
//!
//! Every metric returns a value where **lower means more similar**, so graph
//! indexes can order candidates uniformly. The raw (un-negated) dot product
//! is available as [`inner_product`].

use serde::{Deserialize, Serialize};

/// Distance function selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    /// Euclidean (L2) distance: `sqrt(sum((a[i] - b[i])^2))`.
    Euclidean,
    /// Cosine distance: `1 - (a . b) / (|a| * |b|)`; `1.0` when either
    /// magnitude is zero.
    Cosine,
    /// Negated inner product: `-(a . b)`. The negation makes the dot product
    /// a monotone distance, keeping the smaller-is-closer contract that
    /// every index in the workspace assumes.
    InnerProduct,
}

impl Distance {
    /// Compute the distance between two payloads of equal dimension.
    ///
    /// Lower = more similar for every variant. Callers guarantee equal
    /// dimensions; the store and facade reject mismatches before any
    /// distance is taken.
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            Self::Euclidean => euclidean_distance(a, b),
            Self::Cosine => cosine_distance(a, b),
            Self::InnerProduct => -inner_product(a, b),
        }
    }
}

/// Compute the Euclidean (L2) distance between two vectors.
///
/// # Example
///
/// ```
/// use kombu_vector::euclidean_distance;
///
/// let a = [0.0, 0.0];
/// let b = [3.0, 4.0];
/// assert!((euclidean_distance(&a, &b) - 5.0).abs() < 1e-9);
/// ```
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

    let mut sum = 0.0f64;
    for i in 0..a.len() {
        let d = f64::from(a[i]) - f64::from(b[i]);
        sum += d * d;
    }
    sum.sqrt()
}

/// Compute the cosine distance between two vectors.
///
/// Returns a value in `[0, 2]`: 0 for identical direction, 1 for orthogonal,
/// 2 for opposite. A zero vector on either side yields `1.0` (maximum
/// dissimilarity short of opposition, and the only well-defined answer).
///
/// # Example
///
/// ```
/// use kombu_vector::cosine_distance;
///
/// assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]) < 1e-9);
/// assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-9);
/// ```
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for i in 0..a.len() {
        let av = f64::from(a[i]);
        let bv = f64::from(b[i]);
        dot += av * bv;
        norm_a += av * av;
        norm_b += bv * bv;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}

/// Compute the raw inner (dot) product of two vectors.
///
/// Higher values indicate more similarity; negate for use as a distance.
#[inline]
pub fn inner_product(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

    let mut dot = 0.0f64;
    for i in 0..a.len() {
        dot += f64::from(a[i]) * f64::from(b[i]);
    }
    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = [0.0, 0.0, 0.0];
        let b = [3.0, 4.0, 0.0];
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 1e-9);

        let c = [1.0, 2.0, 3.0];
        assert!(euclidean_distance(&c, &c) < 1e-9);
    }

    #[test]
    fn test_cosine_distance() {
        let a = [1.0, 2.0, 3.0];
        assert!(cosine_distance(&a, &a) < 1e-9);

        // Orthogonal
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-9);
        // Opposite
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert!((cosine_distance(&[0.0, 0.0], &[1.0, 2.0]) - 1.0).abs() < 1e-9);
        assert!((cosine_distance(&[0.0, 0.0], &[0.0, 0.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inner_product() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        assert!((inner_product(&a, &b) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_inner_product_is_negated_as_distance() {
        let a = [1.0, 1.0];
        let near = [2.0, 2.0]; // dot = 4
        let far = [0.1, 0.1]; // dot = 0.2
        let d_near = Distance::InnerProduct.distance(&a, &near);
        let d_far = Distance::InnerProduct.distance(&a, &far);
        assert!(d_near < d_far, "larger dot product must rank closer");
    }

    #[test]
    fn test_distance_enum_dispatch() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];

        let d = Distance::Euclidean.distance(&a, &b);
        assert!((d - std::f64::consts::SQRT_2).abs() < 1e-9);

        let d = Distance::Cosine.distance(&a, &b);
        assert!((d - 1.0).abs() < 1e-9);

        let d = Distance::InnerProduct.distance(&a, &b);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_high_dimensional() {
        let a: Vec<f32> = (0..128).map(|i| i as f32).collect();
        let b: Vec<f32> = (0..128).map(|i| (i + 1) as f32).collect();
        let d = euclidean_distance(&a, &b);
        assert!((d - (128.0f64).sqrt()).abs() < 1e-6);
    }
}
