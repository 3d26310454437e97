//! Vector helpers for cosine-similarity search.
//!
//! Providers hand out unit vectors, which keeps cosine similarity down to a
//! single dot product at query time.

/// L2 norm of a vector
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Normalize vector to unit length
pub fn normalize(v: Vec<f32>) -> Vec<f32> {
    let n = l2_norm(&v);
    if n > 0.0 {
        v.into_iter().map(|x| x / n).collect()
    } else {
        v
    }
}

/// Cosine similarity of two unit vectors (their dot product).
///
/// Callers are expected to pass vectors of equal dimension from the same
/// provider; a mismatch is truncated by `zip` rather than panicking, which
/// only ever under-reports similarity.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must share a dimension");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
