pub fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

pub fn norm(v: &[f32]) -> f32 { dot(v, v).sqrt() }

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (na, nb) = (norm(a), norm(b));
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot(a, b) / (na * nb) }
}

/// `1 - cos(a, b)` with both norms precomputed. Zero vectors are orthogonal to everything.
pub fn cosine_distance_with_norms(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 { return 1.0; }
    1.0 - dot(a, b) / (a_norm * b_norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_is_magnitude_insensitive() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 4.0, 6.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_distance_with_norms(&a, norm(&a), &b, norm(&b)).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        let d = cosine_distance_with_norms(&[1.0, 0.0], 1.0, &[-1.0, 0.0], 1.0);
        assert!((d - 2.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_has_unit_distance() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_distance_with_norms(&[0.0, 0.0], 0.0, &[1.0, 1.0], 2f32.sqrt()), 1.0);
    }
}
