//! Cosine similarity between embedding vectors.

/// Score given to vector pairs that cannot be compared (empty, different
/// lengths, zero norm).
///
/// This shares its value with a genuine cosine of -1.0. Ranking goes
/// through [`try_similarity`] so an exactly opposite pair still outranks an
/// incomparable one.
pub const INCOMPARABLE: f32 = -1.0;

/// Cosine similarity in [-1, 1], or `None` when the vectors cannot be
/// compared.
pub fn try_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !score.is_finite() {
        return None;
    }

    Some(score.clamp(-1.0, 1.0) as f32)
}

/// Cosine similarity, with [`INCOMPARABLE`] for pairs that cannot be
/// compared.
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    try_similarity(a, b).unwrap_or(INCOMPARABLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-6
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert!(approx_eq(similarity(&v, &v), 1.0));

        let tiny = vec![1e-20, -3e-20];
        assert!(approx_eq(similarity(&tiny, &tiny), 1.0));
    }

    #[test]
    fn orthogonal_and_opposite_vectors() {
        assert!(approx_eq(similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
        assert!(approx_eq(similarity(&[1.0, 2.0], &[-1.0, -2.0]), -1.0));
    }

    #[test]
    fn incomparable_pairs_get_the_sentinel() {
        assert_eq!(similarity(&[], &[1.0, 2.0]), INCOMPARABLE);
        assert_eq!(similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), INCOMPARABLE);
        assert_eq!(similarity(&[0.0, 0.0], &[1.0, 2.0]), INCOMPARABLE);
        assert_eq!(similarity(&[], &[]), INCOMPARABLE);
        assert_eq!(similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), INCOMPARABLE);
    }

    #[test]
    fn try_similarity_separates_incomparable_from_opposite() {
        assert_eq!(try_similarity(&[1.0], &[1.0, 0.0]), None);
        assert!(try_similarity(&[1.0], &[-1.0]).is_some());
    }

    #[test]
    fn symmetric_and_bounded() {
        let vectors: Vec<Vec<f32>> = vec![
            vec![0.3, -0.7, 2.5],
            vec![-4.0, 0.1, 0.0],
            vec![1e6, 1e-6, -3.0],
            vec![0.0, 0.0, 0.0],
            vec![1.0, 1.0],
        ];

        for a in &vectors {
            for b in &vectors {
                let ab = similarity(a, b);
                let ba = similarity(b, a);
                assert_eq!(ab, ba);
                assert!((-1.0..=1.0).contains(&ab));
            }
        }
    }
}
