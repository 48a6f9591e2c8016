//! Vector similarity helpers

/// Cosine of the angle between two vectors.
///
/// Mismatched or empty inputs and zero-magnitude vectors score 0.0. A NaN
/// component propagates into a NaN score.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, sq_a, sq_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, sq_a, sq_b), (x, y)| {
            (dot + x * y, sq_a + x * x, sq_b + y * y)
        });

    if sq_a == 0.0 || sq_b == 0.0 {
        return 0.0;
    }

    dot / (sq_a.sqrt() * sq_b.sqrt())
}
