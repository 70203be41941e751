use crate::errors::{SiraError, SiraResult};

/// Cosine similarity of two equal-length vectors.
///
/// Each vector is scaled by its largest absolute component first, so very
/// small or very large finite values neither underflow nor overflow. An
/// all-zero vector on either side scores 0.0 so that no NaN ever reaches the
/// ranking sort.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> SiraResult<f64> {
    if a.len() != b.len() {
        return Err(SiraError::dimension_mismatch(a.len(), b.len()));
    }

    let scale_a = max_abs(a);
    let scale_b = max_abs(b);
    if scale_a == 0.0 || scale_b == 0.0 {
        return Ok(0.0);
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (x / scale_a, y / scale_b);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    // both norms are >= 1 after scaling
    let score = dot / (norm_a * norm_b).sqrt();
    if !score.is_finite() {
        return Ok(0.0);
    }
    Ok(score.clamp(-1.0, 1.0))
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}
