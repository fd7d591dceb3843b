use crate::chroma::ChromaVector;

/// Variance products below this are treated as zero.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Pearson correlation coefficient between two 12-element arrays.
///
/// Returns `None` when either side has (near) zero variance, where the
/// coefficient is undefined. Callers drop those candidates before ranking.
pub fn pearson(x: &ChromaVector, y: &ChromaVector) -> Option<f64> {
    let x_mean: f64 = x.iter().sum::<f64>() / 12.0;
    let y_mean: f64 = y.iter().sum::<f64>() / 12.0;

    let mut num = 0.0;
    let mut x_sq = 0.0;
    let mut y_sq = 0.0;

    for i in 0..12 {
        let xd = x[i] - x_mean;
        let yd = y[i] - y_mean;
        num += xd * yd;
        x_sq += xd * xd;
        y_sq += yd * yd;
    }

    let denom = (x_sq * y_sq).sqrt();
    if !denom.is_finite() || denom < DEGENERATE_EPSILON {
        return None;
    }
    let r = num / denom;
    r.is_finite().then_some(r)
}

/// Scale to unit sum. `None` when the sum is not positive.
pub fn normalize_sum(v: &ChromaVector) -> Option<ChromaVector> {
    let total: f64 = v.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return None;
    }
    let mut out = *v;
    for x in &mut out {
        *x /= total;
    }
    Some(out)
}
