//! Mathematical utility functions.

/// Safe log: returns -infinity for x <= 0.
pub fn safe_log(x: f64) -> f64 {
    if x > 0.0 {
        x.ln()
    } else {
        f64::NEG_INFINITY
    }
}

/// Clip to the unit interval. NaN stays NaN.
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Indices that sort `values` ascending. Ties keep input order.
pub fn argsort_ascending(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    idx
}

/// Central-difference gradient of `f` at `x` with step `h`.
pub fn central_gradient<F>(f: F, x: &[f64], h: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut shifted = x.to_vec();
    (0..x.len())
        .map(|j| {
            shifted[j] = x[j] + h;
            let up = f(&shifted);
            shifted[j] = x[j] - h;
            let down = f(&shifted);
            shifted[j] = x[j];
            (up - down) / (2.0 * h)
        })
        .collect()
}
