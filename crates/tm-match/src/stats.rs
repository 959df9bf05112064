//! Small descriptive statistics over `f64` slices.

/// Arithmetic mean. `None` for an empty slice.
///
/// # Example
/// ```
/// use tm_match::stats::mean;
/// assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
/// assert_eq!(mean(&[]), None);
/// ```
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Median; mean of the two middle values for an even count.
///
/// # Example
/// ```
/// use tm_match::stats::median;
/// assert_eq!(median(&[118.0, 120.0, 119.5]), Some(119.5));
/// assert_eq!(median(&[1.0, 4.0, 2.0, 3.0]), Some(2.5));
/// ```
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Population standard deviation (divides by `n`).
///
/// Exactly `0.0` when every value is identical, even when the rounded mean
/// is not.
///
/// # Example
/// ```
/// use tm_match::stats::pstdev;
/// assert_eq!(pstdev(&[120.1, 120.1, 120.1]), Some(0.0));
/// assert_eq!(pstdev(&[100.0, 110.0]), Some(5.0));
/// ```
#[must_use]
#[allow(clippy::float_cmp)]
pub fn pstdev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if values.iter().all(|&v| v == values[0]) {
        return Some(0.0);
    }
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// First differences: `out[i] = values[i + 1] - values[i]`.
#[must_use]
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}
