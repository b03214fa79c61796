//! # Distribution Metrics
//!
//! Small statistics helpers for count distributions. The optimizer's
//! objective uses [`spread`] (max minus min, the range); the report adds
//! [`mean`] and [`std_dev`] so a reviewer can judge how balanced the
//! selection actually is.
//!
//! `std_dev` is the population standard deviation (divide by `n`, not
//! `n - 1`): the team list is the whole population, not a sample.

/// Range of a count distribution: `max - min`.
///
/// Returns `None` for an empty slice.
///
/// # Examples
/// ```
/// use aw_core::metrics::spread;
///
/// assert_eq!(spread(&[3, 5, 4]), Some(2));
/// assert_eq!(spread(&[7]), Some(0));
/// assert_eq!(spread(&[]), None);
/// ```
pub fn spread(values: &[u32]) -> Option<u32> {
    let max = values.iter().max()?;
    let min = values.iter().min()?;
    Some(max - min)
}

/// Arithmetic mean. Returns `None` for an empty slice.
pub fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: u64 = values.iter().map(|&v| v as u64).sum();
    Some(sum as f64 / values.len() as f64)
}

/// Population standard deviation. Returns `None` for an empty slice.
pub fn std_dev(values: &[u32]) -> Option<f64> {
    let mu = mean(values)?;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mu;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}
