//! Advantage normalization
//!
//! Advantages are standardized over the whole episode before any minibatch
//! is drawn: `(x - mean) / std`, using the population standard deviation.

use anyhow::{Result, bail};

/// Mean and population standard deviation of `values`
///
/// Accumulates in `f64` so long episodes don't lose precision.
pub fn mean_std(values: &[f32]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&x| x as f64).sum::<f64>() / n;
    let variance = values.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Standardize `values` in place to zero mean and unit standard deviation
///
/// Fails when the standard deviation is zero or not finite (a one-step
/// episode, or one where every advantage is identical). Dividing through
/// would fill the batch with NaN and poison every later update.
pub fn normalize_in_place(values: &mut [f32]) -> Result<()> {
    let (mean, std) = mean_std(values);
    if !(std.is_finite() && std > 0.0) {
        bail!(
            "Cannot normalize {} advantages: standard deviation is {} (mean {})",
            values.len(),
            std,
            mean
        );
    }

    for x in values.iter_mut() {
        *x = ((*x as f64 - mean) / std) as f32;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_std_basic() {
        let (mean, std) = mean_std(&[1.0, 2.0, 3.0]);
        assert!((mean - 2.0).abs() < 1e-12);
        // Population std of [1, 2, 3] is sqrt(2/3)
        assert!((std - (2.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero_mean_unit_std() {
        let mut values = vec![3.0, 2.0, 1.0, 7.5, -4.0];
        normalize_in_place(&mut values).unwrap();

        let (mean, std) = mean_std(&values);
        assert!(mean.abs() < 1e-6, "mean = {}", mean);
        assert!((std - 1.0).abs() < 1e-5, "std = {}", std);
    }

    #[test]
    fn test_normalize_preserves_order() {
        let mut values = vec![3.0, 2.0, 1.0];
        normalize_in_place(&mut values).unwrap();
        assert!(values[0] > values[1] && values[1] > values[2]);
        assert!((values[1]).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_degenerate() {
        let mut single = vec![1.5];
        assert!(normalize_in_place(&mut single).is_err());
        assert_eq!(single, vec![1.5], "Input must be left untouched on error");

        let mut constant = vec![2.0; 4];
        assert!(normalize_in_place(&mut constant).is_err());

        let mut empty: Vec<f32> = vec![];
        assert!(normalize_in_place(&mut empty).is_err());
    }
}
