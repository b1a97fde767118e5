//! Least-squares fitting and correlation
//!
//! Pearson correlation with a two-tailed p-value from Student's t-distribution
//! (statrs), plus the ordinary least-squares line used by the trend engine.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Minimum pairs for a significance estimate
const MIN_CORRELATION_SAMPLES: usize = 30;

/// Best-fit line y = slope * x + intercept
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination (0 when y is constant)
    pub r_squared: f64,
}

/// Pearson correlation with its significance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub r: f64,
    pub p_value: f64,
    pub sample_count: usize,
}

/// Ordinary least squares through (x, y) pairs.
///
/// `None` when fewer than two pairs or all x are identical.
#[allow(clippy::cast_precision_loss)]
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }
    let nf = n as f64;
    let mean_x = xs.iter().sum::<f64>() / nf;
    let mean_y = ys.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx < f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy < f64::EPSILON {
        0.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };

    Some(LinearFit { slope, intercept, r_squared })
}

/// Pearson correlation coefficient.
///
/// Formula: r = Σ[(xi - x̄)(yi - ȳ)] / sqrt(Σ(xi - x̄)² × Σ(yi - ȳ)²)
#[allow(clippy::cast_precision_loss)]
pub fn correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }
    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|a| a * a).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x.powi(2)) * (n * sum_y2 - sum_y.powi(2))).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        None
    } else {
        Some((numerator / denominator).clamp(-1.0, 1.0))
    }
}

/// Pearson r together with its two-tailed p-value.
///
/// Requires at least 30 pairs.
pub fn correlation_significance(x: &[f64], y: &[f64]) -> Option<Correlation> {
    if x.len() < MIN_CORRELATION_SAMPLES {
        return None;
    }
    let r = correlation(x, y)?;
    Some(Correlation {
        r,
        p_value: p_value_for_r(r, x.len()),
        sample_count: x.len(),
    })
}

/// t = r × sqrt(n-2) / sqrt(1-r²), two-tailed against t(n-2)
#[allow(clippy::cast_precision_loss)]
fn p_value_for_r(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    if r.abs() >= 0.9999 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => 2.0 * (1.0 - t_dist.cdf(t_stat.abs())),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_recovers_line() {
        let xs: Vec<f64> = (0..50).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x - 7.0).collect();
        let fit = linear_regression(&xs, &ys).expect("fit");
        assert!((fit.slope - 3.0).abs() < 1e-9);
        assert!((fit.intercept + 7.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_regression_degenerate_inputs() {
        assert!(linear_regression(&[1.0], &[1.0]).is_none());
        assert!(linear_regression(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_none());
        let flat = linear_regression(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).expect("fit");
        assert_eq!(flat.slope, 0.0);
        assert_eq!(flat.r_squared, 0.0);
    }

    #[test]
    fn test_perfect_negative_correlation() {
        let x: Vec<f64> = (0..100).map(f64::from).collect();
        let y: Vec<f64> = (0..100).map(|i| 100.0 - f64::from(i)).collect();
        let c = correlation_significance(&x, &y).expect("correlation");
        assert!((c.r + 1.0).abs() < 1e-9);
        assert!(c.p_value < 0.05);
    }

    #[test]
    fn test_p_value_reference_points() {
        let p = p_value_for_r(0.5, 30);
        assert!(p > 0.001 && p < 0.01, "r=0.5, n=30 should give p≈0.005, got {p}");
        assert!(p_value_for_r(0.2, 30) > 0.2);
    }

    #[test]
    fn test_constant_series_has_no_correlation() {
        let x: Vec<f64> = (0..40).map(f64::from).collect();
        let y = vec![1.0; 40];
        assert!(correlation(&x, &y).is_none());
        assert!(correlation_significance(&x[..10], &x[..10]).is_none());
    }
}
