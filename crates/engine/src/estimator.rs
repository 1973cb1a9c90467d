//! Exponentially Weighted Covariance Estimator
//!
//! Pure, deterministic computation over two aligned price windows.
//!
//! # Model
//!
//! ```text
//! Δp_i = p_i - p_{i-1}          Δh_i = h_i - h_{i-1}
//! w_i  = λ^(N-i),  λ = exp(-ln2 / half_life)
//!
//! cov   = Σ w_i Δp_i Δh_i / Σ w_i
//! var_p = Σ w_i Δp_i²    / Σ w_i
//! var_h = Σ w_i Δh_i²    / Σ w_i
//!
//! β     = cov / var_h
//! ρ     = cov / sqrt(var_p · var_h)
//! ```
//!
//! Moments are taken about zero: price increments are treated as zero-mean,
//! so two series moving in lockstep with a constant drift are perfectly
//! correlated rather than degenerate.
//!
//! Weights decay by buffer position, not by elapsed time between ticks.

use parallax_ports::{EstimationError, EstimationResult};
use serde::{Deserialize, Serialize};

/// Upper bound on reported confidence
pub const MAX_CONFIDENCE: f64 = 0.99;

/// Two-sided 95% normal quantile
const Z_95: f64 = 1.96;

/// Output of one estimator run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairEstimate {
    pub covariance: f64,
    pub variance_primary: f64,
    pub variance_hedge: f64,
    pub hedge_ratio: f64,
    pub correlation: f64,
    pub residual_std_dev: f64,
    pub confidence: f64,
    pub sample_count: usize,
}

impl PairEstimate {
    /// Estimate used when the weighted moments are not finite
    fn degenerate(sample_count: usize) -> Self {
        Self {
            covariance: 0.0,
            variance_primary: 0.0,
            variance_hedge: 0.0,
            hedge_ratio: 0.0,
            correlation: 0.0,
            residual_std_dev: 0.0,
            confidence: 0.0,
            sample_count,
        }
    }
}

/// Decay-weighted covariance estimator for one half-life setting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EwCovarianceEstimator {
    min_samples: usize,
    /// Per-position decay factor `exp(-ln2 / half_life)`
    lambda: f64,
}

impl EwCovarianceEstimator {
    /// Create an estimator
    ///
    /// `min_samples` below 2 is raised to 2, the least that yields a delta.
    pub fn new(half_life_ms: f64, min_samples: usize) -> Self {
        Self {
            min_samples: min_samples.max(2),
            lambda: (-std::f64::consts::LN_2 / half_life_ms).exp(),
        }
    }

    /// Estimate `primary` regressed on `hedge`
    ///
    /// Both slices must be the same length and at least `min_samples` long.
    pub fn estimate(&self, primary: &[f64], hedge: &[f64]) -> EstimationResult<PairEstimate> {
        if primary.len() != hedge.len() {
            return Err(EstimationError::InputMismatch {
                primary_len: primary.len(),
                hedge_len: hedge.len(),
            });
        }

        let n = primary.len();
        if n < self.min_samples {
            return Err(EstimationError::InsufficientData {
                required: self.min_samples,
                actual: n,
            });
        }

        // Walk newest to oldest so the newest delta carries weight 1
        let mut weight = 1.0;
        let mut sum_w = 0.0;
        let mut sum_ph = 0.0;
        let mut sum_pp = 0.0;
        let mut sum_hh = 0.0;
        for i in (1..n).rev() {
            let dp = primary[i] - primary[i - 1];
            let dh = hedge[i] - hedge[i - 1];
            sum_w += weight;
            sum_ph += weight * dp * dh;
            sum_pp += weight * dp * dp;
            sum_hh += weight * dh * dh;
            weight *= self.lambda;
        }

        let covariance = sum_ph / sum_w;
        let variance_primary = sum_pp / sum_w;
        let variance_hedge = sum_hh / sum_w;

        if !(covariance.is_finite() && variance_primary.is_finite() && variance_hedge.is_finite())
        {
            return Ok(PairEstimate::degenerate(n));
        }

        let hedge_ratio = if variance_hedge > 0.0 {
            covariance / variance_hedge
        } else {
            0.0
        };

        let correlation = if variance_primary > 0.0 && variance_hedge > 0.0 {
            (covariance / (variance_primary.sqrt() * variance_hedge.sqrt())).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let residual_std_dev = residual_std_dev(primary, hedge, hedge_ratio);

        Ok(PairEstimate {
            covariance,
            variance_primary,
            variance_hedge,
            hedge_ratio,
            correlation,
            residual_std_dev,
            confidence: fisher_confidence(correlation, n),
            sample_count: n,
        })
    }
}

/// Population std dev of `primary - ratio * hedge` over the raw prices
fn residual_std_dev(primary: &[f64], hedge: &[f64], ratio: f64) -> f64 {
    let n = primary.len() as f64;
    let residual = |i: usize| primary[i] - ratio * hedge[i];

    let mean = (0..primary.len()).map(residual).sum::<f64>() / n;
    let variance = (0..primary.len())
        .map(|i| {
            let d = residual(i) - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    let std_dev = variance.max(0.0).sqrt();
    if std_dev.is_finite() { std_dev } else { 0.0 }
}

/// Confidence in a correlation estimate from the width of its Fisher-z
/// 95% interval
///
/// `1 - half-width` of the interval mapped back to correlation space,
/// clamped to `[0, 0.99]`. Perfect correlation short-circuits to the cap;
/// fewer than four samples have no defined standard error and score 0.
pub fn fisher_confidence(correlation: f64, sample_count: usize) -> f64 {
    let r = correlation.abs();
    if r.is_nan() {
        return 0.0;
    }
    if r >= 1.0 {
        return MAX_CONFIDENCE;
    }
    if sample_count < 4 {
        return 0.0;
    }

    let z = r.atanh();
    let se = 1.0 / ((sample_count - 3) as f64).sqrt();
    let r_lower = (z - Z_95 * se).tanh();
    let r_upper = (z + Z_95 * se).tanh();

    (1.0 - (r_upper - r_lower) / 2.0).clamp(0.0, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_weight_halves_over_half_life() {
        let estimator = EwCovarianceEstimator::new(10.0, 0);
        assert_relative_eq!(estimator.lambda.powi(10), 0.5, epsilon = 1e-12);
        assert_eq!(estimator.min_samples, 2);
    }

    #[test]
    fn test_perfectly_linear_pair() {
        let estimator = EwCovarianceEstimator::new(300_000.0, 50);
        let prices = linear(60);

        let estimate = estimator.estimate(&prices, &prices).unwrap();

        assert_relative_eq!(estimate.correlation, 1.0, epsilon = 1e-12);
        assert_relative_eq!(estimate.hedge_ratio, 1.0, epsilon = 1e-12);
        assert_relative_eq!(estimate.confidence, 0.99, epsilon = 1e-12);
        assert_relative_eq!(estimate.residual_std_dev, 0.0, epsilon = 1e-9);
        assert_eq!(estimate.sample_count, 60);
    }

    #[test]
    fn test_scaled_hedge_leg() {
        // Hedge moves twice as much as primary: beta = 0.5
        let estimator = EwCovarianceEstimator::new(1_000.0, 10);
        let primary: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let hedge: Vec<f64> = primary.iter().map(|p| 2.0 * p + 5.0).collect();

        let estimate = estimator.estimate(&primary, &hedge).unwrap();

        assert_relative_eq!(estimate.hedge_ratio, 0.5, epsilon = 1e-12);
        assert_relative_eq!(estimate.correlation, 1.0, epsilon = 1e-12);
        // primary - 0.5 * hedge = -2.5 everywhere
        assert_relative_eq!(estimate.residual_std_dev, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_opposite_moves_are_negatively_correlated() {
        let estimator = EwCovarianceEstimator::new(1_000.0, 10);
        let primary: Vec<f64> = (0..30).map(|i| 50.0 + (i as f64 * 1.3).cos()).collect();
        let hedge: Vec<f64> = primary.iter().map(|p| 100.0 - p).collect();

        let estimate = estimator.estimate(&primary, &hedge).unwrap();

        assert_relative_eq!(estimate.correlation, -1.0, epsilon = 1e-12);
        assert_relative_eq!(estimate.hedge_ratio, -1.0, epsilon = 1e-12);
        assert_eq!(estimate.confidence, MAX_CONFIDENCE);
    }

    #[test]
    fn test_constant_hedge_is_degenerate_not_error() {
        let estimator = EwCovarianceEstimator::new(300_000.0, 50);
        let primary = linear(60);
        let hedge = vec![42.0; 60];

        let estimate = estimator.estimate(&primary, &hedge).unwrap();

        assert_eq!(estimate.variance_hedge, 0.0);
        assert_eq!(estimate.covariance, 0.0);
        assert_eq!(estimate.hedge_ratio, 0.0);
        assert_eq!(estimate.correlation, 0.0);
        // Zero correlation still has a finite-width interval
        assert_eq!(estimate.confidence, fisher_confidence(0.0, 60));
        assert!(estimate.residual_std_dev > 0.0);
    }

    #[test]
    fn test_both_constant() {
        let estimator = EwCovarianceEstimator::new(300_000.0, 2);
        let estimate = estimator.estimate(&[5.0; 10], &[7.0; 10]).unwrap();

        assert_eq!(estimate.hedge_ratio, 0.0);
        assert_eq!(estimate.correlation, 0.0);
        assert_eq!(estimate.confidence, fisher_confidence(0.0, 10));
        assert_eq!(estimate.residual_std_dev, 0.0);
    }

    #[test]
    fn test_structural_errors() {
        let estimator = EwCovarianceEstimator::new(300_000.0, 50);

        let err = estimator.estimate(&linear(60), &linear(59)).unwrap_err();
        assert_eq!(
            err,
            EstimationError::InputMismatch {
                primary_len: 60,
                hedge_len: 59
            }
        );

        let err = estimator.estimate(&linear(49), &linear(49)).unwrap_err();
        assert_eq!(
            err,
            EstimationError::InsufficientData {
                required: 50,
                actual: 49
            }
        );

        let err = estimator.estimate(&[], &[]).unwrap_err();
        assert!(matches!(err, EstimationError::InsufficientData { .. }));
    }

    #[test]
    fn test_recent_deltas_dominate_with_short_half_life() {
        // First half: hedge moves with primary. Second half: against it.
        let mut primary = vec![100.0];
        let mut hedge = vec![100.0];
        for i in 1..60 {
            let step = if i % 2 == 0 { 1.0 } else { -1.0 };
            primary.push(primary[i - 1] + step);
            let hedge_step = if i < 30 { step } else { -step };
            hedge.push(hedge[i - 1] + hedge_step);
        }

        let fast = EwCovarianceEstimator::new(2.0, 10)
            .estimate(&primary, &hedge)
            .unwrap();
        let slow = EwCovarianceEstimator::new(1e9, 10)
            .estimate(&primary, &hedge)
            .unwrap();

        assert!(fast.correlation < -0.99);
        // Nearly uniform weights: 29 agreeing deltas vs 30 opposing ones
        assert!(slow.correlation.abs() < 0.05);
    }

    #[test]
    fn test_fisher_confidence_edges() {
        assert_eq!(fisher_confidence(1.0, 2), MAX_CONFIDENCE);
        assert_eq!(fisher_confidence(-1.0, 100), MAX_CONFIDENCE);
        assert_eq!(fisher_confidence(0.8, 3), 0.0);
        assert_eq!(fisher_confidence(f64::NAN, 100), 0.0);

        // Zero correlation: interval is symmetric around 0
        let zero = fisher_confidence(0.0, 50);
        let expected = 1.0 - (Z_95 / 47f64.sqrt()).tanh();
        assert_relative_eq!(zero, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_fisher_confidence_grows_with_samples_and_strength() {
        assert!(fisher_confidence(0.8, 500) > fisher_confidence(0.8, 50));
        assert!(fisher_confidence(0.95, 50) > fisher_confidence(0.5, 50));

        // Moderate correlation over a window of 50 still scores ~0.79
        let moderate = fisher_confidence(0.5, 50);
        assert!(moderate > 0.78 && moderate < 0.80);
    }
}
