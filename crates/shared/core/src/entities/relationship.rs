use serde::{Deserialize, Serialize};

use crate::values::{MarketId, Timestamp};

/// Directional key of a relationship: `primary` regressed on `hedge`
///
/// `(A, B)` and `(B, A)` are distinct keys with independently computed
/// records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub primary: MarketId,
    pub hedge: MarketId,
}

impl PairKey {
    pub fn new(primary: impl Into<MarketId>, hedge: impl Into<MarketId>) -> Self {
        Self {
            primary: primary.into(),
            hedge: hedge.into(),
        }
    }

    /// Whether either leg of the pair is `market`
    pub fn involves(&self, market: &str) -> bool {
        self.primary.as_str() == market || self.hedge.as_str() == market
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.primary, self.hedge)
    }
}

/// Estimated relationship between two markets
///
/// Overwritten wholesale on every recompute. Holds the following invariants:
/// - `hedge_ratio * variance_of_hedge == covariance` (ratio is 0 when the
///   hedge variance is non-positive)
/// - `correlation` in `[-1, 1]`
/// - `confidence` in `[0, 0.99]`
/// - `residual_std_dev >= 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Market being hedged
    pub primary: MarketId,
    /// Market used as the hedge leg
    pub hedge: MarketId,
    /// Decay-weighted covariance of price deltas
    pub covariance: f64,
    /// Decay-weighted correlation of price deltas
    pub correlation: f64,
    /// Units of hedge per unit of primary (beta)
    pub hedge_ratio: f64,
    /// Population std dev of `primary - hedge_ratio * hedge` over the window
    pub residual_std_dev: f64,
    /// Fisher-z interval tightness, 0.0 - 0.99
    pub confidence: f64,
    /// Decay half-life used for this estimate
    pub half_life_ms: f64,
    /// Number of aligned price observations behind the estimate
    pub sample_count: usize,
    pub last_updated: Timestamp,
}

impl RelationshipRecord {
    pub fn key(&self) -> PairKey {
        PairKey {
            primary: self.primary.clone(),
            hedge: self.hedge.clone(),
        }
    }

    /// Both gates must pass: confidence AND absolute correlation
    pub fn is_high_confidence(&self, min_confidence: f64, min_abs_correlation: f64) -> bool {
        self.confidence >= min_confidence && self.correlation.abs() >= min_abs_correlation
    }

    /// Hedge-leg quantity that offsets `primary_quantity` units of the primary
    pub fn hedge_quantity(&self, primary_quantity: f64) -> f64 {
        primary_quantity * self.hedge_ratio
    }
}
