use parallax_core::{RelationshipRecord, RelationshipStatistics};

/// Confidence floor used when a caller does not pick one
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;

/// Read-only view of estimated market relationships
///
/// This is the narrow interface hedge sizing and arbitrage detection depend
/// on. They never see price series or the estimator itself.
pub trait RelationshipQuery: Send + Sync {
    /// Latest record for `primary` regressed on `hedge`, if one exists
    fn query_relationship(&self, primary: &str, hedge: &str) -> Option<RelationshipRecord>;

    /// Records with `confidence >= min_confidence` and a strong correlation
    fn query_high_confidence(&self, min_confidence: f64) -> Vec<RelationshipRecord>;

    /// Aggregate counts and averages
    fn statistics(&self) -> RelationshipStatistics;

    /// Hedge ratio for a pair, if a record exists
    fn hedge_ratio(&self, primary: &str, hedge: &str) -> Option<f64> {
        self.query_relationship(primary, hedge)
            .map(|record| record.hedge_ratio)
    }
}
