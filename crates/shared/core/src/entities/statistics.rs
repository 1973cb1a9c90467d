use serde::{Deserialize, Serialize};

/// Aggregate view over the relationship registry, for observability
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelationshipStatistics {
    /// Markets with at least one stored price
    pub total_markets: usize,
    /// Directional relationship records currently stored
    pub total_relationships: usize,
    /// Records passing the default high-confidence gates
    pub high_confidence_count: usize,
    /// Mean signed correlation across records (0 when empty)
    pub avg_correlation: f64,
    /// Mean confidence across records (0 when empty)
    pub avg_confidence: f64,
}
