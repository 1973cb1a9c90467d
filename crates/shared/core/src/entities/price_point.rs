use serde::{Deserialize, Serialize};

use crate::values::Timestamp;

/// A single observed price for one market
///
/// Points are kept in arrival order. The timestamp is informational only:
/// ordering and decay weighting both follow arrival position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub timestamp: Timestamp,
}

impl PricePoint {
    pub fn new(price: f64, timestamp: Timestamp) -> Self {
        Self { price, timestamp }
    }

    /// Only finite prices may enter a series
    pub fn is_valid(&self) -> bool {
        self.price.is_finite()
    }
}
