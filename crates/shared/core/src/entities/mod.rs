mod price_point;
mod relationship;
mod statistics;

pub use price_point::PricePoint;
pub use relationship::{PairKey, RelationshipRecord};
pub use statistics::RelationshipStatistics;
