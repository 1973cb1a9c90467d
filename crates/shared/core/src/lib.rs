//! Parallax Core Domain
//!
//! Pure domain types for the Parallax cross-market relationship engine.
//! This crate contains no async, no I/O, no locking, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{PairKey, PricePoint, RelationshipRecord, RelationshipStatistics};
pub use values::{MarketId, Timestamp};
