//! Parallax Ports
//!
//! Port definitions (traits) for the Parallax relationship engine.
//! These define the boundaries between the estimation engine and the
//! collaborators that feed it time or consume its hedge ratios.

mod clock;
mod error;
mod query;

pub use clock::Clock;
pub use error::{EstimationError, EstimationResult};
pub use query::{DEFAULT_MIN_CONFIDENCE, RelationshipQuery};
