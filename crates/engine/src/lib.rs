//! Parallax Relationship Engine
//!
//! Estimates how pairs of markets move together so that a position in one
//! can be hedged in another:
//!
//! - **Price Series Store**: bounded per-market price history
//! - **Covariance Estimator**: decay-weighted covariance, hedge ratio,
//!   correlation and Fisher-z confidence for one pair
//! - **Relationship Registry**: re-estimates a market against every other
//!   market on each of its ticks and stores directional records
//! - **Query API**: single pair lookups, the high-confidence set, and
//!   aggregate statistics via [`RelationshipQuery`]
//!
//! ## Architecture
//!
//! ```text
//!  ingest(market, price)
//!          │
//!          ▼
//! ┌──────────────────┐   snapshot(M), snapshot(X)   ┌────────────────────┐
//! │ PriceSeriesStore │ ───────────────────────────► │ EwCovariance-      │
//! │  (ring buffers)  │                              │ Estimator          │
//! └──────────────────┘                              └─────────┬──────────┘
//!                                                             │ PairEstimate
//!                                                             ▼
//!                                                ┌─────────────────────────┐
//!                                                │ RelationshipRegistry    │
//!                                                │ (M -> X) records        │
//!                                                └────────────┬────────────┘
//!                                                             │
//!                                                             ▼
//!                                           RelationshipQuery (hedge sizing,
//!                                                 arbitrage detection)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use parallax_engine::{EngineConfig, RelationshipRegistry};
//!
//! let registry = RelationshipRegistry::new(EngineConfig::default())?;
//! registry.ingest("kalshi:FED-CUT", 0.62, None);
//! registry.ingest("polymarket:FED-CUT", 0.60, None);
//!
//! if let Some(record) = registry.get_relationship("kalshi:FED-CUT", "polymarket:FED-CUT") {
//!     let hedge_size = record.hedge_quantity(100.0);
//! }
//! ```

pub mod config;
pub mod estimator;
pub mod registry;
pub mod series;

// Re-export main types
pub use config::{ConfigError, EngineConfig, PairPolicy};
pub use estimator::{EwCovarianceEstimator, MAX_CONFIDENCE, PairEstimate, fisher_confidence};
pub use registry::{FanOutSummary, RelationshipRegistry};
pub use series::{PriceSeries, PriceSeriesStore};

// Re-export the ports consumers program against
pub use parallax_ports::{DEFAULT_MIN_CONFIDENCE, EstimationError, RelationshipQuery};
