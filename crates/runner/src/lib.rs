//! Parallax Runner - Feed Orchestration
//!
//! Drives market price feeds into a shared relationship registry:
//!
//! - **Price Feeds**: per-market tick sources behind the [`PriceFeed`] trait
//! - **Synthetic Feed**: seeded correlated random walks for backtests
//! - **Feed Runner**: one tokio task per market, all ingesting into one
//!   `Arc<RelationshipRegistry>`
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────┐   ┌──────────┐   ┌──────────┐
//!   │ Feed A   │   │ Feed B   │   │ Feed C   │
//!   └────┬─────┘   └────┬─────┘   └────┬─────┘
//!        │ ticks        │ ticks        │ ticks
//!        ▼              ▼              ▼
//!   ┌──────────┐   ┌──────────┐   ┌──────────┐
//!   │ task A   │   │ task B   │   │ task C   │
//!   └────┬─────┘   └────┬─────┘   └────┬─────┘
//!        └──────────────┼──────────────┘
//!                       ▼ ingest
//!            ┌──────────────────────┐
//!            │ RelationshipRegistry │
//!            └──────────┬───────────┘
//!                       ▼
//!                  RunSummary
//! ```

pub mod error;
pub mod feed;
pub mod service;

// Re-export main types
pub use error::{RunnerError, RunnerResult};
pub use feed::{
    ChannelPriceFeed, PriceFeed, PriceTick, SyntheticFeedConfig, SyntheticMarket,
    SyntheticPriceFeed,
};
pub use service::{FeedRunner, FeedRunnerConfig, RunSummary};
