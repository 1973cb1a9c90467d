//! Feed Runner - drives per-market feeds into a shared registry
//!
//! Each feed is owned by its own tokio task, which is the single writer for
//! its market. Tasks share one `Arc<RelationshipRegistry>`; the registry's
//! per-market gates keep concurrent ingests for different markets apart.
//!
//! ```text
//!  SyntheticPriceFeed ──► producer task ──┬─► mpsc ─► market task A ─┐
//!                                         ├─► mpsc ─► market task B ─┼─► registry.ingest
//!                                         └─► mpsc ─► market task C ─┘
//! ```

use crate::error::{RunnerError, RunnerResult};
use crate::feed::{ChannelPriceFeed, PriceFeed, PriceTick, SyntheticPriceFeed};
use log::{debug, info, warn};
use parallax_core::{MarketId, RelationshipStatistics};
use parallax_engine::{EngineConfig, RelationshipRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedRunnerConfig {
    /// Engine settings for the registry the runner creates
    pub engine: EngineConfig,
    /// Pause after each ingest (ms), 0 to run flat out
    pub ingest_interval_ms: u64,
    /// Buffered ticks per market channel
    pub channel_capacity: usize,
}

impl Default for FeedRunnerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            ingest_interval_ms: 0,
            channel_capacity: 1024,
        }
    }
}

/// Totals for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Ticks the registry stored
    pub ticks_ingested: u64,
    /// Ticks refused: non-finite prices, or ticks for a market other than
    /// the feed's own
    pub ticks_rejected: u64,
    /// Relationship records written across all fan-outs
    pub relationships_updated: u64,
    /// Registry statistics once every feed finished
    pub statistics: RelationshipStatistics,
}

impl RunSummary {
    fn absorb(&mut self, other: FeedTotals) {
        self.ticks_ingested += other.ingested;
        self.ticks_rejected += other.rejected;
        self.relationships_updated += other.updated;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct FeedTotals {
    ingested: u64,
    rejected: u64,
    updated: u64,
}

/// Drives feeds into a relationship registry
pub struct FeedRunner {
    config: FeedRunnerConfig,
    registry: Arc<RelationshipRegistry>,
}

impl FeedRunner {
    /// Create a runner with its own registry
    pub fn new(config: FeedRunnerConfig) -> RunnerResult<Self> {
        let registry = Arc::new(RelationshipRegistry::new(config.engine.clone())?);
        Ok(Self { config, registry })
    }

    /// Create a runner over an existing registry
    ///
    /// `config.engine` is ignored; the registry keeps its own settings.
    pub fn with_registry(config: FeedRunnerConfig, registry: Arc<RelationshipRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &FeedRunnerConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<RelationshipRegistry> {
        Arc::clone(&self.registry)
    }

    /// Run every feed to exhaustion, one task per feed
    pub async fn run<F>(&self, feeds: Vec<F>) -> RunnerResult<RunSummary>
    where
        F: PriceFeed + 'static,
    {
        info!("[RUNNER] Starting {} feed tasks", feeds.len());

        let handles: Vec<JoinHandle<RunnerResult<FeedTotals>>> = feeds
            .into_iter()
            .map(|feed| {
                let registry = Arc::clone(&self.registry);
                let interval = self.config.ingest_interval_ms;
                tokio::spawn(Self::run_feed(feed, registry, interval))
            })
            .collect();

        let mut summary = RunSummary::default();
        let mut first_error = None;
        for handle in handles {
            match handle.await.map_err(RunnerError::from).and_then(|r| r) {
                Ok(totals) => summary.absorb(totals),
                Err(e) => {
                    warn!("[RUNNER] Feed task failed: {}", e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        summary.statistics = self.registry.get_statistics();
        info!(
            "[RUNNER] Finished: {} ticks ingested, {} rejected, {} records written",
            summary.ticks_ingested, summary.ticks_rejected, summary.relationships_updated
        );
        Ok(summary)
    }

    /// Generate `rounds` rounds from a synthetic feed and run them through
    /// one channel-backed task per market
    pub async fn run_synthetic(
        &self,
        feed: SyntheticPriceFeed,
        rounds: usize,
    ) -> RunnerResult<RunSummary> {
        let mut senders = Vec::new();
        let mut feeds = Vec::new();
        for market in feed.markets() {
            let (tx, channel_feed) =
                ChannelPriceFeed::channel(market.clone(), self.config.channel_capacity);
            senders.push((market.clone(), tx));
            feeds.push(channel_feed);
        }

        let producer = tokio::spawn(Self::produce(feed, senders, rounds));
        let summary = self.run(feeds).await?;
        producer.await??;
        Ok(summary)
    }

    async fn produce(
        mut feed: SyntheticPriceFeed,
        senders: Vec<(MarketId, mpsc::Sender<PriceTick>)>,
        rounds: usize,
    ) -> RunnerResult<()> {
        debug!("[FEED] Producing {} rounds for {} markets", rounds, senders.len());

        for _ in 0..rounds {
            for (tick, (market, tx)) in feed.next_round().into_iter().zip(&senders) {
                if tx.send(tick).await.is_err() {
                    return Err(RunnerError::FeedClosed(market.clone()));
                }
            }
        }
        Ok(())
    }

    async fn run_feed<F: PriceFeed>(
        mut feed: F,
        registry: Arc<RelationshipRegistry>,
        interval_ms: u64,
    ) -> RunnerResult<FeedTotals> {
        let market = feed.market().clone();
        debug!("[RUNNER] Feed task for {} started", market);

        let mut totals = FeedTotals::default();
        while let Some(tick) = feed.next_tick().await? {
            if tick.market != market {
                warn!(
                    "[RUNNER] Feed for {} produced a tick for {}, dropping it",
                    market, tick.market
                );
                totals.rejected += 1;
                continue;
            }

            let outcome = registry.ingest(market.clone(), tick.price, tick.timestamp_ms);
            if outcome.accepted {
                totals.ingested += 1;
            } else {
                totals.rejected += 1;
            }
            totals.updated += outcome.updated as u64;

            if interval_ms > 0 {
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }

        debug!(
            "[RUNNER] Feed task for {} done after {} ticks",
            market, totals.ingested
        );
        Ok(totals)
    }
}
