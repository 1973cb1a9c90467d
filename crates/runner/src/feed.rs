//! Price Feeds - sources of per-market ticks for the registry
//!
//! A [`PriceFeed`] yields the ticks of exactly one market, so each feed can
//! be owned by its own task. Two sources are provided:
//! - [`ChannelPriceFeed`]: ticks pushed through a tokio channel by a producer
//! - [`SyntheticPriceFeed`]: seeded correlated random walks for backtests
//!
//! The synthetic model moves every market by a shared shock plus its own
//! noise:
//!
//! ```text
//! Δp = volatility · (beta · common + idiosyncratic · noise)
//! common, noise ~ U(-1, 1)
//! ```
//!
//! so two markets with non-zero betas are positively related by
//! construction, and a market with `beta = 0` is unrelated to all others.

use crate::error::RunnerResult;
use async_trait::async_trait;
use parallax_core::MarketId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One observed price for one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub market: MarketId,
    pub price: f64,
    /// Unix millis; the registry clock is used when absent
    pub timestamp_ms: Option<i64>,
}

impl PriceTick {
    pub fn new(market: impl Into<MarketId>, price: f64, timestamp_ms: Option<i64>) -> Self {
        Self {
            market: market.into(),
            price,
            timestamp_ms,
        }
    }
}

/// Source of ticks for a single market
#[async_trait]
pub trait PriceFeed: Send {
    /// Market this feed produces ticks for
    fn market(&self) -> &MarketId;

    /// Wait for the next tick; `None` once the feed is exhausted
    async fn next_tick(&mut self) -> RunnerResult<Option<PriceTick>>;
}

/// Feed backed by an mpsc receiver
pub struct ChannelPriceFeed {
    market: MarketId,
    rx: mpsc::Receiver<PriceTick>,
}

impl ChannelPriceFeed {
    pub fn new(market: impl Into<MarketId>, rx: mpsc::Receiver<PriceTick>) -> Self {
        Self {
            market: market.into(),
            rx,
        }
    }

    /// Create a feed together with the sender that drives it
    pub fn channel(
        market: impl Into<MarketId>,
        capacity: usize,
    ) -> (mpsc::Sender<PriceTick>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(market, rx))
    }
}

#[async_trait]
impl PriceFeed for ChannelPriceFeed {
    fn market(&self) -> &MarketId {
        &self.market
    }

    async fn next_tick(&mut self) -> RunnerResult<Option<PriceTick>> {
        // All senders dropped: the producer is done
        Ok(self.rx.recv().await)
    }
}

/// One market in the synthetic universe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticMarket {
    pub id: MarketId,
    pub initial_price: f64,
    /// Loading on the shared shock
    pub beta: f64,
    /// Price units per unit shock
    pub volatility: f64,
}

impl SyntheticMarket {
    pub fn new(id: impl Into<MarketId>, initial_price: f64, beta: f64, volatility: f64) -> Self {
        Self {
            id: id.into(),
            initial_price,
            beta,
            volatility,
        }
    }
}

/// Configuration for the synthetic feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticFeedConfig {
    pub markets: Vec<SyntheticMarket>,
    /// Weight of each market's own noise relative to the common shock
    pub idiosyncratic: f64,
    /// Timestamp of the first round (Unix millis)
    pub start_ms: i64,
    /// Spacing between rounds (ms)
    pub tick_interval_ms: i64,
}

impl Default for SyntheticFeedConfig {
    fn default() -> Self {
        Self {
            markets: vec![
                SyntheticMarket::new("venue-a:BTC-PERP", 50_000.0, 1.0, 25.0),
                SyntheticMarket::new("venue-b:BTC-SPOT", 50_000.0, 1.0, 25.0),
                SyntheticMarket::new("venue-a:ETH-PERP", 3_000.0, 0.8, 2.0),
                SyntheticMarket::new("venue-c:RAIN-NYC", 0.5, 0.0, 0.001),
            ],
            idiosyncratic: 0.1,              // 10% own noise
            start_ms: 1_700_000_000_000,     // Nov 2023
            tick_interval_ms: 1_000,         // 1 round per second
        }
    }
}

/// Generates correlated random walks, one tick per market per round
pub struct SyntheticPriceFeed {
    config: SyntheticFeedConfig,
    prices: Vec<f64>,
    round: u64,
    rng: StdRng,
}

impl SyntheticPriceFeed {
    /// Create a feed seeded from entropy
    pub fn new(config: SyntheticFeedConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create with a specific seed for reproducible backtests
    pub fn with_seed(config: SyntheticFeedConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SyntheticFeedConfig, rng: StdRng) -> Self {
        let prices = config.markets.iter().map(|m| m.initial_price).collect();
        Self {
            config,
            prices,
            round: 0,
            rng,
        }
    }

    pub fn config(&self) -> &SyntheticFeedConfig {
        &self.config
    }

    pub fn markets(&self) -> impl Iterator<Item = &MarketId> {
        self.config.markets.iter().map(|m| &m.id)
    }

    /// Current price of a market
    pub fn price(&self, market: &str) -> Option<f64> {
        self.config
            .markets
            .iter()
            .position(|m| m.id.as_str() == market)
            .map(|idx| self.prices[idx])
    }

    /// Rounds generated so far
    pub fn rounds(&self) -> u64 {
        self.round
    }

    /// Advance every market by one step
    ///
    /// The first round emits the initial prices unchanged. Ticks are in
    /// configuration order.
    pub fn next_round(&mut self) -> Vec<PriceTick> {
        if self.round > 0 {
            let common: f64 = self.rng.gen_range(-1.0..1.0);
            for (idx, market) in self.config.markets.iter().enumerate() {
                let noise: f64 = self.rng.gen_range(-1.0..1.0);
                let shock = market.beta * common + self.config.idiosyncratic * noise;
                self.prices[idx] += market.volatility * shock;
            }
        }

        let timestamp_ms = self.config.start_ms + self.round as i64 * self.config.tick_interval_ms;
        self.round += 1;

        self.config
            .markets
            .iter()
            .zip(&self.prices)
            .map(|(market, price)| PriceTick::new(market.id.clone(), *price, Some(timestamp_ms)))
            .collect()
    }
}
