//! Relationship Registry
//!
//! Owns the per-market price series and the directional relationship
//! records derived from them.
//!
//! On every ingest for market `M`, the registry appends the price and then
//! re-estimates `M -> X` for every other market `X` that has enough history.
//! `X -> M` is only refreshed when `X` itself next ticks.
//!
//! # Cost
//!
//! Each ingest runs up to `K` estimates of `O(N)` each, where `K` is the
//! number of other tracked markets and `N` the history size. If every
//! market ticks at a similar rate, total work grows quadratically with the
//! number of active markets. [`PairPolicy::AllowList`] bounds `K`.
//!
//! [`PairPolicy::AllowList`]: crate::config::PairPolicy::AllowList
//!
//! # Concurrency
//!
//! All methods take `&self`. Ingests for the same market are serialized
//! by that market's gate; ingests for different markets run in parallel and
//! never wait on each other's gate, only on the brief series copy.
//! Ingests share a session lock that [`RelationshipRegistry::reset`] takes
//! exclusively, so a reset waits for in-flight ingests and none straddles it.

use crate::config::{ConfigError, EngineConfig};
use crate::estimator::{EwCovarianceEstimator, PairEstimate};
use crate::series::PriceSeriesStore;
use dashmap::DashMap;
use log::{debug, info, trace, warn};
use parallax_clock::SystemClock;
use parallax_core::{
    MarketId, PairKey, PricePoint, RelationshipRecord, RelationshipStatistics, Timestamp,
};
use parallax_ports::{Clock, EstimationError, RelationshipQuery};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of one ingest's fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FanOutSummary {
    /// Whether the price was stored
    pub accepted: bool,
    /// Records written for this market as primary
    pub updated: usize,
    /// Pairs that failed estimation and were skipped
    pub skipped: usize,
}

/// Registry of pairwise market relationships
pub struct RelationshipRegistry {
    config: EngineConfig,
    estimator: EwCovarianceEstimator,
    store: PriceSeriesStore,
    relationships: DashMap<PairKey, RelationshipRecord>,
    clock: Arc<dyn Clock>,
    /// Shared by ingests, exclusive for reset
    session: RwLock<()>,
}

impl RelationshipRegistry {
    /// Create a registry stamping records with wall-clock time
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create a registry with an explicit clock
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        info!(
            "[REGISTRY] Created: half_life={}ms, history={}, min_samples={}, clock={}",
            config.half_life_ms,
            config.max_history_size,
            config.min_samples,
            clock.name()
        );

        Self {
            estimator: EwCovarianceEstimator::new(config.half_life_ms, config.min_samples),
            store: PriceSeriesStore::new(config.max_history_size),
            relationships: DashMap::new(),
            clock,
            config,
            session: RwLock::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Record a price and refresh every relationship with `market` as primary
    ///
    /// Never fails: a rejected price or a failing pair is logged and the
    /// rest of the fan-out continues. `timestamp_ms` (Unix millis) stamps the
    /// point and the records it produces; the clock is used when absent.
    pub fn ingest(
        &self,
        market: impl Into<MarketId>,
        price: f64,
        timestamp_ms: Option<i64>,
    ) -> FanOutSummary {
        let market = market.into();
        let timestamp = self.resolve_timestamp(timestamp_ms);
        let point = PricePoint::new(price, timestamp);

        if !point.is_valid() {
            warn!("[REGISTRY] Rejected non-finite price {} for {}", price, market);
            return FanOutSummary::default();
        }

        let _session = self.session.read();
        let slot = self.store.slot(&market);
        let _gate = slot.gate.lock();

        let primary_len = slot.push(point);
        let mut summary = FanOutSummary {
            accepted: true,
            ..Default::default()
        };

        if primary_len < self.config.min_samples {
            trace!(
                "[REGISTRY] {} warming up: {}/{} samples",
                market, primary_len, self.config.min_samples
            );
            return summary;
        }

        let primary_prices = slot.prices();

        for other in self.store.market_ids() {
            if other == market || !self.config.pair_policy.admits(&market, &other) {
                continue;
            }

            let hedge_prices = self.store.snapshot(other.as_str());
            if hedge_prices.len() < self.config.min_samples {
                continue;
            }

            match self.estimate_pair(&primary_prices, &hedge_prices) {
                Ok(estimate) => {
                    let record = self.to_record(&market, &other, estimate, timestamp);
                    debug!(
                        "[REGISTRY] {}->{}: beta={:.4} corr={:.4} conf={:.4}",
                        market, other, record.hedge_ratio, record.correlation, record.confidence
                    );
                    self.relationships.insert(record.key(), record);
                    summary.updated += 1;
                }
                // Unreachable with tail-aligned inputs of at least min_samples;
                // kept as a guard against future changes to alignment.
                Err(e @ EstimationError::InsufficientData { .. }) => {
                    debug!("[REGISTRY] Skipping {}->{}: {}", market, other, e);
                    summary.skipped += 1;
                }
                Err(e @ EstimationError::InputMismatch { .. }) => {
                    warn!("[REGISTRY] Skipping {}->{}: {}", market, other, e);
                    summary.skipped += 1;
                }
            }
        }

        trace!(
            "[REGISTRY] {} fan-out: {} updated, {} skipped",
            market, summary.updated, summary.skipped
        );
        summary
    }

    /// Estimate over the most recent points both series have in common
    fn estimate_pair(
        &self,
        primary: &[f64],
        hedge: &[f64],
    ) -> Result<PairEstimate, EstimationError> {
        let aligned = primary.len().min(hedge.len());
        self.estimator.estimate(
            &primary[primary.len() - aligned..],
            &hedge[hedge.len() - aligned..],
        )
    }

    fn to_record(
        &self,
        primary: &MarketId,
        hedge: &MarketId,
        estimate: PairEstimate,
        last_updated: Timestamp,
    ) -> RelationshipRecord {
        RelationshipRecord {
            primary: primary.clone(),
            hedge: hedge.clone(),
            covariance: estimate.covariance,
            correlation: estimate.correlation,
            hedge_ratio: estimate.hedge_ratio,
            residual_std_dev: estimate.residual_std_dev,
            confidence: estimate.confidence,
            half_life_ms: self.config.half_life_ms,
            sample_count: estimate.sample_count,
            last_updated,
        }
    }

    fn resolve_timestamp(&self, timestamp_ms: Option<i64>) -> Timestamp {
        match timestamp_ms {
            Some(ms) => Timestamp::from_timestamp_millis(ms).unwrap_or_else(|| {
                warn!(
                    "[REGISTRY] Timestamp {}ms out of range, using {}",
                    ms,
                    self.clock.name()
                );
                self.clock.now()
            }),
            None => self.clock.now(),
        }
    }

    /// Latest record for `primary` regressed on `hedge`
    pub fn get_relationship(&self, primary: &str, hedge: &str) -> Option<RelationshipRecord> {
        self.relationships
            .get(&PairKey::new(primary, hedge))
            .map(|entry| entry.value().clone())
    }

    /// Records with `confidence >= min_confidence` AND a strong correlation
    ///
    /// Sorted by confidence descending, then by pair.
    pub fn get_high_confidence_relationships(&self, min_confidence: f64) -> Vec<RelationshipRecord> {
        let min_abs_correlation = self.config.min_abs_correlation;
        let mut records: Vec<RelationshipRecord> = self
            .relationships
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .is_high_confidence(min_confidence, min_abs_correlation)
            })
            .map(|entry| entry.value().clone())
            .collect();

        records.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| (&a.primary, &a.hedge).cmp(&(&b.primary, &b.hedge)))
        });
        records
    }

    /// Every record with `primary` as the primary leg, sorted by hedge market
    pub fn relationships_for(&self, primary: &str) -> Vec<RelationshipRecord> {
        let mut records: Vec<RelationshipRecord> = self
            .relationships
            .iter()
            .filter(|entry| entry.key().primary.as_str() == primary)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.hedge.cmp(&b.hedge));
        records
    }

    /// Aggregate counts and averages
    pub fn get_statistics(&self) -> RelationshipStatistics {
        let mut stats = RelationshipStatistics {
            total_markets: self.store.market_count(),
            ..Default::default()
        };

        let mut correlation_sum = 0.0;
        let mut confidence_sum = 0.0;
        for entry in self.relationships.iter() {
            let record = entry.value();
            stats.total_relationships += 1;
            correlation_sum += record.correlation;
            confidence_sum += record.confidence;
            if record.is_high_confidence(
                self.config.high_confidence_threshold,
                self.config.min_abs_correlation,
            ) {
                stats.high_confidence_count += 1;
            }
        }

        if stats.total_relationships > 0 {
            let n = stats.total_relationships as f64;
            stats.avg_correlation = correlation_sum / n;
            stats.avg_confidence = confidence_sum / n;
        }

        stats
    }

    /// Clear every price series and relationship record
    ///
    /// Waits for in-flight ingests. Ingests that start afterwards begin
    /// warming up from empty series.
    pub fn reset(&self) {
        let _session = self.session.write();
        let stats = self.get_statistics();
        self.store.clear();
        self.relationships.clear();
        info!(
            "[REGISTRY] Reset: dropped {} markets and {} relationships",
            stats.total_markets, stats.total_relationships
        );
    }

    /// Markets with at least one stored price, sorted
    pub fn tracked_markets(&self) -> Vec<MarketId> {
        let mut markets = self.store.market_ids();
        markets.sort();
        markets
    }

    /// Copy of a market's prices, oldest to newest
    pub fn series_snapshot(&self, market: &str) -> Vec<f64> {
        self.store.snapshot(market)
    }

    /// Number of stored prices for a market
    pub fn series_len(&self, market: &str) -> usize {
        self.store.len(market)
    }

    /// Most recent stored price point for a market
    pub fn latest_price(&self, market: &str) -> Option<PricePoint> {
        self.store.latest(market)
    }
}

impl Default for RelationshipRegistry {
    fn default() -> Self {
        Self::build(EngineConfig::default(), Arc::new(SystemClock::new()))
    }
}

impl RelationshipQuery for RelationshipRegistry {
    fn query_relationship(&self, primary: &str, hedge: &str) -> Option<RelationshipRecord> {
        self.get_relationship(primary, hedge)
    }

    fn query_high_confidence(&self, min_confidence: f64) -> Vec<RelationshipRecord> {
        self.get_high_confidence_relationships(min_confidence)
    }

    fn statistics(&self) -> RelationshipStatistics {
        self.get_statistics()
    }
}
