//! Backtest Integration Test
//!
//! Tests the full feed pipeline:
//! 1. A seeded synthetic feed produces correlated rounds
//! 2. One tokio task per market ingests into a shared registry
//! 3. The registry recovers the related markets and ignores the unrelated one

use parallax_engine::{DEFAULT_MIN_CONFIDENCE, EngineConfig, PairPolicy};
use parallax_runner::{FeedRunner, FeedRunnerConfig, SyntheticFeedConfig, SyntheticPriceFeed};

const ROUNDS: usize = 200;

/// Each task sleeps 1ms after every ingest. With the clock paused, time only
/// advances once every task is idle, so all markets tick once per virtual ms.
fn lockstep_config(engine: EngineConfig) -> FeedRunnerConfig {
    FeedRunnerConfig {
        engine,
        ingest_interval_ms: 1,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_backtest_builds_every_direction() {
    let _ = env_logger::try_init();

    let runner = FeedRunner::new(lockstep_config(EngineConfig::default())).unwrap();
    let feed = SyntheticPriceFeed::with_seed(SyntheticFeedConfig::default(), 42);

    let summary = runner.run_synthetic(feed, ROUNDS).await.unwrap();

    assert_eq!(summary.ticks_ingested, (ROUNDS * 4) as u64);
    assert_eq!(summary.ticks_rejected, 0);
    assert!(summary.relationships_updated > 0);
    assert_eq!(summary.statistics.total_markets, 4);
    assert_eq!(summary.statistics.total_relationships, 12);

    // Every record was last refreshed by its primary's final tick
    let registry = runner.registry();
    let last_round_ms = 1_700_000_000_000 + (ROUNDS as i64 - 1) * 1_000;
    for market in registry.tracked_markets() {
        for record in registry.relationships_for(market.as_str()) {
            assert_eq!(record.last_updated.timestamp_millis(), last_round_ms);
            assert_eq!(record.half_life_ms, 300_000.0);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_backtest_separates_related_from_unrelated() {
    let _ = env_logger::try_init();

    let runner = FeedRunner::new(lockstep_config(EngineConfig::default())).unwrap();
    let feed = SyntheticPriceFeed::with_seed(SyntheticFeedConfig::default(), 7);
    runner.run_synthetic(feed, ROUNDS).await.unwrap();

    let registry = runner.registry();

    // Whichever BTC leg ticked second in the final round saw aligned moves
    let perp_on_spot = registry
        .get_relationship("venue-a:BTC-PERP", "venue-b:BTC-SPOT")
        .unwrap();
    let spot_on_perp = registry
        .get_relationship("venue-b:BTC-SPOT", "venue-a:BTC-PERP")
        .unwrap();
    let aligned = if perp_on_spot.correlation > spot_on_perp.correlation {
        perp_on_spot
    } else {
        spot_on_perp
    };
    assert!(aligned.correlation > 0.9);
    assert!(
        aligned.hedge_ratio > 0.8 && aligned.hedge_ratio < 1.2,
        "Expected beta near 1, got {}",
        aligned.hedge_ratio
    );

    for other in ["venue-a:BTC-PERP", "venue-b:BTC-SPOT", "venue-a:ETH-PERP"] {
        let rain = registry.get_relationship("venue-c:RAIN-NYC", other).unwrap();
        assert!(rain.correlation.abs() < 0.4);
    }

    let high = registry.get_high_confidence_relationships(DEFAULT_MIN_CONFIDENCE);
    assert!(high.len() >= 3);
    assert!(high.iter().all(|r| !r.key().involves("venue-c:RAIN-NYC")));
}

#[tokio::test(start_paused = true)]
async fn test_allow_list_limits_fan_out() {
    let engine = EngineConfig {
        pair_policy: PairPolicy::allow_list([("venue-b:BTC-SPOT", "venue-a:BTC-PERP")]),
        ..Default::default()
    };
    let runner = FeedRunner::new(lockstep_config(engine)).unwrap();
    let feed = SyntheticPriceFeed::with_seed(SyntheticFeedConfig::default(), 42);

    let summary = runner.run_synthetic(feed, ROUNDS).await.unwrap();

    assert_eq!(summary.statistics.total_markets, 4);
    assert_eq!(summary.statistics.total_relationships, 2);
    let registry = runner.registry();
    assert!(registry.get_relationship("venue-a:BTC-PERP", "venue-b:BTC-SPOT").is_some());
    assert!(registry.get_relationship("venue-a:ETH-PERP", "venue-a:BTC-PERP").is_none());
}

#[tokio::test]
async fn test_runner_config_from_json() {
    let json = r#"{"engine": {"half_life_ms": 60000, "min_samples": 20}, "channel_capacity": 16}"#;
    let config: FeedRunnerConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.engine.half_life_ms, 60_000.0);
    assert_eq!(config.engine.min_samples, 20);
    assert_eq!(config.engine.max_history_size, 1000);
    assert_eq!(config.channel_capacity, 16);
    assert_eq!(config.ingest_interval_ms, 0);

    let runner = FeedRunner::new(config).unwrap();
    let feed = SyntheticPriceFeed::with_seed(SyntheticFeedConfig::default(), 1);
    let summary = runner.run_synthetic(feed, 40).await.unwrap();
    assert_eq!(summary.ticks_ingested, 160);
    assert_eq!(summary.statistics.total_markets, 4);
}
