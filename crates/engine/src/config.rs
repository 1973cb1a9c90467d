//! Engine configuration
//!
//! Fixed at construction; there is no hot reload. Every field has a default
//! so partial JSON documents are accepted.

use parallax_core::MarketId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Configuration for the relationship engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Decay half-life, counted in buffer positions scaled as milliseconds
    pub half_life_ms: f64,
    /// Prices kept per market before the oldest is evicted
    pub max_history_size: usize,
    /// Observations both markets need before a pair is estimated
    pub min_samples: usize,
    /// Confidence floor used by aggregate statistics
    pub high_confidence_threshold: f64,
    /// Absolute correlation floor for the high-confidence set
    pub min_abs_correlation: f64,
    /// Which market pairs are estimated on each ingest
    pub pair_policy: PairPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            half_life_ms: 300_000.0, // 5 minutes
            max_history_size: 1000,
            min_samples: 50,
            high_confidence_threshold: 0.7,
            min_abs_correlation: 0.7,
            pair_policy: PairPolicy::AllPairs,
        }
    }
}

impl EngineConfig {
    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can produce estimates at all
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.half_life_ms.is_finite() || self.half_life_ms <= 0.0 {
            return Err(ConfigError::InvalidHalfLife(self.half_life_ms));
        }

        // A single point has no price delta
        if self.max_history_size < 2 {
            return Err(ConfigError::InvalidHistorySize(self.max_history_size));
        }

        if self.min_samples < 2 || self.min_samples > self.max_history_size {
            return Err(ConfigError::InvalidMinSamples {
                min_samples: self.min_samples,
                max_history_size: self.max_history_size,
            });
        }

        for (name, value) in [
            ("high_confidence_threshold", self.high_confidence_threshold),
            ("min_abs_correlation", self.min_abs_correlation),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }
}

/// Which pairs of markets the registry estimates
///
/// Fanning out to every market is quadratic in the number of active
/// markets. An allow-list bounds the work to the pairs a strategy actually
/// hedges.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "pairs", rename_all = "snake_case")]
pub enum PairPolicy {
    /// Every market against every other market
    #[default]
    AllPairs,
    /// Only the listed unordered pairs, estimated in both directions
    AllowList(BTreeSet<(MarketId, MarketId)>),
}

impl PairPolicy {
    /// Build an allow-list from unordered pairs
    pub fn allow_list<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<MarketId>,
        B: Into<MarketId>,
    {
        let set = pairs
            .into_iter()
            .map(|(a, b)| Self::normalize(a.into(), b.into()))
            .collect();
        PairPolicy::AllowList(set)
    }

    /// Whether the pair `(a, b)` should be estimated, in either direction
    pub fn admits(&self, a: &MarketId, b: &MarketId) -> bool {
        match self {
            PairPolicy::AllPairs => true,
            PairPolicy::AllowList(pairs) => {
                pairs.contains(&Self::normalize(a.clone(), b.clone()))
            }
        }
    }

    fn normalize(a: MarketId, b: MarketId) -> (MarketId, MarketId) {
        if a <= b { (a, b) } else { (b, a) }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Half-life must be a positive finite number, got {0}")]
    InvalidHalfLife(f64),

    #[error("History size must be at least 2, got {0}")]
    InvalidHistorySize(usize),

    #[error(
        "Minimum samples must be between 2 and the history size ({max_history_size}), got {min_samples}"
    )]
    InvalidMinSamples {
        min_samples: usize,
        max_history_size: usize,
    },

    #[error("Threshold {name} must be within [0, 1], got {value}")]
    InvalidThreshold { name: String, value: f64 },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.half_life_ms, 300_000.0);
        assert_eq!(config.max_history_size, 1000);
        assert_eq!(config.min_samples, 50);
        assert_eq!(config.pair_policy, PairPolicy::AllPairs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let bad_half_life = EngineConfig {
            half_life_ms: 0.0,
            ..Default::default()
        };
        assert_eq!(
            bad_half_life.validate(),
            Err(ConfigError::InvalidHalfLife(0.0))
        );

        let bad_history = EngineConfig {
            max_history_size: 1,
            min_samples: 1,
            ..Default::default()
        };
        assert_eq!(
            bad_history.validate(),
            Err(ConfigError::InvalidHistorySize(1))
        );

        // min_samples can never be reached if it exceeds the buffer
        let unreachable = EngineConfig {
            max_history_size: 40,
            ..Default::default()
        };
        assert!(matches!(
            unreachable.validate(),
            Err(ConfigError::InvalidMinSamples { min_samples: 50, .. })
        ));

        let bad_threshold = EngineConfig {
            min_abs_correlation: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            bad_threshold.validate(),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_from_json_partial_document() {
        let config = EngineConfig::from_json(r#"{ "min_samples": 20 }"#).unwrap();
        assert_eq!(config.min_samples, 20);
        assert_eq!(config.max_history_size, 1000);

        let err = EngineConfig::from_json(r#"{ "min_samples": "lots" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_allow_list_from_json() {
        let config = EngineConfig::from_json(
            r#"{
                "pair_policy": {
                    "mode": "allow_list",
                    "pairs": [["kalshi:BTC-100K", "polymarket:BTC-100K"]]
                }
            }"#,
        )
        .unwrap();

        let kalshi = MarketId::from("kalshi:BTC-100K");
        let poly = MarketId::from("polymarket:BTC-100K");
        assert!(config.pair_policy.admits(&kalshi, &poly));
        assert!(config.pair_policy.admits(&poly, &kalshi));
    }

    #[test]
    fn test_allow_list_is_unordered() {
        let policy = PairPolicy::allow_list([("B", "A")]);
        let a = MarketId::from("A");
        let b = MarketId::from("B");
        let c = MarketId::from("C");

        assert!(policy.admits(&a, &b));
        assert!(policy.admits(&b, &a));
        assert!(!policy.admits(&a, &c));
        assert!(PairPolicy::AllPairs.admits(&a, &c));
    }
}
