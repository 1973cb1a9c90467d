use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Identifier for a tradable market or exchange feed
///
/// Opaque to the engine: two feeds are the same market only if their ids
/// compare equal. Used as the key of every per-market map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(String);

impl MarketId {
    /// Create a new market ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MarketId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&MarketId> for MarketId {
    fn from(id: &MarketId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for MarketId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MarketId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
