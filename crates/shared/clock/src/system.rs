use chrono::{SubsecRound, Utc};
use parallax_core::Timestamp;
use parallax_ports::Clock;

/// Wall-clock time for live feeds
///
/// Readings are truncated to whole milliseconds, the same resolution as
/// caller-supplied `timestamp_ms` values, so records stamped either way
/// compare consistently.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().trunc_subsecs(3)
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
