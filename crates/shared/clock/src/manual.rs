use chrono::Duration;
use parallax_core::Timestamp;
use parallax_ports::Clock;
use parking_lot::RwLock;

/// Clock that only moves when explicitly advanced
///
/// Replays and tests drive this from their own event timestamps so that
/// `last_updated` on every record is reproducible.
pub struct ManualClock {
    current_time: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `initial_time`
    pub fn new(initial_time: Timestamp) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// Advance the clock by a specified duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current_time.write();
        *current += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current_time.read()
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
