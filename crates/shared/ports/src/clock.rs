use parallax_core::Timestamp;

/// Source of `last_updated` stamps for ingests that carry no timestamp
///
/// Live feeds use wall-clock time; replays and tests inject a clock they
/// control so every record they produce is reproducible.
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> Timestamp;

    /// Short identifier, logged when a registry is created
    fn name(&self) -> &str {
        "Clock"
    }
}
