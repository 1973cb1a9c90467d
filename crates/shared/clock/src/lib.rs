//! Parallax Clock Infrastructure
//!
//! Provides time sources for stamping relationship records:
//!
//! - [`SystemClock`]: wall-clock time for live feeds
//! - [`ManualClock`]: frozen time that only moves when told to, for
//!   backtests and deterministic tests
//!
//! ## Usage
//!
//! ```ignore
//! use parallax_clock::{ManualClock, SystemClock};
//! use chrono::Duration;
//!
//! let live = SystemClock::new();
//!
//! let replay = ManualClock::new(start_of_session);
//! replay.advance(Duration::milliseconds(250)); // next tick
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use parallax_ports::Clock;
