//! Time sources for the simulation and the wire protocol
//!
//! The simulation runs on a monotonic millisecond clock; report timestamps
//! cross machine boundaries and therefore use the wall clock. The two are
//! bridged in `World::build_report` / `World::apply_report`.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds (fractional)
pub fn wall_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
        * 1000.0
}

/// Monotonic simulation clock, milliseconds since creation
#[derive(Debug, Clone)]
pub struct SimClock {
    origin: Instant,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the clock was created
    pub fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Nominal tick cadence for the client engine loop
pub const TICK_INTERVAL_MS: u64 = 16;
