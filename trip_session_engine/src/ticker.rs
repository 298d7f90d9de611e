use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// 1 Hz clock for elapsed-time republishing. Ticks only mark "time to
/// recompute"; the elapsed value itself is always derived from wall-clock
/// time, so skipped ticks (process suspension) self-correct on the next
/// one.
pub struct ElapsedTicker {
    interval: Interval,
}

impl ElapsedTicker {
    pub fn new() -> Self {
        let mut interval = interval(TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Restart the period, e.g. when a trip starts.
    pub fn reset(&mut self) {
        self.interval.reset();
    }
}

impl Default for ElapsedTicker {
    fn default() -> Self {
        Self::new()
    }
}
