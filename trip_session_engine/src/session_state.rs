use chrono::{DateTime, Utc};
use geo_types::Point;
use trip_session_lib::snapshot::TrackingSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Paused,
}

/// Bookkeeping for the trip in progress. Exactly one writer: the
/// controller task, which processes commands and fixes one at a time.
#[derive(Debug, Default)]
pub struct SessionState {
    pub trip_id: Option<i64>,
    pub is_tracking: bool,
    pub is_paused: bool,
    pub distance_meters: f64,
    pub last_position: Option<Point>,
    pub last_movement_time: Option<DateTime<Utc>>,
    pub pause_started_at: Option<DateTime<Utc>>,
    pub total_paused_ms: i64,
    pub start_time: Option<DateTime<Utc>>,

    // Elapsed-time accumulation, frozen across pauses
    pub accumulated_ms: i64,
    pub last_start_time: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (self.is_tracking, self.is_paused) {
            (false, _) => Phase::Idle,
            (true, false) => Phase::Active,
            (true, true) => Phase::Paused,
        }
    }

    pub fn start(&mut self, trip_id: i64, now: DateTime<Utc>) {
        *self = Self {
            trip_id: Some(trip_id),
            is_tracking: true,
            is_paused: false,
            distance_meters: 0.0,
            last_position: None,
            last_movement_time: Some(now),
            pause_started_at: None,
            total_paused_ms: 0,
            start_time: Some(now),
            accumulated_ms: 0,
            last_start_time: Some(now),
        };
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.phase() != Phase::Active {
            return;
        }
        self.is_paused = true;
        self.pause_started_at = Some(now);
        if let Some(started) = self.last_start_time {
            self.accumulated_ms += (now - started).num_milliseconds();
        }
        self.last_start_time = None;
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.phase() != Phase::Paused {
            return;
        }
        if let Some(pause_start) = self.pause_started_at.take() {
            self.total_paused_ms += (now - pause_start).num_milliseconds();
        }
        self.is_paused = false;
        self.last_start_time = Some(now);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Tracked wall-clock time excluding paused intervals. Recomputed from
    /// the clock on every call, so missed ticks self-correct.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        let running = match (self.phase(), self.last_start_time) {
            (Phase::Active, Some(started)) => (now - started).num_milliseconds(),
            _ => 0,
        };
        self.accumulated_ms + running
    }

    pub fn snapshot(&self, speed_mps: f64, now: DateTime<Utc>) -> TrackingSnapshot {
        TrackingSnapshot {
            is_tracking: self.is_tracking,
            is_paused: self.is_paused,
            speed_mps,
            distance_meters: self.distance_meters,
            elapsed_ms: self.elapsed_ms(now),
            position: self.last_position,
            start_time: self.start_time,
        }
    }
}
