use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

/// Read-only projection of the tracking session, republished on every
/// accepted fix and once per second while tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrackingSnapshot {
    pub is_tracking: bool,
    pub is_paused: bool,
    pub speed_mps: f64,
    pub distance_meters: f64,
    pub elapsed_ms: i64,
    pub position: Option<Point>,
    pub start_time: Option<DateTime<Utc>>,
}
