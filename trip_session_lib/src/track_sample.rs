use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

/// One accepted location fix belonging to a trip. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    pub trip_id: i64,
    pub timestamp: DateTime<Utc>,
    pub position: Point,
    pub speed_mps: f64,
}

impl TrackSample {
    pub fn new(trip_id: i64, timestamp: DateTime<Utc>, position: Point, speed_mps: f64) -> Self {
        Self {
            trip_id,
            timestamp,
            position,
            speed_mps,
        }
    }
}
