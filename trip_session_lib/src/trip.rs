use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

/// A recorded trip. `end_time` is set exactly once, when the trip stops.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Trip {
    pub trip_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub distance_meters: f64,
    pub total_paused_ms: i64,
}

#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for Trip {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            trip_id: row.get(0),
            start_time: row.get(1),
            end_time: row.get(2),
            distance_meters: row.get(3),
            total_paused_ms: row.get(4),
        })
    }
}

impl Trip {
    pub fn new(trip_id: i64, start_time: DateTime<Utc>) -> Self {
        Self {
            trip_id,
            start_time,
            end_time: None,
            distance_meters: 0.0,
            total_paused_ms: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }
}
