#![allow(dead_code)]

pub const TRIPS_TABLE_NAME: &str = "Trips";
pub const TRIP_ID: &str = "trip_id";
pub const START_TIME: &str = "start_time";
pub const END_TIME: &str = "end_time";
pub const DISTANCE_METERS: &str = "distance_meters";
pub const TOTAL_PAUSED_MS: &str = "total_paused_ms";

pub const TRACK_POINTS_TABLE_NAME: &str = "TrackPoints";
pub const POINT_ID: &str = "point_id";
pub const TIMESTAMP: &str = "timestamp";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const SPEED_MPS: &str = "speed_mps";
