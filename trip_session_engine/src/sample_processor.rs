use trip_session_lib::{geo::haversine_meters, snapshot::TrackingSnapshot, track_sample::TrackSample};

use crate::{providers::LocationFix, session_state::SessionState};

/// Minimum per-fix displacement counted toward distance. Filters GPS
/// jitter while stationary.
pub const MOVEMENT_THRESHOLD_METERS: f64 = 2.0;

/// No qualifying movement for this long auto-stops the trip.
pub const STATIONARY_WINDOW_MS: i64 = 120_000;

#[derive(Debug)]
pub struct ProcessedFix {
    pub sample: TrackSample,
    pub snapshot: TrackingSnapshot,
    /// The fix was processed fully, then the timeout predicate evaluated.
    /// Acting on it is the controller's call.
    pub stationary_timeout: bool,
}

/// Folds one raw fix into the session. Only touches distance, position and
/// movement bookkeeping; phase fields belong to the controller.
///
/// `now` drives the snapshot's elapsed time; the fix's own timestamp is
/// what counts for the sample and the stationary window. Provider
/// timestamps can trail the wall clock, and elapsed time must not dip
/// between a tick-driven publish and the next fix.
pub fn process_fix(
    state: &mut SessionState,
    fix: &LocationFix,
    now: chrono::DateTime<chrono::Utc>,
) -> Option<ProcessedFix> {
    let trip_id = state.trip_id?;

    if let Some(last) = state.last_position {
        let d = haversine_meters(last, fix.position);
        if d >= MOVEMENT_THRESHOLD_METERS {
            state.distance_meters += d;
            state.last_movement_time = Some(fix.timestamp);
        }
    }

    // Unconditional, so sub-threshold drift does not compound across fixes
    state.last_position = Some(fix.position);

    let sample = TrackSample::new(trip_id, fix.timestamp, fix.position, fix.speed_mps);
    let snapshot = state.snapshot(fix.speed_mps, now);

    let stationary_timeout = match state.last_movement_time {
        Some(last_move) => (fix.timestamp - last_move).num_milliseconds() > STATIONARY_WINDOW_MS,
        None => false,
    };

    Some(ProcessedFix {
        sample,
        snapshot,
        stationary_timeout,
    })
}
