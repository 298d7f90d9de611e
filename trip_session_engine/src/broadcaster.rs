use tokio::sync::watch;
use trip_session_lib::snapshot::TrackingSnapshot;

/// Single-slot latest-value channel for tracking snapshots. New
/// subscribers immediately observe the most recent value; slow ones only
/// ever see the latest, never a backlog.
pub struct UpdateBroadcaster {
    tx: watch::Sender<TrackingSnapshot>,
}

impl UpdateBroadcaster {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(TrackingSnapshot::default()),
        }
    }

    pub fn publish(&self, snapshot: TrackingSnapshot) {
        self.tx.send_replace(snapshot);
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackingSnapshot> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> TrackingSnapshot {
        self.tx.borrow().clone()
    }
}

impl Default for UpdateBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
