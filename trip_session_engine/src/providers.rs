use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use geo_types::Point;
use tokio::sync::{mpsc, watch, Mutex};
use trip_session_lib::track_sample::TrackSample;

use crate::error::EngineError;

/// One raw location reading from a positioning provider.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    pub position: Point,
    pub speed_mps: f64,
    pub timestamp: DateTime<Utc>,
}

/// Upstream positioning source. A new `request_updates` call replaces any
/// previous subscription; dropping the returned receiver, or calling
/// `cancel_updates`, ends it.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync + 'static {
    async fn request_updates(
        &self,
        interval: Duration,
        min_distance_meters: f64,
    ) -> Result<mpsc::Receiver<LocationFix>, EngineError>;

    async fn cancel_updates(&self);
}

/// Durable trip storage. The engine only appends; it never reads back.
#[async_trait::async_trait]
pub trait TripRepository: Send + Sync + 'static {
    async fn create_trip(&self, start_time: DateTime<Utc>) -> Result<i64, EngineError>;

    async fn append_sample(&self, sample: &TrackSample) -> Result<(), EngineError>;

    async fn finalize_trip(
        &self,
        trip_id: i64,
        end_time: DateTime<Utc>,
        distance_meters: f64,
        total_paused_ms: i64,
    ) -> Result<(), EngineError>;
}

pub const DEFAULT_INTERVAL_SECONDS: u32 = 5;

/// Live tracking settings. Readers subscribe and observe changes without
/// polling; `watch` only wakes them on distinct values.
pub struct SettingsStore {
    interval_seconds: watch::Sender<u32>,
    background_enabled: watch::Sender<bool>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            interval_seconds: watch::Sender::new(DEFAULT_INTERVAL_SECONDS),
            background_enabled: watch::Sender::new(true),
        }
    }

    pub fn interval_seconds(&self) -> watch::Receiver<u32> {
        self.interval_seconds.subscribe()
    }

    pub fn background_enabled(&self) -> watch::Receiver<bool> {
        self.background_enabled.subscribe()
    }

    pub fn set_interval_seconds(&self, seconds: u32) {
        self.interval_seconds.send_replace(seconds.max(1));
    }

    pub fn set_background_enabled(&self, enabled: bool) {
        self.background_enabled.send_replace(enabled);
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

struct ChannelProviderInner {
    permission_granted: bool,
    fix_tx: Option<mpsc::Sender<LocationFix>>,
    requested_interval: Option<Duration>,
}

/// Channel-fed location provider. Whatever owns the other end pushes fixes
/// into the active subscription; doubles as the test stand-in for a real
/// positioning client.
#[derive(Clone)]
pub struct ChannelLocationProvider {
    inner: Arc<Mutex<ChannelProviderInner>>,
}

impl ChannelLocationProvider {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelProviderInner {
                permission_granted: true,
                fix_tx: None,
                requested_interval: None,
            })),
        }
    }

    pub async fn set_permission_granted(&self, granted: bool) {
        self.inner.lock().await.permission_granted = granted;
    }

    /// Delivers a fix to the active subscription. Returns false if no
    /// subscription is active or the subscriber went away.
    pub async fn push_fix(&self, fix: LocationFix) -> bool {
        let tx = self.inner.lock().await.fix_tx.clone();
        match tx {
            Some(tx) => tx.send(fix).await.is_ok(),
            None => false,
        }
    }

    pub async fn requested_interval(&self) -> Option<Duration> {
        self.inner.lock().await.requested_interval
    }

    pub async fn has_subscription(&self) -> bool {
        self.inner.lock().await.fix_tx.is_some()
    }
}

impl Default for ChannelLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LocationProvider for ChannelLocationProvider {
    async fn request_updates(
        &self,
        interval: Duration,
        _min_distance_meters: f64,
    ) -> Result<mpsc::Receiver<LocationFix>, EngineError> {
        let mut inner = self.inner.lock().await;

        if !inner.permission_granted {
            return Err(EngineError::PermissionDenied);
        }

        let (tx, rx) = mpsc::channel(32);
        inner.fix_tx = Some(tx);
        inner.requested_interval = Some(interval);
        Ok(rx)
    }

    async fn cancel_updates(&self) {
        let mut inner = self.inner.lock().await;
        inner.fix_tx = None;
        inner.requested_interval = None;
    }
}
