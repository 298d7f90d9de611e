use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use trip_session_lib::snapshot::TrackingSnapshot;

use crate::{
    broadcaster::UpdateBroadcaster,
    providers::{LocationFix, LocationProvider, SettingsStore, TripRepository},
    sample_processor::{process_fix, STATIONARY_WINDOW_MS},
    session_state::{Phase, SessionState},
    ticker::ElapsedTicker,
};

/// Minimum displacement passed to the provider alongside the interval.
pub const MIN_UPDATE_DISTANCE_METERS: f64 = 1.0;

#[derive(Debug)]
enum Command {
    Start,
    Pause,
    Resume,
    Stop,
    /// The hosting process may be reclaimed; stop unless background
    /// tracking is allowed.
    TaskRemoved,
}

/// Handle to the tracking session actor. Commands are idempotent intents:
/// one that does not match the current phase is silently ignored.
pub struct TrackingController {
    commands: mpsc::Sender<Command>,
    broadcaster: Arc<UpdateBroadcaster>,
}

impl TrackingController {
    /// Spawns the session worker. All session state lives on the worker
    /// task; commands, fixes, ticks and config changes are serialized
    /// through its select loop.
    pub fn spawn(
        provider: Arc<dyn LocationProvider>,
        repository: Arc<dyn TripRepository>,
        settings: &SettingsStore,
        broadcaster: Arc<UpdateBroadcaster>,
    ) -> Self {
        let (commands, cmd_rx) = mpsc::channel(16);

        let worker = SessionWorker {
            provider,
            repository,
            broadcaster: broadcaster.clone(),
            interval_rx: settings.interval_seconds(),
            background_rx: settings.background_enabled(),
            state: SessionState::new(),
            fix_rx: None,
            last_speed_mps: 0.0,
            settings_closed: false,
        };
        tokio::spawn(worker.run(cmd_rx));

        Self {
            commands,
            broadcaster,
        }
    }

    pub async fn start(&self) {
        let _ = self.commands.send(Command::Start).await;
    }

    pub async fn pause(&self) {
        let _ = self.commands.send(Command::Pause).await;
    }

    pub async fn resume(&self) {
        let _ = self.commands.send(Command::Resume).await;
    }

    pub async fn stop(&self) {
        let _ = self.commands.send(Command::Stop).await;
    }

    pub async fn task_removed(&self) {
        let _ = self.commands.send(Command::TaskRemoved).await;
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackingSnapshot> {
        self.broadcaster.subscribe()
    }

    pub fn latest(&self) -> TrackingSnapshot {
        self.broadcaster.latest()
    }
}

struct SessionWorker {
    provider: Arc<dyn LocationProvider>,
    repository: Arc<dyn TripRepository>,
    broadcaster: Arc<UpdateBroadcaster>,
    interval_rx: watch::Receiver<u32>,
    background_rx: watch::Receiver<bool>,
    state: SessionState,
    fix_rx: Option<mpsc::Receiver<LocationFix>>,
    last_speed_mps: f64,
    settings_closed: bool,
}

impl SessionWorker {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mut ticker = ElapsedTicker::new();

        loop {
            let subscribed = self.fix_rx.is_some();
            let running = self.state.phase() == Phase::Active;

            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Start) => {
                        self.handle_start(&mut ticker).await;
                    }
                    Some(Command::Pause) => self.handle_pause().await,
                    Some(Command::Resume) => self.handle_resume().await,
                    Some(Command::Stop) => self.handle_stop().await,
                    Some(Command::TaskRemoved) => self.handle_task_removed().await,
                    None => {
                        // Controller dropped, wind down the session
                        self.handle_stop().await;
                        break;
                    }
                },
                fix = Self::next_fix(&mut self.fix_rx), if subscribed => match fix {
                    Some(fix) => self.handle_fix(fix).await,
                    None => self.fix_rx = None,
                },
                // Gated on the phase, not on having a subscription: a
                // change must also retry a request that failed earlier
                res = self.interval_rx.changed(), if running && !self.settings_closed => {
                    match res {
                        // Re-issue the upstream subscription; the session
                        // itself is untouched
                        Ok(()) => self.request_updates().await,
                        Err(_) => self.settings_closed = true,
                    }
                },
                _ = ticker.tick(), if running => {
                    self.publish(Utc::now());
                }
            }
        }
    }

    async fn next_fix(rx: &mut Option<mpsc::Receiver<LocationFix>>) -> Option<LocationFix> {
        match rx {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    async fn handle_start(&mut self, ticker: &mut ElapsedTicker) {
        if self.state.is_tracking {
            tracing::debug!("Start ignored, session already running");
            return;
        }

        let now = Utc::now();
        let trip_id = match self.repository.create_trip(now).await {
            Ok(id) => id,
            Err(err) => {
                tracing::error!("Failed to create trip: {err}");
                return;
            }
        };

        self.state.start(trip_id, now);
        self.last_speed_mps = 0.0;
        ticker.reset();

        tracing::info!("Trip {trip_id} started");

        self.request_updates().await;
        self.publish(now);
    }

    async fn handle_pause(&mut self) {
        if self.state.phase() != Phase::Active {
            return;
        }

        self.provider.cancel_updates().await;
        self.fix_rx = None;
        self.state.pause(Utc::now());

        tracing::info!("Trip {:?} paused", self.state.trip_id);
        self.publish(Utc::now());
    }

    async fn handle_resume(&mut self) {
        if self.state.phase() != Phase::Paused {
            return;
        }

        self.state.resume(Utc::now());
        tracing::info!("Trip {:?} resumed", self.state.trip_id);

        self.request_updates().await;
        self.publish(Utc::now());
    }

    async fn handle_stop(&mut self) {
        if !self.state.is_tracking {
            return;
        }

        let now = Utc::now();

        // No further fixes may mutate the session once stop begins;
        // anything still buffered is discarded with the receiver
        self.provider.cancel_updates().await;
        self.fix_rx = None;

        if let Some(trip_id) = self.state.trip_id {
            if let Err(err) = self
                .repository
                .finalize_trip(
                    trip_id,
                    now,
                    self.state.distance_meters,
                    self.state.total_paused_ms,
                )
                .await
            {
                tracing::error!("Failed to finalize trip {trip_id}: {err}");
            }
            tracing::info!(
                "Trip {trip_id} stopped after {:.1} m",
                self.state.distance_meters
            );
        }

        self.state.reset();
        self.last_speed_mps = 0.0;
        self.broadcaster.publish(TrackingSnapshot::default());
    }

    async fn handle_task_removed(&mut self) {
        let allow_background = *self.background_rx.borrow();
        if !allow_background {
            tracing::info!("Background tracking disabled, stopping session");
            self.handle_stop().await;
        }
    }

    async fn handle_fix(&mut self, fix: LocationFix) {
        if self.state.phase() != Phase::Active {
            // Late fix after pause/stop
            return;
        }

        let Some(processed) = process_fix(&mut self.state, &fix, Utc::now()) else {
            return;
        };
        self.last_speed_mps = fix.speed_mps;

        if let Err(err) = self.repository.append_sample(&processed.sample).await {
            tracing::error!("Failed to append sample: {err}");
        }

        self.broadcaster.publish(processed.snapshot);

        if processed.stationary_timeout {
            tracing::info!("No movement within {STATIONARY_WINDOW_MS} ms, stopping trip");
            self.handle_stop().await;
        }
    }

    async fn request_updates(&mut self) {
        let interval_secs = (*self.interval_rx.borrow_and_update()).max(1) as u64;
        tracing::debug!("Requesting location updates every {interval_secs} seconds");

        match self
            .provider
            .request_updates(
                Duration::from_secs(interval_secs),
                MIN_UPDATE_DISTANCE_METERS,
            )
            .await
        {
            Ok(rx) => self.fix_rx = Some(rx),
            Err(err) => {
                // Non-fatal: the session stays in its phase, no samples
                // arrive until a later request succeeds
                tracing::warn!("Location update request failed: {err}");
                self.fix_rx = None;
            }
        }
    }

    fn publish(&self, now: chrono::DateTime<Utc>) {
        self.broadcaster
            .publish(self.state.snapshot(self.last_speed_mps, now));
    }
}
