pub mod broadcaster;
pub mod controller;
pub mod error;
pub mod providers;
pub mod sample_processor;
pub mod session_state;
pub mod ticker;

pub use broadcaster::UpdateBroadcaster;
pub use controller::TrackingController;
pub use error::EngineError;
pub use providers::{
    ChannelLocationProvider, LocationFix, LocationProvider, SettingsStore, TripRepository,
};
