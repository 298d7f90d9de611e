pub mod geo;
pub mod snapshot;
pub mod track_sample;
pub mod trip;
