//! In-memory model of the container: run configuration and current event.

pub mod event;
pub mod run_config;

pub use event::{
    AdcData, CentralTrigger, CurrentEvent, EventRecord, McEvent, McShower, PixelTiming,
    TelescopeEvent, TrackingData,
};
pub use run_config::{CameraGeometry, McRunHeader, PixelSettings, RunConfig, TelescopeConfig};
