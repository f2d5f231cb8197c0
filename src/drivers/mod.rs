//! Actuator drivers: zone dampers, central equipment relays and the
//! front-panel indicators.

pub mod damper;
pub mod equipment;
pub mod status_led;

pub use damper::DamperDriver;
pub use equipment::CentralOutputs;
pub use status_led::{IndicatorLevels, StatusIndicators};
