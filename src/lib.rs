//! OpenZone controller library.
//!
//! All arbitration, sequencing and fault logic lives here and builds on
//! the host for testing.  The firmware binary (`espidf` feature) only
//! binds board pins and runs the poll loop.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod arbitration;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod mode;
pub mod pins;
pub mod safety;
pub mod sensors;
pub mod time;
pub mod zone;

pub use app::service::{ControllerBuilder, ZoneBinding, ZoningController};
pub use arbitration::{Decision, EquipmentArbitrator};
pub use config::ControllerConfig;
pub use error::{ConfigError, Error, Fault, Result};
pub use fsm::Phase;
pub use fsm::context::{ActiveMode, OutputDecision, SystemState};
pub use mode::SystemMode;
pub use time::Instant;
