//! Sensor subsystem: zone thermostat inputs.
//!
//! Each zone owns a [`ZoneInputs`] bundle; the stateless
//! [`ZoneCallReader`] turns a sample of it into a
//! [`CallState`](crate::zone::CallState) every tick.

pub mod thermostat;

pub use thermostat::{RawLevels, ZoneCallReader, ZoneInputs, decode};
