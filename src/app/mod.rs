//! Application core: orchestration, zero direct I/O.
//!
//! [`service::ZoningController`] runs the per-tick pipeline over the
//! drivers and the arbitrator.  Everything it cannot reach through an
//! `embedded-hal` pin goes through a **port trait** in [`ports`], keeping
//! this layer testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
