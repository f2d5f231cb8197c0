//! Outbound application events.
//!
//! The [`ZoningController`](super::service::ZoningController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.

use crate::error::Fault;
use crate::fsm::Phase;
use crate::mode::SystemMode;
use crate::zone::{ZoneId, ZoneStatus};

/// Structured events emitted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started with this many zones.
    Started { zones: u8 },

    /// The system phase changed.
    PhaseChanged { from: Phase, to: Phase },

    /// The derived system mode changed.
    ModeChanged { from: SystemMode, to: SystemMode },

    /// A zone's display status changed.
    ZoneStatusChanged { zone: ZoneId, status: ZoneStatus },

    /// A fault was raised.  One event per fault.
    FaultDetected(Fault),

    /// A fault cleared.  Other faults may still be active.
    FaultCleared(Fault),
}
