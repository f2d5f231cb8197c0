//! Inbound commands to the controller.
//!
//! These represent actions requested by the outside world (the home
//! automation host, a service console) that the
//! [`ZoningController`](super::service::ZoningController) interprets.

/// Commands that external adapters can send into the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Switch between auto (derive and publish the mode) and manual (read
    /// the selector).
    SetAutoMode(bool),

    /// Hot-reload timing parameters.  `None` leaves a value unchanged; the
    /// merged configuration is validated before it is applied.
    UpdateTiming {
        min_cycle_time_ms: Option<u32>,
        purge_duration_ms: Option<u32>,
        stage2_escalation_ms: Option<u32>,
        damper_settle_ms: Option<u32>,
        conflict_alarm_ms: Option<u32>,
    },
}
