//! Port traits: the hexagonal boundary between the controller and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ZoningController (domain)
//! ```
//!
//! Digital inputs and outputs need no port of their own: the controller
//! consumes the `embedded-hal` digital traits directly.  What remains are
//! the home-automation surfaces (zone status text, the mode selector),
//! the clock and the event sink.

use crate::mode::SystemMode;
use crate::time::Instant;

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Text output (driven adapter: domain → status display)
// ───────────────────────────────────────────────────────────────

/// A writable text entity, e.g. a zone's status line.
pub trait TextOutput {
    fn publish(&mut self, text: &str);
}

// ───────────────────────────────────────────────────────────────
// Mode selector (driven adapter: domain ↔ select entity)
// ───────────────────────────────────────────────────────────────

/// The external eight-position mode selector.
///
/// Written in auto mode, read in manual mode.
pub trait ModeSelect {
    /// Show `mode` on the selector.
    fn publish(&mut self, mode: SystemMode);

    /// Current user selection.  `None` if the entity has no value or holds
    /// a label that is not one of the eight positions.
    fn selected(&mut self) -> Option<SystemMode>;
}

// ───────────────────────────────────────────────────────────────
// Clock (driven adapter: system timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic time since boot.
pub trait Clock {
    fn now(&self) -> Instant;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
