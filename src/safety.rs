//! Fault supervisor.
//!
//! Runs every tick **after arbitration** and accumulates a fault bitmask
//! that drives the error indicator.  Unlike a safety interlock it never
//! changes what the equipment does: arbitration is total and keeps
//! running whatever the mask says.
//!
//! ## Fault lifecycle
//!
//! 1. A condition is observed (e.g. a deferred cooling call older than
//!    `conflict_alarm_ms`).
//! 2. The supervisor sets the corresponding bit and logs it once.
//! 3. Each tick it re-evaluates; when the condition clears, the bit is
//!    unset and the clearance logged.
//!
//! The missing-fan check needs two consecutive observations before it
//! latches, so a thermostat that raises Y1 a tick before G is not flagged.

use log::{error, info, warn};

use crate::config::ControllerConfig;
use crate::error::Fault;
use crate::time::Instant;
use crate::zone::{MAX_ZONES, ZoneId};

/// Consecutive observations needed to confirm a wiring fault.
const WIRING_CONFIRM_TICKS: u8 = 2;

/// Fault supervisor.
pub struct FaultSupervisor {
    conflict_alarm_ms: u32,
    detect_missing_fan: bool,
    /// Latched fault bitmask.
    faults: u8,
    /// Per-zone count of consecutive stage-without-fan observations.
    wiring_counts: [u8; MAX_ZONES],
}

impl FaultSupervisor {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            conflict_alarm_ms: config.conflict_alarm_ms,
            detect_missing_fan: config.detect_missing_fan,
            faults: 0,
            wiring_counts: [0; MAX_ZONES],
        }
    }

    /// Pick up changed thresholds after a configuration reload.
    pub fn reconfigure(&mut self, config: &ControllerConfig) {
        self.conflict_alarm_ms = config.conflict_alarm_ms;
        self.detect_missing_fan = config.detect_missing_fan;
        if !self.detect_missing_fan {
            self.wiring_counts = [0; MAX_ZONES];
        }
    }

    /// Record whether `zone` asserted a stage call without its fan input
    /// this tick.  Returns `true` once the fault is confirmed for that zone.
    pub fn observe_wiring(&mut self, zone: ZoneId, stage_without_fan: bool) -> bool {
        if !self.detect_missing_fan || zone >= MAX_ZONES {
            return false;
        }
        let count = &mut self.wiring_counts[zone];
        if stage_without_fan {
            *count = count.saturating_add(1);
            if *count == 1 {
                warn!("Zone {} stage call without fan (count: 1/{})", zone + 1, WIRING_CONFIRM_TICKS);
            }
        } else if *count > 0 {
            info!("Zone {} wiring check cleared (was at count: {})", zone + 1, *count);
            *count = 0;
        }
        *count >= WIRING_CONFIRM_TICKS
    }

    /// Evaluate every fault condition for this tick.
    ///
    /// `oldest_conflict` is the call start of the longest-waiting
    /// opposing-mode zone, if any.  Returns the updated bitmask.
    pub fn evaluate(&mut self, oldest_conflict: Option<Instant>, now: Instant) -> u8 {
        // ── Conflict deferred beyond bound ────────────────────────
        let overdue = oldest_conflict.is_some_and(|since| now.has_elapsed(since, self.conflict_alarm_ms));
        self.eval_fault(Fault::ConflictDeferred, overdue);

        // ── Thermostat wiring ─────────────────────────────────────
        let miswired = self.wiring_counts.iter().any(|&c| c >= WIRING_CONFIRM_TICKS);
        self.eval_fault(Fault::MissingFanCall, miswired);

        self.faults
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is active.
    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: Fault) -> bool {
        self.faults & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: Fault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
