//! Zone-level domain types.
//!
//! A zone is one thermostat-controlled duct branch: four thermostat inputs
//! (Y1, Y2, G, O/B changeover), one two-wire damper actuator, and an
//! optional status text output.  This module holds the plain data that the
//! reader, the arbitrator and the controller exchange about a zone.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::time::Instant;

/// Hard upper bound on configured zones.  Sizes every fixed-capacity
/// collection in the crate.
pub const MAX_ZONES: usize = 6;

/// Zero-based zone index.  Logged 1-based, as printed on the board.
pub type ZoneId = usize;

// ---------------------------------------------------------------------------
// Call state (output of the ZoneCallReader)
// ---------------------------------------------------------------------------

/// Which conditioning a zone is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CallMode {
    Heat,
    Cool,
    #[default]
    Off,
}

/// Requested equipment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    None,
    Stage1,
    Stage2,
}

/// Decoded thermostat demand for one zone on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallState {
    pub mode: CallMode,
    pub stage: Stage,
    pub fan_requested: bool,
}

impl CallState {
    /// No demand at all.
    pub const IDLE: Self = Self {
        mode: CallMode::Off,
        stage: Stage::None,
        fan_requested: false,
    };

    pub const fn heat(stage: Stage) -> Self {
        Self {
            mode: CallMode::Heat,
            stage,
            fan_requested: true,
        }
    }

    pub const fn cool(stage: Stage) -> Self {
        Self {
            mode: CallMode::Cool,
            stage,
            fan_requested: true,
        }
    }

    pub const fn fan_only() -> Self {
        Self {
            mode: CallMode::Off,
            stage: Stage::None,
            fan_requested: true,
        }
    }

    /// Any demand, conditioning or fan.
    pub fn is_calling(&self) -> bool {
        self.stage != Stage::None || self.fan_requested
    }

    /// Demand for heating or cooling (a compressor / burner call).
    pub fn is_conditioning(&self) -> bool {
        self.stage != Stage::None && self.mode != CallMode::Off
    }

    /// Fan circulation only.
    pub fn is_fan_only(&self) -> bool {
        self.fan_requested && !self.is_conditioning()
    }
}

// ---------------------------------------------------------------------------
// Damper
// ---------------------------------------------------------------------------

/// Physical damper position as tracked by the damper driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamperState {
    Open,
    Closed,
    Opening,
    Closing,
}

impl DamperState {
    /// Still travelling (no airflow guarantee yet).
    pub fn is_moving(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }
}

/// Position the arbitrator wants a damper to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DamperIntent {
    Open,
    #[default]
    Closed,
}

// ---------------------------------------------------------------------------
// Per-tick zone snapshot (input to the arbitrator)
// ---------------------------------------------------------------------------

/// Everything the arbitrator needs to know about one zone on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneSnapshot {
    pub call: CallState,
    /// Set on the tick the zone started calling; `None` while idle.
    pub call_started_at: Option<Instant>,
    /// Start of the current continuous stage-2 assertion.
    pub stage2_since: Option<Instant>,
    pub damper: DamperState,
    /// Confirmed thermostat wiring fault: the zone is left out of
    /// arbitration and its damper is closed.
    pub faulted: bool,
}

impl ZoneSnapshot {
    pub const fn idle() -> Self {
        Self {
            call: CallState::IDLE,
            call_started_at: None,
            stage2_since: None,
            damper: DamperState::Closed,
            faulted: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Call-timing tracker (lives in the controller, one per zone)
// ---------------------------------------------------------------------------

/// Tracks `call_started_at` and `stage2_since` across ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallTimer {
    call_started_at: Option<Instant>,
    stage2_since: Option<Instant>,
}

impl CallTimer {
    /// Fold this tick's call state in and return the updated timestamps.
    pub fn observe(&mut self, call: &CallState, now: Instant) -> (Option<Instant>, Option<Instant>) {
        if call.is_calling() {
            if self.call_started_at.is_none() {
                self.call_started_at = Some(now);
            }
        } else {
            self.call_started_at = None;
        }

        if call.stage == Stage::Stage2 {
            if self.stage2_since.is_none() {
                self.stage2_since = Some(now);
            }
        } else {
            self.stage2_since = None;
        }

        (self.call_started_at, self.stage2_since)
    }
}

// ---------------------------------------------------------------------------
// Zone display status
// ---------------------------------------------------------------------------

/// Human-facing state of a zone, published to its status text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ZoneStatus {
    #[default]
    Off,
    FanOnly,
    CoolingStage1,
    CoolingStage2,
    HeatingStage1,
    HeatingStage2,
    Purge,
    /// Calling, but held pending (opposing mode, purge in progress, or
    /// fan-only while a conditioning cycle runs).
    Wait,
    /// Thermostat wiring fault (stage call without fan).
    Error,
}

impl ZoneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::FanOnly => "Fan Only",
            Self::CoolingStage1 => "Cooling Stage 1",
            Self::CoolingStage2 => "Cooling Stage 2",
            Self::HeatingStage1 => "Heating Stage 1",
            Self::HeatingStage2 => "Heating Stage 2",
            Self::Purge => "Purge",
            Self::Wait => "Wait",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
