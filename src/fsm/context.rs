//! Blackboard threaded through every phase handler.
//!
//! `ArbiterContext` bundles this tick's zone snapshots, the configuration,
//! the current time and a **working copy** of [`SystemState`].  Handlers
//! read the snapshots and mutate the working state; once the FSM has
//! stepped, the arbitrator derives outputs and damper intents from it and
//! hands it back to the controller as the next committed state.

use core::fmt;

use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::Phase;
use crate::config::ControllerConfig;
use crate::time::Instant;
use crate::zone::{CallMode, MAX_ZONES, Stage, ZoneId, ZoneSnapshot};

// ---------------------------------------------------------------------------
// Active mode
// ---------------------------------------------------------------------------

/// What the central equipment is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActiveMode {
    #[default]
    None,
    FanOnly,
    Heat,
    Cool,
}

impl ActiveMode {
    pub fn from_call(mode: CallMode) -> Self {
        match mode {
            CallMode::Heat => Self::Heat,
            CallMode::Cool => Self::Cool,
            CallMode::Off => Self::None,
        }
    }

    /// The conditioning call this mode serves, if any.
    pub fn call_mode(self) -> Option<CallMode> {
        match self {
            Self::Heat => Some(CallMode::Heat),
            Self::Cool => Some(CallMode::Cool),
            Self::None | Self::FanOnly => None,
        }
    }
}

impl fmt::Display for ActiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::FanOnly => "fan",
            Self::Heat => "heat",
            Self::Cool => "cool",
        })
    }
}

// ---------------------------------------------------------------------------
// Zone set
// ---------------------------------------------------------------------------

/// Bitmask of zone indices (bit `n` = zone `n`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ZoneSet(u8);

impl ZoneSet {
    pub const EMPTY: Self = Self(0);

    pub fn insert(&mut self, zone: ZoneId) {
        if zone < MAX_ZONES {
            self.0 |= 1 << zone;
        }
    }

    pub fn remove(&mut self, zone: ZoneId) {
        if zone < MAX_ZONES {
            self.0 &= !(1 << zone);
        }
    }

    pub fn contains(self, zone: ZoneId) -> bool {
        zone < MAX_ZONES && self.0 & (1 << zone) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Zone indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = ZoneId> {
        (0..MAX_ZONES).filter(move |&z| self.contains(z))
    }
}

impl FromIterator<ZoneId> for ZoneSet {
    fn from_iter<T: IntoIterator<Item = ZoneId>>(iter: T) -> Self {
        let mut set = Self::EMPTY;
        for zone in iter {
            set.insert(zone);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Central outputs (written by the arbitrator; consumed by the controller)
// ---------------------------------------------------------------------------

/// Desired level of every central equipment terminal.
///
/// `w2` is the heat stage-2 request; the output driver routes it to Y2
/// on boards without a dedicated W2 relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OutputDecision {
    pub y1: bool,
    pub y2: bool,
    pub g: bool,
    pub ob: bool,
    pub w1e: bool,
    pub w2: bool,
    pub w3: bool,
}

impl OutputDecision {
    /// All outputs de-energized: safe default.
    pub const fn all_off() -> Self {
        Self {
            y1: false,
            y2: false,
            g: false,
            ob: false,
            w1e: false,
            w2: false,
            w3: false,
        }
    }

    pub fn any(&self) -> bool {
        self.y1 || self.y2 || self.g || self.ob || self.w1e || self.w2 || self.w3
    }
}

// ---------------------------------------------------------------------------
// System state (owned by the controller, passed explicitly)
// ---------------------------------------------------------------------------

/// The complete arbitration state carried from one tick to the next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemState {
    pub phase: Phase,
    pub active_mode: ActiveMode,
    pub active_stage: Stage,
    pub cycle_started_at: Option<Instant>,
    pub cycle_stopped_at: Option<Instant>,
    pub stage1_started_at: Option<Instant>,
    pub purge_started_at: Option<Instant>,
    /// Zones whose dampers are commanded open.
    pub admitted: ZoneSet,
    /// Calling zones waiting for service, oldest call first.
    pub deferred: Vec<ZoneId, MAX_ZONES>,
    /// Outputs driven on the previous tick.  Used to gate newly energized
    /// outputs behind damper travel.
    pub energized: OutputDecision,
}

impl SystemState {
    /// Boot state: idle, nothing admitted, everything off.
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// ArbiterContext
// ---------------------------------------------------------------------------

/// The context passed to every phase handler.
pub struct ArbiterContext<'a> {
    /// This tick's zone snapshots, indexed by zone.
    pub zones: &'a [ZoneSnapshot],
    pub config: &'a ControllerConfig,
    pub now: Instant,
    /// Working copy; becomes the next committed state.
    pub state: SystemState,
}

impl<'a> ArbiterContext<'a> {
    pub fn new(zones: &'a [ZoneSnapshot], state: SystemState, config: &'a ControllerConfig, now: Instant) -> Self {
        Self {
            zones,
            config,
            now,
            state,
        }
    }

    /// Zones with a heat or cool call of `mode`.
    pub fn conditioning_calls(&self, mode: CallMode) -> ZoneSet {
        self.zones
            .iter()
            .enumerate()
            .filter(|(_, z)| z.call.is_conditioning() && z.call.mode == mode)
            .map(|(i, _)| i)
            .collect()
    }

    /// Zones asking for fan circulation only.
    pub fn fan_only_calls(&self) -> ZoneSet {
        self.zones
            .iter()
            .enumerate()
            .filter(|(_, z)| z.call.is_fan_only())
            .map(|(i, _)| i)
            .collect()
    }

    /// Mode of the oldest conditioning call.
    ///
    /// Ties on `call_started_at` go to heat, then to the lower zone index.
    pub fn first_call(&self) -> Option<CallMode> {
        self.zones
            .iter()
            .enumerate()
            .filter(|(_, z)| z.call.is_conditioning())
            .min_by_key(|(i, z)| {
                let heat_first = u8::from(z.call.mode != CallMode::Heat);
                (z.call_started_at.unwrap_or(self.now), heat_first, *i)
            })
            .map(|(_, z)| z.call.mode)
    }

    /// An admitted zone has held stage 2 for the escalation delay, counted
    /// from when both its stage-2 input and the stage-1 cycle were up.
    pub fn stage2_due(&self) -> bool {
        let Some(stage1_start) = self.state.stage1_started_at else {
            return false;
        };
        let Some(mode) = self.state.active_mode.call_mode() else {
            return false;
        };
        self.state.admitted.iter().any(|zone| {
            let Some(snapshot) = self.zones.get(zone) else {
                return false;
            };
            if !snapshot.call.is_conditioning() || snapshot.call.mode != mode {
                return false;
            }
            snapshot.stage2_since.is_some_and(|since| {
                let held_from = since.max(stage1_start);
                self.now.has_elapsed(held_from, self.config.stage2_escalation_ms)
            })
        })
    }
}
