//! Equipment arbitration.
//!
//! [`EquipmentArbitrator::decide`] folds every zone's snapshot and the
//! current [`SystemState`] into one [`Decision`]: the next state, the
//! central output levels, one damper intent per zone and the per-zone
//! display status.  It is a pure function of its inputs (the phase FSM it
//! steps holds no state of its own), so the controller stays the single
//! owner of `SystemState`.
//!
//! ## Pipeline
//!
//! ```text
//!  snapshots ─┐
//!  state ─────┼─▶ FSM step ─▶ requested outputs ─▶ damper gating ─▶ Decision
//!  config ────┘        │                                              ▲
//!                      └──▶ admitted / deferred / statuses ───────────┘
//! ```
//!
//! Arbitration never fails: a stale conflict is reported through
//! [`Decision::oldest_conflict`] for the fault supervisor, not by refusing
//! to decide.

use heapless::Vec;
use log::{debug, warn};

use crate::config::ControllerConfig;
use crate::fsm::context::{ActiveMode, ArbiterContext, OutputDecision, SystemState};
use crate::fsm::{Fsm, Phase};
use crate::mode::SystemMode;
use crate::time::Instant;
use crate::zone::{DamperIntent, DamperState, MAX_ZONES, Stage, ZoneId, ZoneSnapshot, ZoneStatus};

/// Result of one arbitration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Next system state, to be committed by the caller.
    pub state: SystemState,
    /// Central output levels after damper gating.
    pub outputs: OutputDecision,
    /// Desired damper position, indexed by zone.
    pub intents: Vec<DamperIntent, MAX_ZONES>,
    /// Display status, indexed by zone (wiring faults are overlaid by the
    /// controller).
    pub statuses: Vec<ZoneStatus, MAX_ZONES>,
    /// Call start of the longest-waiting opposing-mode zone.
    pub oldest_conflict: Option<Instant>,
    /// Phase transition taken this tick, if any.
    pub transition: Option<(Phase, Phase)>,
}

impl Decision {
    /// Selector position matching the next state.
    pub fn system_mode(&self) -> SystemMode {
        SystemMode::from_state(&self.state)
    }
}

/// Stateless arbitration engine around the phase FSM.
pub struct EquipmentArbitrator {
    fsm: Fsm,
}

impl EquipmentArbitrator {
    pub fn new() -> Self {
        Self { fsm: Fsm::default() }
    }

    /// Decide the next state and outputs.
    ///
    /// `zones` is indexed by zone; entries beyond [`MAX_ZONES`] are ignored.
    pub fn decide(
        &self,
        zones: &[ZoneSnapshot],
        state: &SystemState,
        config: &ControllerConfig,
        now: Instant,
    ) -> Decision {
        // Faulted zones take part as idle zones whatever their inputs say.
        let zones: Vec<ZoneSnapshot, MAX_ZONES> = zones
            .iter()
            .take(MAX_ZONES)
            .map(|z| {
                if z.faulted {
                    ZoneSnapshot {
                        damper: z.damper,
                        faulted: true,
                        ..ZoneSnapshot::idle()
                    }
                } else {
                    *z
                }
            })
            .collect();
        let zones = zones.as_slice();

        let mut ctx = ArbiterContext::new(zones, state.clone(), config, now);
        let transition = self.fsm.step(&mut ctx);
        let mut next = ctx.state;

        // ── Faulted zones ─────────────────────────────────────────
        let had_zones = !next.admitted.is_empty();
        for (zone, _) in zones.iter().enumerate().filter(|(_, z)| z.faulted) {
            if next.admitted.contains(zone) {
                warn!("Zone {} faulted, closing its damper", zone + 1);
                next.admitted.remove(zone);
            }
        }
        // A cycle whose every zone faulted runs out its timers with the
        // central unit off.
        let stranded = next.phase != Phase::Idle && next.admitted.is_empty();
        if stranded && had_zones {
            warn!("No healthy zone left to serve, central unit off");
        }

        // ── Outputs ───────────────────────────────────────────────
        let requested = if stranded {
            OutputDecision::all_off()
        } else {
            requested_outputs(&next, config)
        };
        let dampers_ready = next
            .admitted
            .iter()
            .all(|z| zones.get(z).is_some_and(|s| s.damper == DamperState::Open));
        let outputs = gate_outputs(requested, next.energized, dampers_ready);
        if outputs != requested {
            debug!("Outputs held until admitted dampers are open");
        }
        next.energized = outputs;

        // ── Pending calls ─────────────────────────────────────────
        next.deferred = deferred_zones(zones, &next);
        let oldest_conflict = oldest_conflict(zones, &next);

        // ── Per-zone results ──────────────────────────────────────
        let mut intents = Vec::new();
        let mut statuses = Vec::new();
        for (zone, snapshot) in zones.iter().enumerate() {
            let intent = if next.admitted.contains(zone) {
                DamperIntent::Open
            } else {
                DamperIntent::Closed
            };
            // Capacity equals MAX_ZONES and `zones` is truncated to it.
            let _ = intents.push(intent);
            let _ = statuses.push(zone_status(zone, snapshot, &next));
        }

        Decision {
            state: next,
            outputs,
            intents,
            statuses,
            oldest_conflict,
            transition,
        }
    }
}

impl Default for EquipmentArbitrator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Output mapping
// ---------------------------------------------------------------------------

/// Terminal levels the phase asks for, before damper gating.
pub fn requested_outputs(state: &SystemState, config: &ControllerConfig) -> OutputDecision {
    let mut out = OutputDecision::all_off();
    let stage2 = state.active_stage == Stage::Stage2;

    match state.phase {
        Phase::Idle => {
            out.g = state.active_mode == ActiveMode::FanOnly;
        }
        Phase::Running | Phase::Escalated => match state.active_mode {
            ActiveMode::Heat => {
                out.y1 = true;
                out.g = true;
                out.w1e = true;
                out.w2 = stage2;
            }
            ActiveMode::Cool => {
                out.y1 = true;
                out.g = true;
                out.ob = true;
                out.y2 = stage2;
            }
            ActiveMode::FanOnly => out.g = true,
            ActiveMode::None => {}
        },
        Phase::Purging => {
            out.g = true;
            out.ob = config.hold_reversing_valve_in_purge && state.active_mode == ActiveMode::Cool;
        }
    }
    out
}

/// Hold back outputs that were off last tick while admitted dampers are
/// still travelling.  Outputs already on stay on.
pub fn gate_outputs(requested: OutputDecision, previous: OutputDecision, dampers_ready: bool) -> OutputDecision {
    if dampers_ready {
        return requested;
    }
    let keep = |req: bool, prev: bool| req && prev;
    OutputDecision {
        y1: keep(requested.y1, previous.y1),
        y2: keep(requested.y2, previous.y2),
        g: keep(requested.g, previous.g),
        ob: keep(requested.ob, previous.ob),
        w1e: keep(requested.w1e, previous.w1e),
        w2: keep(requested.w2, previous.w2),
        w3: keep(requested.w3, previous.w3),
    }
}

// ---------------------------------------------------------------------------
// Pending calls and status
// ---------------------------------------------------------------------------

/// Calling zones not currently admitted, oldest call first.
fn deferred_zones(zones: &[ZoneSnapshot], state: &SystemState) -> Vec<ZoneId, MAX_ZONES> {
    let mut deferred: Vec<ZoneId, MAX_ZONES> = zones
        .iter()
        .enumerate()
        .filter(|(i, z)| z.call.is_calling() && !state.admitted.contains(*i))
        .map(|(i, _)| i)
        .collect();
    deferred.sort_unstable_by_key(|&i| (zones[i].call_started_at, i));
    deferred
}

/// Oldest call start among deferred zones asking for the opposite mode.
fn oldest_conflict(zones: &[ZoneSnapshot], state: &SystemState) -> Option<Instant> {
    let active = state.active_mode.call_mode()?;
    state
        .deferred
        .iter()
        .filter_map(|&i| zones.get(i))
        .filter(|z| z.call.is_conditioning() && z.call.mode != active)
        .filter_map(|z| z.call_started_at)
        .min()
}

fn zone_status(zone: ZoneId, snapshot: &ZoneSnapshot, state: &SystemState) -> ZoneStatus {
    if snapshot.faulted {
        return ZoneStatus::Error;
    }
    if !state.admitted.contains(zone) {
        return if snapshot.call.is_calling() {
            ZoneStatus::Wait
        } else {
            ZoneStatus::Off
        };
    }
    match (state.phase, state.active_mode, state.active_stage) {
        (Phase::Purging, _, _) => ZoneStatus::Purge,
        (_, ActiveMode::Heat, Stage::Stage2) => ZoneStatus::HeatingStage2,
        (_, ActiveMode::Heat, _) => ZoneStatus::HeatingStage1,
        (_, ActiveMode::Cool, Stage::Stage2) => ZoneStatus::CoolingStage2,
        (_, ActiveMode::Cool, _) => ZoneStatus::CoolingStage1,
        (_, ActiveMode::FanOnly, _) => ZoneStatus::FanOnly,
        (_, ActiveMode::None, _) => ZoneStatus::Off,
    }
}
