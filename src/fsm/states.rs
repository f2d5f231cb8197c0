//! Concrete phase handler functions and table builder.
//!
//! Each phase is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  IDLE ──[heat/cool call]──▶ RUNNING ──[stage 2 held]──▶ ESCALATED
//!    ▲                           │                            │
//!    │                  [calls clear, min cycle met]          │
//!    │                           ▼                            │
//!    └──────[purge done]────── PURGING ◀──────────────────────┘
//!
//!  RUNNING/ESCALATED ──[calls clear, purge disabled]──▶ IDLE
//! ```
//!
//! Fan-only calls never leave IDLE: they are served with the blower alone
//! and no cycle bookkeeping.

use log::{debug, info, warn};

use super::context::{ActiveMode, ArbiterContext, ZoneSet};
use super::{Phase, PhaseDescriptor};
use crate::zone::Stage;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static phase table.  Called once at startup.
pub fn build_phase_table() -> [PhaseDescriptor; Phase::COUNT] {
    [
        // Index 0: Idle
        PhaseDescriptor {
            id: Phase::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Running
        PhaseDescriptor {
            id: Phase::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: None,
            on_update: running_update,
        },
        // Index 2: Escalated
        PhaseDescriptor {
            id: Phase::Escalated,
            name: "Escalated",
            on_enter: Some(escalated_enter),
            on_exit: None,
            on_update: escalated_update,
        },
        // Index 3: Purging
        PhaseDescriptor {
            id: Phase::Purging,
            name: "Purging",
            on_enter: Some(purging_enter),
            on_exit: Some(purging_exit),
            on_update: purging_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut ArbiterContext<'_>) {
    let state = &mut ctx.state;
    state.active_mode = ActiveMode::None;
    state.active_stage = Stage::None;
    state.cycle_started_at = None;
    state.stage1_started_at = None;
    state.purge_started_at = None;
    state.admitted = ZoneSet::EMPTY;
    info!("IDLE: equipment off, all dampers closing");
}

fn idle_update(ctx: &mut ArbiterContext<'_>) -> Option<Phase> {
    if let Some(mode) = ctx.first_call() {
        ctx.state.active_mode = ActiveMode::from_call(mode);
        ctx.state.admitted = ctx.conditioning_calls(mode);
        return Some(Phase::Running);
    }

    // Fan-only service: blower plus the requesting dampers, nothing else.
    let fans = ctx.fan_only_calls();
    if fans != ctx.state.admitted {
        debug!("Fan-only zones: {:#08b}", fans.bits());
    }
    ctx.state.admitted = fans;
    ctx.state.active_mode = if fans.is_empty() {
        ActiveMode::None
    } else {
        ActiveMode::FanOnly
    };
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING: stage 1
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut ArbiterContext<'_>) {
    let now = ctx.now;
    let state = &mut ctx.state;
    state.active_stage = Stage::Stage1;
    state.cycle_started_at = Some(now);
    state.stage1_started_at = Some(now);
    state.cycle_stopped_at = None;
    state.purge_started_at = None;
    info!(
        "RUNNING: {} stage 1 for zones {:#08b}, min cycle {}s",
        state.active_mode,
        state.admitted.bits(),
        ctx.config.min_cycle_time_ms / 1000
    );
}

fn running_update(ctx: &mut ArbiterContext<'_>) -> Option<Phase> {
    if let Some(next) = cycle_update(ctx) {
        return Some(next);
    }
    if ctx.stage2_due() {
        return Some(Phase::Escalated);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ESCALATED: stage 2, held until the cycle ends
// ═══════════════════════════════════════════════════════════════════════════

fn escalated_enter(ctx: &mut ArbiterContext<'_>) {
    ctx.state.active_stage = Stage::Stage2;
    warn!(
        "ESCALATED: {} stage 2 after {}s of stage-2 demand",
        ctx.state.active_mode,
        ctx.config.stage2_escalation_ms / 1000
    );
}

fn escalated_update(ctx: &mut ArbiterContext<'_>) -> Option<Phase> {
    cycle_update(ctx)
}

// ═══════════════════════════════════════════════════════════════════════════
//  PURGING: blower only, dampers of the last cycle held open
// ═══════════════════════════════════════════════════════════════════════════

fn purging_enter(ctx: &mut ArbiterContext<'_>) {
    ctx.state.purge_started_at = Some(ctx.now);
    ctx.state.active_stage = Stage::None;
    info!(
        "PURGING: fan only for {}s after {} cycle",
        ctx.config.purge_duration_ms / 1000,
        ctx.state.active_mode
    );
}

fn purging_update(ctx: &mut ArbiterContext<'_>) -> Option<Phase> {
    let started = ctx.state.purge_started_at.unwrap_or(ctx.now);
    if ctx.now.has_elapsed(started, ctx.config.purge_duration_ms) {
        info!("PURGING: complete");
        return Some(Phase::Idle);
    }
    None
}

fn purging_exit(ctx: &mut ArbiterContext<'_>) {
    ctx.state.purge_started_at = None;
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared cycle logic
// ═══════════════════════════════════════════════════════════════════════════

/// Admission upkeep and end-of-cycle check for RUNNING and ESCALATED.
///
/// Zones whose call clears are released while others still call.  When
/// the last call clears, its zones stay admitted through the minimum
/// cycle hold and the purge.
fn cycle_update(ctx: &mut ArbiterContext<'_>) -> Option<Phase> {
    let Some(mode) = ctx.state.active_mode.call_mode() else {
        warn!("Cycle running without a conditioning mode, ending it");
        return Some(end_cycle(ctx));
    };

    let serving = ctx.conditioning_calls(mode);
    if serving.is_empty() {
        let started = ctx.state.cycle_started_at.unwrap_or(ctx.now);
        if !ctx.now.has_elapsed(started, ctx.config.min_cycle_time_ms) {
            debug!(
                "Calls satisfied, holding for minimum cycle ({}ms elapsed)",
                ctx.now.millis_since(started)
            );
            return None;
        }
        return Some(end_cycle(ctx));
    }

    for zone in ctx.state.admitted.iter().filter(|&z| !serving.contains(z)) {
        info!("Zone {} satisfied, releasing damper", zone + 1);
    }
    for zone in serving.iter().filter(|&z| !ctx.state.admitted.contains(z)) {
        info!("Zone {} joins the {} cycle", zone + 1, mode_name(ctx.state.active_mode));
    }
    ctx.state.admitted = serving;
    None
}

fn end_cycle(ctx: &mut ArbiterContext<'_>) -> Phase {
    ctx.state.cycle_stopped_at = Some(ctx.now);
    if ctx.config.purge_duration_ms == 0 {
        Phase::Idle
    } else {
        Phase::Purging
    }
}

fn mode_name(mode: ActiveMode) -> &'static str {
    match mode {
        ActiveMode::Heat => "heating",
        ActiveMode::Cool => "cooling",
        ActiveMode::FanOnly => "fan",
        ActiveMode::None => "idle",
    }
}
