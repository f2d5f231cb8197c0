//! Function-pointer finite state machine engine for the system phase.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  PhaseTable                                               │
//! │  ┌───────────┬───────────┬──────────┬───────────────────┐ │
//! │  │ Phase     │ on_enter  │ on_exit  │ on_update         │ │
//! │  ├───────────┼───────────┼──────────┼───────────────────┤ │
//! │  │ Idle      │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Running   │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Escalated │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Purging   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │ │
//! │  └───────────┴───────────┴──────────┴───────────────────┘ │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike a free-running FSM, the engine holds **no** current-state
//! pointer: the phase lives in [`SystemState`](context::SystemState),
//! which the controller owns and threads through every call.  Each
//! [`Fsm::step`] calls `on_update` for `ctx.state.phase`; if it returns
//! `Some(next)`, the engine runs `on_exit` for the current phase, stores
//! the new phase, then runs `on_enter` for it.

pub mod context;
pub mod states;

use context::ArbiterContext;
use log::info;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// System-wide equipment phase.
/// Must stay in sync with the table built in [`states::build_phase_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    /// No conditioning cycle.  Fan-only calls may still be served.
    #[default]
    Idle = 0,
    /// Conditioning cycle at stage 1.
    Running = 1,
    /// Conditioning cycle escalated to stage 2.
    Escalated = 2,
    /// Post-cycle fan-only duct purge.
    Purging = 3,
}

impl Phase {
    /// Total number of phases: used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `Phase`.  Panics on out-of-range in debug
    /// builds; returns `Idle` in release (equipment-off fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Escalated,
            3 => Self::Purging,
            _ => {
                debug_assert!(false, "invalid phase index: {idx}");
                Self::Idle
            }
        }
    }

    /// A conditioning cycle is in progress (min-cycle guard applies).
    pub fn is_cycling(self) -> bool {
        matches!(self, Self::Running | Self::Escalated)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each phase transition.
pub type PhaseActionFn = fn(&mut ArbiterContext<'_>);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type PhaseUpdateFn = fn(&mut ArbiterContext<'_>) -> Option<Phase>;

// ---------------------------------------------------------------------------
// Phase descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single phase.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct PhaseDescriptor {
    pub id: Phase,
    pub name: &'static str,
    pub on_enter: Option<PhaseActionFn>,
    pub on_exit: Option<PhaseActionFn>,
    pub on_update: PhaseUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The phase state machine engine.
///
/// Owns only the phase table; the current phase is carried by the
/// context so the engine itself is immutable and shareable.
pub struct Fsm {
    /// Fixed-size table indexed by `Phase as usize`.
    table: [PhaseDescriptor; Phase::COUNT],
}

impl Fsm {
    /// Construct a new FSM with the given phase table.
    pub fn new(table: [PhaseDescriptor; Phase::COUNT]) -> Self {
        Self { table }
    }

    /// Advance one tick.
    ///
    /// 1. Call `on_update` for the context's current phase.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update phase → `on_enter(next)`.
    ///
    /// Returns the `(from, to)` pair when a transition happened.
    pub fn step(&self, ctx: &mut ArbiterContext<'_>) -> Option<(Phase, Phase)> {
        let current = ctx.state.phase;
        let next = (self.table[current as usize].on_update)(ctx)?;
        self.transition(next, ctx);
        Some((current, next))
    }

    /// Force an immediate transition, bypassing `on_update`.  Lets tests
    /// exercise enter/exit hooks from an arbitrary phase.
    #[cfg(test)]
    pub(crate) fn force_transition(&self, next: Phase, ctx: &mut ArbiterContext<'_>) {
        if next != ctx.state.phase {
            self.transition(next, ctx);
        }
    }

    /// Display name of a phase.
    pub fn name(&self, phase: Phase) -> &'static str {
        self.table[phase as usize].name
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&self, next: Phase, ctx: &mut ArbiterContext<'_>) {
        let current = ctx.state.phase;

        info!(
            "Phase transition: {} -> {}",
            self.table[current as usize].name, self.table[next as usize].name
        );

        // Exit current phase
        if let Some(exit) = self.table[current as usize].on_exit {
            exit(ctx);
        }

        ctx.state.phase = next;

        // Enter new phase
        if let Some(enter) = self.table[next as usize].on_enter {
            enter(ctx);
        }
    }
}

impl Default for Fsm {
    fn default() -> Self {
        Self::new(states::build_phase_table())
    }
}
