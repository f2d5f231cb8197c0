//! Zoning controller: the hexagonal core.
//!
//! [`ZoningController`] owns the zones, the central outputs, the
//! indicators, the fault supervisor and the committed [`SystemState`].
//! The host calls [`ZoningController::tick`] once per poll interval.
//!
//! ```text
//!  zone inputs ──▶ ┌──────────────────────────────┐ ──▶ dampers
//!                  │       ZoningController       │ ──▶ central outputs
//!  mode select ◀──▶│  reader · arbitrator · faults │ ──▶ indicators
//!                  └──────────────────────────────┘ ──▶ EventSink
//! ```
//!
//! ## Tick pipeline
//!
//! 1. Advance damper travel.
//! 2. Sample every zone, run the wiring check, apply any manual-mode
//!    constraint and update call timers.
//! 3. Arbitrate.
//! 4. Command dampers in zone order, then the central outputs.
//! 5. Evaluate faults, drive the indicators, publish mode and zone status.
//! 6. Commit the new state.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;
use log::{debug, info, warn};

use crate::arbitration::EquipmentArbitrator;
use crate::config::{ControllerConfig, ManualPolicy};
use crate::drivers::{CentralOutputs, DamperDriver, IndicatorLevels, StatusIndicators};
use crate::error::{ConfigError, Fault, Result};
use crate::fsm::Phase;
use crate::fsm::context::{OutputDecision, SystemState};
use crate::mode::{ManualConstraint, SystemMode};
use crate::safety::FaultSupervisor;
use crate::sensors::{ZoneCallReader, ZoneInputs};
use crate::time::Instant;
use crate::zone::{
    CallMode, CallState, CallTimer, DamperIntent, DamperState, MAX_ZONES, ZoneId, ZoneSnapshot, ZoneStatus,
};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{EventSink, ModeSelect, TextOutput};

// ───────────────────────────────────────────────────────────────
// Zone wiring
// ───────────────────────────────────────────────────────────────

/// Hardware bindings for one zone.
pub struct ZoneBinding<I, O, T> {
    pub y1: I,
    pub y2: I,
    pub g: I,
    pub ob: I,
    pub damper_open: O,
    pub damper_close: O,
    /// Optional status text entity.
    pub status: Option<T>,
}

struct Zone<I, O, T> {
    inputs: ZoneInputs<I>,
    damper: DamperDriver<O>,
    status_output: Option<T>,
    timer: CallTimer,
    status: ZoneStatus,
    published: bool,
}

impl<I: InputPin, O: OutputPin, T: TextOutput> Zone<I, O, T> {
    fn new(index: ZoneId, binding: ZoneBinding<I, O, T>, config: &ControllerConfig) -> Self {
        Self {
            inputs: ZoneInputs::new(binding.y1, binding.y2, binding.g, binding.ob),
            damper: DamperDriver::new(
                index,
                binding.damper_open,
                binding.damper_close,
                config.damper_settle_ms,
                config.damper_release_ms,
            ),
            status_output: binding.status,
            timer: CallTimer::default(),
            status: ZoneStatus::Off,
            published: false,
        }
    }

    /// Publish `status` if it differs from what the entity shows.
    /// Returns `true` when the status changed.
    fn set_status(&mut self, status: ZoneStatus) -> bool {
        if self.published && self.status == status {
            return false;
        }
        let changed = self.status != status;
        self.status = status;
        self.published = true;
        if let Some(out) = self.status_output.as_mut() {
            out.publish(status.as_str());
        }
        changed
    }
}

// ───────────────────────────────────────────────────────────────
// Builder
// ───────────────────────────────────────────────────────────────

/// Collects bindings and validates them against the configuration.
pub struct ControllerBuilder<I, O, T, M, D> {
    config: ControllerConfig,
    zones: Vec<ZoneBinding<I, O, T>, MAX_ZONES>,
    extra_zones: usize,
    outputs: Option<CentralOutputs<O>>,
    indicators: Option<StatusIndicators<O>>,
    mode_select: Option<M>,
    delay: Option<D>,
}

impl<I, O, T, M, D> ControllerBuilder<I, O, T, M, D>
where
    I: InputPin,
    O: OutputPin,
    T: TextOutput,
    M: ModeSelect,
    D: DelayNs,
{
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            zones: Vec::new(),
            extra_zones: 0,
            outputs: None,
            indicators: None,
            mode_select: None,
            delay: None,
        }
    }

    /// Add the next zone (zone order is binding order).
    pub fn zone(mut self, binding: ZoneBinding<I, O, T>) -> Self {
        if self.zones.push(binding).is_err() {
            self.extra_zones += 1;
        }
        self
    }

    pub fn outputs(mut self, outputs: CentralOutputs<O>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    pub fn indicators(mut self, indicators: StatusIndicators<O>) -> Self {
        self.indicators = Some(indicators);
        self
    }

    pub fn mode_select(mut self, mode_select: M) -> Self {
        self.mode_select = Some(mode_select);
        self
    }

    /// Blocking delay for damper dead-time and zone staggering.
    pub fn delay(mut self, delay: D) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Validate and assemble the controller.
    pub fn build(self) -> Result<ZoningController<I, O, T, M, D>> {
        self.config.validate()?;

        let bound = self.zones.len() + self.extra_zones;
        if bound != self.config.zone_count() {
            return Err(ConfigError::ZoneBindingMismatch {
                configured: self.config.num_zones,
                bound,
            }
            .into());
        }

        let outputs = self.outputs.ok_or(ConfigError::MissingBinding("central outputs"))?;
        let indicators = self.indicators.ok_or(ConfigError::MissingBinding("status indicators"))?;
        let mode_select = self.mode_select.ok_or(ConfigError::MissingBinding("mode select"))?;
        let delay = self.delay.ok_or(ConfigError::MissingBinding("delay"))?;

        let mut zones = Vec::new();
        for (i, binding) in self.zones.into_iter().enumerate() {
            // Same capacity as the builder's vector.
            let _ = zones.push(Zone::new(i, binding, &self.config));
        }

        Ok(ZoningController {
            reader: ZoneCallReader::new(self.config.changeover_polarity),
            arbitrator: EquipmentArbitrator::new(),
            safety: FaultSupervisor::new(&self.config),
            config: self.config,
            zones,
            outputs,
            indicators,
            mode_select,
            delay,
            state: SystemState::new(),
            mode: SystemMode::Off,
            published_mode: None,
            advisory_mismatch: None,
            faults: 0,
            tick_count: 0,
        })
    }
}

// ───────────────────────────────────────────────────────────────
// ZoningController
// ───────────────────────────────────────────────────────────────

/// Top-level controller state machine.
pub struct ZoningController<I, O, T, M, D> {
    config: ControllerConfig,
    reader: ZoneCallReader,
    arbitrator: EquipmentArbitrator,
    safety: FaultSupervisor,
    zones: Vec<Zone<I, O, T>, MAX_ZONES>,
    outputs: CentralOutputs<O>,
    indicators: StatusIndicators<O>,
    mode_select: M,
    delay: D,
    state: SystemState,
    /// Mode derived from the committed state.
    mode: SystemMode,
    /// Last mode written to the selector in auto mode.
    published_mode: Option<SystemMode>,
    /// Last advisory-mode mismatch logged, as (selected, derived).
    advisory_mismatch: Option<(SystemMode, SystemMode)>,
    faults: u8,
    tick_count: u64,
}

impl<I, O, T, M, D> ZoningController<I, O, T, M, D>
where
    I: InputPin,
    O: OutputPin,
    T: TextOutput,
    M: ModeSelect,
    D: DelayNs,
{
    pub fn builder(config: ControllerConfig) -> ControllerBuilder<I, O, T, M, D> {
        ControllerBuilder::new(config)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive everything to a known-safe state and announce startup.
    pub fn start(&mut self, now: Instant, sink: &mut impl EventSink) {
        self.dump_config();

        self.outputs.all_off();
        self.indicators.off();
        for zone in self.zones.iter_mut() {
            let moved = zone.damper.apply(DamperIntent::Closed, now, &mut self.delay);
            if moved && self.config.damper_stagger_ms > 0 {
                self.delay.delay_ms(self.config.damper_stagger_ms);
            }
            zone.set_status(ZoneStatus::Off);
        }
        if self.config.auto_mode {
            self.publish_mode();
        }

        sink.emit(&AppEvent::Started {
            zones: self.config.num_zones,
        });
        info!("Controller started with {} zone(s)", self.zones.len());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one poll cycle.
    pub fn tick(&mut self, now: Instant, sink: &mut impl EventSink) {
        self.tick_count += 1;

        // 1. Damper travel
        for zone in self.zones.iter_mut() {
            zone.damper.service(now);
        }

        // 2. Sample zones
        let selection = if self.config.auto_mode {
            None
        } else {
            self.mode_select.selected()
        };
        let constraint = match (self.config.manual_policy, selection) {
            (ManualPolicy::Constrain, Some(mode)) => mode.constraint(),
            _ => ManualConstraint::None,
        };

        let mut snapshots = [ZoneSnapshot::idle(); MAX_ZONES];
        for (i, zone) in self.zones.iter_mut().enumerate() {
            let (raw_call, levels) = self.reader.sample(i, &mut zone.inputs);
            let faulted = self.safety.observe_wiring(i, levels.stage_without_fan());

            let call = constrain_call(raw_call, constraint);
            let (call_started_at, stage2_since) = zone.timer.observe(&call, now);
            snapshots[i] = ZoneSnapshot {
                call,
                call_started_at,
                stage2_since,
                damper: zone.damper.state(),
                faulted,
            };
        }
        let n = self.zones.len();

        // 3. Arbitrate
        let decision = self.arbitrator.decide(&snapshots[..n], &self.state, &self.config, now);
        if let Some((from, to)) = decision.transition {
            sink.emit(&AppEvent::PhaseChanged { from, to });
        }

        // 4. Dampers in zone order, then central equipment
        for (zone, intent) in self.zones.iter_mut().zip(decision.intents.iter()) {
            let moved = zone.damper.apply(*intent, now, &mut self.delay);
            if moved && self.config.damper_stagger_ms > 0 {
                self.delay.delay_ms(self.config.damper_stagger_ms);
            }
        }
        self.outputs.apply(&decision.outputs);

        // 5. Faults and indicators
        let previous_faults = self.faults;
        self.faults = self.safety.evaluate(decision.oldest_conflict, now);
        for fault in Fault::ALL {
            let was = previous_faults & fault.mask() != 0;
            let is = self.faults & fault.mask() != 0;
            match (was, is) {
                (false, true) => sink.emit(&AppEvent::FaultDetected(fault)),
                (true, false) => sink.emit(&AppEvent::FaultCleared(fault)),
                _ => {}
            }
        }
        self.indicators
            .set(IndicatorLevels::derive(&decision.outputs, self.faults));

        // 6. System mode
        let mode = decision.system_mode();
        if mode != self.mode {
            sink.emit(&AppEvent::ModeChanged { from: self.mode, to: mode });
            self.mode = mode;
        }
        if self.config.auto_mode {
            self.publish_mode();
        } else if self.config.manual_policy == ManualPolicy::Advisory {
            self.check_advisory(selection);
        }

        // 7. Zone status
        for (i, zone) in self.zones.iter_mut().enumerate() {
            let status = decision.statuses.get(i).copied().unwrap_or_default();
            if zone.set_status(status) {
                info!("Zone {} status: {}", i + 1, status);
                sink.emit(&AppEvent::ZoneStatusChanged { zone: i, status });
            }
        }

        debug!(
            "tick {} | phase={:?} mode={} admitted={:#08b} deferred={:?} outputs={:?} faults=0b{:08b}",
            self.tick_count,
            decision.state.phase,
            self.mode,
            decision.state.admitted.bits(),
            decision.state.deferred.as_slice(),
            self.outputs.current(),
            self.faults,
        );

        // 8. Commit
        self.state = decision.state;
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  Invalid timing updates are rejected
    /// and leave the running configuration untouched.
    pub fn handle_command(&mut self, cmd: AppCommand) -> Result<()> {
        match cmd {
            AppCommand::SetAutoMode(auto) => {
                if auto != self.config.auto_mode {
                    info!("Auto mode {}", if auto { "enabled" } else { "disabled" });
                }
                self.config.auto_mode = auto;
                // Re-sync the selector on the next tick.
                self.published_mode = None;
                self.advisory_mismatch = None;
            }
            AppCommand::UpdateTiming {
                min_cycle_time_ms,
                purge_duration_ms,
                stage2_escalation_ms,
                damper_settle_ms,
                conflict_alarm_ms,
            } => {
                let mut candidate = self.config.clone();
                if let Some(v) = min_cycle_time_ms {
                    candidate.min_cycle_time_ms = v;
                }
                if let Some(v) = purge_duration_ms {
                    candidate.purge_duration_ms = v;
                }
                if let Some(v) = stage2_escalation_ms {
                    candidate.stage2_escalation_ms = v;
                }
                if let Some(v) = damper_settle_ms {
                    candidate.damper_settle_ms = v;
                }
                if let Some(v) = conflict_alarm_ms {
                    candidate.conflict_alarm_ms = v;
                }

                if let Err(e) = candidate.validate() {
                    warn!("Timing update rejected: {e}");
                    return Err(e.into());
                }

                for zone in self.zones.iter_mut() {
                    zone.damper.set_settle_ms(candidate.damper_settle_ms);
                }
                self.safety.reconfigure(&candidate);
                self.config = candidate;
                info!("Timing updated at runtime");
                self.config.log_summary();
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// The committed system state.
    pub fn system_state(&self) -> &SystemState {
        &self.state
    }

    pub fn zone_status(&self, zone: ZoneId) -> Option<ZoneStatus> {
        self.zones.get(zone).map(|z| z.status)
    }

    pub fn damper_state(&self, zone: ZoneId) -> Option<DamperState> {
        self.zones.get(zone).map(|z| z.damper.state())
    }

    /// Current fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.faults
    }

    pub fn system_mode(&self) -> SystemMode {
        self.mode
    }

    /// Central output levels actually driven.
    pub fn outputs(&self) -> OutputDecision {
        self.outputs.current()
    }

    pub fn indicators(&self) -> IndicatorLevels {
        self.indicators.current()
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Log the full configuration and bindings.
    pub fn dump_config(&self) {
        self.config.log_summary();
        for (i, zone) in self.zones.iter().enumerate() {
            info!(
                "  Zone {}: Y1/Y2/G/OB inputs, open/close damper, status output {}",
                i + 1,
                if zone.status_output.is_some() { "bound" } else { "none" }
            );
        }
        info!("  Outputs: Y1 Y2 G OB");
        for (name, bound) in self.outputs.bound_optional() {
            info!("  Output {}: {}", name, if bound { "bound" } else { "not bound" });
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn publish_mode(&mut self) {
        if self.published_mode != Some(self.mode) {
            self.mode_select.publish(self.mode);
            self.published_mode = Some(self.mode);
        }
    }

    fn check_advisory(&mut self, selection: Option<SystemMode>) {
        let Some(selected) = selection else {
            self.advisory_mismatch = None;
            return;
        };
        if selected == self.mode {
            self.advisory_mismatch = None;
            return;
        }
        let pair = (selected, self.mode);
        if self.advisory_mismatch != Some(pair) {
            warn!("Mode selector shows '{}' but zones demand '{}'", selected, self.mode);
            self.advisory_mismatch = Some(pair);
        }
    }
}

/// Apply a manual-mode constraint to one zone's decoded call.
pub fn constrain_call(call: CallState, constraint: ManualConstraint) -> CallState {
    match constraint {
        ManualConstraint::None => call,
        ManualConstraint::Off => CallState::IDLE,
        ManualConstraint::FanOnly => {
            if call.is_calling() {
                CallState::fan_only()
            } else {
                CallState::IDLE
            }
        }
        ManualConstraint::Heat | ManualConstraint::Cool if call.is_conditioning() => CallState {
            mode: if constraint == ManualConstraint::Heat {
                CallMode::Heat
            } else {
                CallMode::Cool
            },
            ..call
        },
        ManualConstraint::Heat | ManualConstraint::Cool => call,
    }
}
