//! End-to-end tests: thermostat pins → controller → dampers, relays,
//! indicators and entities.

use crate::mock_hw::Rig;

use openzone::app::commands::AppCommand;
use openzone::app::events::AppEvent;
use openzone::config::ManualPolicy;
use openzone::zone::{DamperState, ZoneStatus};
use openzone::{ControllerConfig, Fault, Phase, SystemMode};

fn config(zones: u8) -> ControllerConfig {
    ControllerConfig::with_zones(zones)
}

// ── Core scenarios ────────────────────────────────────────────

#[test]
fn single_zone_heat_cycle_min_cycle_and_purge() {
    let mut rig = Rig::new(config(1));

    rig.zone(0).heat(false);
    rig.tick_at(0);
    assert_eq!(rig.controller.phase(), Phase::Running);
    assert!(!rig.outputs.y1.get(), "equipment waits for the damper");
    assert_eq!(rig.controller.damper_state(0), Some(DamperState::Opening));
    assert!(!rig.leds.heat.get() && !rig.leds.fan.get(), "indicators follow energized outputs");

    rig.tick_at(10);
    assert_eq!(rig.controller.phase(), Phase::Running);
    assert!(rig.outputs.y1.get() && rig.outputs.g.get() && rig.outputs.w1e.get());
    assert!(!rig.outputs.ob.get());
    assert!(rig.zone(0).damper_open());
    assert_eq!(rig.controller.damper_state(0), Some(DamperState::Open));
    assert!(rig.leds.heat.get() && rig.leds.fan.get());

    rig.zone(0).idle();
    for t in (50..480).step_by(10) {
        rig.tick_at(t);
        assert_eq!(rig.controller.phase(), Phase::Running, "short-cycle guard at t={t}");
        assert!(rig.outputs.y1.get());
    }

    rig.tick_at(480);
    assert_eq!(rig.controller.phase(), Phase::Purging);
    assert!(!rig.outputs.y1.get() && !rig.outputs.w1e.get());
    assert!(rig.outputs.g.get());
    assert!(rig.zone(0).damper_open(), "last zone stays open through purge");
    assert_eq!(rig.zone(0).status.last().as_deref(), Some("Purge"));
    assert_eq!(rig.controller.system_mode(), SystemMode::PurgeHeat);

    rig.run(490, 770, 10);
    assert_eq!(rig.controller.phase(), Phase::Purging);

    rig.tick_at(780);
    assert_eq!(rig.controller.phase(), Phase::Idle);
    assert!(!rig.outputs.g.get());
    assert!(rig.zone(0).close.get() && !rig.zone(0).open.get());
    assert_eq!(rig.zone(0).status.last().as_deref(), Some("Off"));

    let phases: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::PhaseChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            (Phase::Idle, Phase::Running),
            (Phase::Running, Phase::Purging),
            (Phase::Purging, Phase::Idle),
        ]
    );
}

#[test]
fn opposing_call_deferred_until_idle() {
    let mut rig = Rig::new(config(2));

    rig.zone(0).heat(false);
    rig.tick_at(0);
    rig.zone(1).cool(false);
    rig.tick_at(5);
    assert_eq!(rig.zone(1).status.last().as_deref(), Some("Wait"));
    assert_eq!(rig.controller.system_state().deferred.as_slice(), &[1]);

    let mut t = 10;
    while t < 780 {
        if t == 50 {
            rig.zone(0).idle();
        }
        rig.tick_at(t);
        assert!(!rig.zone(1).open.get(), "deferred damper stays closed at t={t}");
        assert!(!rig.outputs.ob.get(), "no cooling while heat is served at t={t}");
        t += 5;
    }

    rig.tick_at(780);
    assert_eq!(rig.controller.phase(), Phase::Idle);
    rig.tick_at(785);
    assert_eq!(rig.controller.phase(), Phase::Running);
    assert_eq!(rig.controller.system_mode(), SystemMode::CoolStage1);
    rig.tick_at(790);
    assert!(rig.outputs.y1.get() && rig.outputs.ob.get() && rig.outputs.g.get());
    assert!(rig.zone(1).damper_open());
    assert_eq!(rig.zone(1).status.last().as_deref(), Some("Cooling Stage 1"));
}

#[test]
fn stage2_must_be_continuous_in_one_zone() {
    let mut rig = Rig::new(ControllerConfig {
        stage2_escalation_ms: 60_000,
        ..config(2)
    });
    rig.zone(0).heat(true);
    rig.run(0, 20, 10);
    rig.zone(0).heat(false);
    rig.zone(1).heat(true);

    // Zone 1's own run reaches the delay at t=90; the combined run at t=60.
    for t in (30..90).step_by(10) {
        rig.tick_at(t);
        assert_eq!(rig.controller.phase(), Phase::Running, "escalated early at t={t}");
        assert!(!rig.outputs.y2.get());
    }
    rig.tick_at(90);
    assert_eq!(rig.controller.phase(), Phase::Escalated);
    assert!(rig.outputs.y2.get() && rig.outputs.y1.get());
}

#[test]
fn stage2_escalates_after_delay_not_before() {
    let mut rig = Rig::new(config(1));
    rig.zone(0).cool(true);

    for t in (0..3600).step_by(10) {
        rig.tick_at(t);
        assert!(!rig.outputs.y2.get(), "stage 2 too early at t={t}");
    }
    rig.tick_at(3600);
    assert_eq!(rig.controller.phase(), Phase::Escalated);
    assert!(rig.outputs.y2.get() && rig.outputs.y1.get());
    assert_eq!(rig.zone(0).status.last().as_deref(), Some("Cooling Stage 2"));
    assert_eq!(rig.select.published().last(), Some(&SystemMode::CoolStage2));
}

// ── Output mapping ────────────────────────────────────────────

fn fast_escalation() -> ControllerConfig {
    ControllerConfig {
        stage2_escalation_ms: 60_000,
        ..config(1)
    }
}

#[test]
fn heat_stage2_falls_back_to_y2_without_w2() {
    let mut rig = Rig::new(fast_escalation());
    rig.zone(0).heat(true);
    rig.run(0, 60, 10);
    assert_eq!(rig.controller.phase(), Phase::Escalated);
    assert!(rig.outputs.y2.get());
    assert!(!rig.outputs.w2.get());
    assert!(!rig.outputs.ob.get());
}

#[test]
fn heat_stage2_uses_w2_when_bound() {
    let mut rig = Rig::with_w2(fast_escalation());
    rig.zone(0).heat(true);
    rig.run(0, 60, 10);
    assert!(rig.outputs.w2.get());
    assert!(!rig.outputs.y2.get());
    assert!(!rig.outputs.w3.get(), "W3 is never energized");
}

#[test]
fn purge_drops_reversing_valve_by_default() {
    let mut rig = Rig::new(config(1));
    rig.zone(0).cool(false);
    rig.run(0, 20, 10);
    assert!(rig.outputs.ob.get());
    rig.zone(0).idle();
    rig.run(30, 480, 10);
    assert_eq!(rig.controller.phase(), Phase::Purging);
    assert!(!rig.outputs.ob.get() && !rig.outputs.y1.get());
    assert_eq!(rig.controller.system_mode(), SystemMode::PurgeCool);
}

#[test]
fn purge_can_hold_reversing_valve() {
    let mut rig = Rig::new(ControllerConfig {
        hold_reversing_valve_in_purge: true,
        ..config(1)
    });
    rig.zone(0).cool(false);
    rig.run(0, 20, 10);
    rig.zone(0).idle();
    rig.run(30, 480, 10);
    assert_eq!(rig.controller.phase(), Phase::Purging);
    assert!(rig.outputs.ob.get() && rig.outputs.g.get());
    assert!(!rig.outputs.y1.get());
}

#[test]
fn fan_only_call_runs_blower_without_cycle() {
    let mut rig = Rig::new(config(1));
    rig.zone(0).fan();
    rig.tick_at(0);
    assert_eq!(rig.controller.phase(), Phase::Idle);
    assert!(!rig.outputs.g.get(), "blower waits for the damper");
    rig.tick_at(10);
    assert!(rig.outputs.g.get() && !rig.outputs.y1.get());
    assert_eq!(rig.zone(0).status.last().as_deref(), Some("Fan Only"));
    assert_eq!(rig.controller.system_mode(), SystemMode::Fan);
    assert!(rig.leds.fan.get() && !rig.leds.heat.get());

    rig.zone(0).idle();
    rig.tick_at(20);
    assert_eq!(rig.controller.phase(), Phase::Idle, "fan-only has no min cycle or purge");
    assert!(!rig.outputs.g.get());
}

#[test]
fn fan_only_zone_waits_during_heat_cycle() {
    let mut rig = Rig::new(config(2));
    rig.zone(0).heat(false);
    rig.zone(1).fan();
    rig.run(0, 30, 10);
    assert_eq!(rig.zone(1).status.last().as_deref(), Some("Wait"));
    assert!(!rig.zone(1).open.get());
    assert_eq!(rig.controller.fault_flags(), 0);
}

// ── Cycle behaviour ───────────────────────────────────────────

#[test]
fn reasserted_call_does_not_restart_min_cycle() {
    let mut rig = Rig::new(config(1));
    rig.zone(0).heat(false);
    rig.run(0, 40, 10);
    rig.zone(0).idle();
    rig.run(50, 90, 10);
    rig.zone(0).heat(false);
    rig.run(100, 140, 10);
    rig.zone(0).idle();
    rig.run(150, 470, 10);
    assert_eq!(rig.controller.phase(), Phase::Running);
    rig.tick_at(480);
    assert_eq!(rig.controller.phase(), Phase::Purging);
    assert_eq!(
        rig.controller.system_state().cycle_stopped_at,
        Some(openzone::Instant::from_secs(480))
    );
}

#[test]
fn damper_moves_wait_out_release_and_stagger() {
    let mut rig = Rig::new(config(2));
    // Boot closes both dampers.
    assert_eq!(rig.delay.waits(), vec![250, 100, 250, 100]);
    rig.delay.clear();

    rig.zone(0).heat(false);
    rig.zone(1).heat(false);
    rig.tick_at(0);
    assert_eq!(rig.delay.waits(), vec![250, 100, 250, 100]);
    rig.delay.clear();

    rig.tick_at(10);
    assert!(rig.delay.waits().is_empty(), "no moves, no waits");
}

#[test]
fn dampers_never_drive_both_directions() {
    let mut rig = Rig::new(ControllerConfig {
        min_cycle_time_ms: 10_000,
        purge_duration_ms: 0,
        ..config(2)
    });
    for (i, t) in (0..300).step_by(3).enumerate() {
        match i % 4 {
            0 => rig.zone(0).heat(false),
            1 => rig.zone(1).heat(false),
            2 => rig.zone(0).idle(),
            _ => rig.zone(1).idle(),
        }
        rig.tick_at(t);
    }
    for zone in &rig.zones {
        let (mut open, mut close) = (false, false);
        for &(id, level) in zone.damper_journal.borrow().iter() {
            if id == 0 {
                open = level;
            } else {
                close = level;
            }
            assert!(!(open && close), "open and close energized together");
        }
    }
}

// ── Faults ────────────────────────────────────────────────────

fn fault_events(rig: &Rig) -> Vec<AppEvent> {
    rig.sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::FaultDetected(_) | AppEvent::FaultCleared(_)))
        .cloned()
        .collect()
}

#[test]
fn long_deferral_raises_and_clears_conflict_fault() {
    let mut rig = Rig::new(ControllerConfig {
        conflict_alarm_ms: 60_000,
        ..config(3)
    });
    rig.zone(0).heat(false);
    rig.tick_at(0);
    rig.zone(1).cool(false);
    rig.run(5, 60, 5);
    assert_eq!(rig.controller.fault_flags(), 0);

    rig.tick_at(65);
    assert_eq!(rig.controller.fault_flags(), Fault::ConflictDeferred.mask());
    assert!(rig.leds.error.get());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FaultDetected(_))), 1);
    assert_eq!(rig.controller.phase(), Phase::Running, "faults never halt arbitration");

    // A miswired zone overlaps the conflict and clears on its own.
    rig.run(70, 95, 5);
    rig.zone(2).set(true, false, false, true);
    rig.run(100, 105, 5);
    assert_eq!(
        rig.controller.fault_flags(),
        Fault::ConflictDeferred.mask() | Fault::MissingFanCall.mask()
    );
    rig.run(110, 145, 5);
    rig.zone(2).idle();
    rig.tick_at(150);
    assert_eq!(rig.controller.fault_flags(), Fault::ConflictDeferred.mask());
    assert!(rig.leds.error.get(), "conflict still latched");

    rig.run(155, 195, 5);
    rig.zone(0).idle();
    rig.run(200, 775, 5);
    assert!(rig.leds.error.get(), "still deferred through the purge");

    rig.tick_at(780);
    assert_eq!(rig.controller.fault_flags(), 0);
    assert!(!rig.leds.error.get());
    assert_eq!(
        fault_events(&rig),
        vec![
            AppEvent::FaultDetected(Fault::ConflictDeferred),
            AppEvent::FaultDetected(Fault::MissingFanCall),
            AppEvent::FaultCleared(Fault::MissingFanCall),
            AppEvent::FaultCleared(Fault::ConflictDeferred),
        ]
    );
}

#[test]
fn stage_call_without_fan_closes_zone() {
    let mut rig = Rig::new(config(1));
    rig.zone(0).set(true, false, false, true);
    rig.tick_at(0);
    assert_eq!(rig.controller.fault_flags(), 0, "one observation is not enough");
    assert_eq!(rig.controller.phase(), Phase::Running);

    rig.tick_at(10);
    assert_eq!(rig.controller.fault_flags(), Fault::MissingFanCall.mask());
    assert_eq!(rig.controller.zone_status(0), Some(ZoneStatus::Error));
    assert_eq!(rig.zone(0).status.last().as_deref(), Some("ERROR"));
    assert!(rig.leds.error.get());
    assert!(rig.zone(0).close.get() && !rig.zone(0).open.get(), "faulted damper closes");
    assert!(!rig.outputs.y1.get() && !rig.outputs.g.get(), "nothing left to serve");
    assert_eq!(rig.controller.phase(), Phase::Running, "min cycle still runs out");

    rig.zone(0).heat(false);
    rig.tick_at(20);
    assert_eq!(rig.controller.fault_flags(), 0);
    assert_eq!(rig.controller.zone_status(0), Some(ZoneStatus::HeatingStage1));
    assert!(!rig.outputs.y1.get(), "equipment waits for the damper to reopen");

    rig.tick_at(30);
    assert!(rig.zone(0).damper_open());
    assert!(rig.outputs.y1.get() && rig.outputs.g.get() && rig.outputs.w1e.get());
}

#[test]
fn missing_fan_check_can_be_disabled() {
    let mut rig = Rig::new(ControllerConfig {
        detect_missing_fan: false,
        ..config(1)
    });
    rig.zone(0).set(true, false, false, true);
    rig.run(0, 30, 10);
    assert_eq!(rig.controller.fault_flags(), 0);
}

// ── Mode selector ─────────────────────────────────────────────

#[test]
fn auto_mode_publishes_only_on_change() {
    let mut rig = Rig::new(config(1));
    assert_eq!(rig.select.published(), vec![SystemMode::Off]);

    rig.zone(0).heat(false);
    rig.run(0, 100, 10);
    assert_eq!(rig.select.published(), vec![SystemMode::Off, SystemMode::HeatStage1]);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ModeChanged { .. })), 1);
}

fn manual(policy: ManualPolicy) -> ControllerConfig {
    ControllerConfig {
        auto_mode: false,
        manual_policy: policy,
        ..config(1)
    }
}

#[test]
fn manual_cool_overrides_zone_changeover() {
    let mut rig = Rig::new(manual(ManualPolicy::Constrain));
    rig.select.choose(Some(SystemMode::CoolStage1));
    rig.zone(0).heat(false);
    rig.run(0, 10, 10);
    assert!(rig.outputs.y1.get() && rig.outputs.ob.get());
    assert!(!rig.outputs.w1e.get());
    assert!(rig.leds.cool.get());
    assert!(rig.select.published().is_empty(), "manual mode never writes the selector");
}

#[test]
fn manual_off_ignores_calls() {
    let mut rig = Rig::new(manual(ManualPolicy::Constrain));
    rig.select.choose(Some(SystemMode::Off));
    rig.zone(0).cool(false);
    rig.run(0, 30, 10);
    assert_eq!(rig.controller.phase(), Phase::Idle);
    assert!(!rig.outputs.g.get() && !rig.outputs.y1.get());
}

#[test]
fn manual_fan_turns_calls_into_fan() {
    let mut rig = Rig::new(manual(ManualPolicy::Constrain));
    rig.select.choose(Some(SystemMode::Fan));
    rig.zone(0).heat(false);
    rig.run(0, 10, 10);
    assert_eq!(rig.controller.phase(), Phase::Idle);
    assert!(rig.outputs.g.get() && !rig.outputs.y1.get());
    assert_eq!(rig.controller.zone_status(0), Some(ZoneStatus::FanOnly));
}

#[test]
fn unreadable_selection_imposes_nothing() {
    let mut rig = Rig::new(manual(ManualPolicy::Constrain));
    rig.select.choose(None);
    rig.zone(0).heat(false);
    rig.run(0, 10, 10);
    assert!(rig.outputs.w1e.get());
}

#[test]
fn advisory_selection_does_not_constrain() {
    let mut rig = Rig::new(manual(ManualPolicy::Advisory));
    rig.select.choose(Some(SystemMode::CoolStage1));
    rig.zone(0).heat(false);
    rig.run(0, 10, 10);
    assert!(rig.outputs.w1e.get() && !rig.outputs.ob.get());
}

#[test]
fn switching_to_auto_resyncs_selector() {
    let mut rig = Rig::new(manual(ManualPolicy::Constrain));
    rig.zone(0).heat(false);
    rig.run(0, 10, 10);
    assert!(rig.select.published().is_empty());

    rig.controller.handle_command(AppCommand::SetAutoMode(true)).expect("accepted");
    rig.tick_at(20);
    assert_eq!(rig.select.published(), vec![SystemMode::HeatStage1]);
}

// ── Status and commands ───────────────────────────────────────

#[test]
fn zone_status_published_on_change_only() {
    let mut rig = Rig::new(config(1));
    assert_eq!(rig.zone(0).status.count(), 1, "initial Off at start");
    rig.run(0, 50, 10);
    assert_eq!(rig.zone(0).status.count(), 1);

    rig.zone(0).heat(false);
    rig.run(60, 120, 10);
    assert_eq!(rig.zone(0).status.count(), 2);
    assert_eq!(rig.zone(0).status.last().as_deref(), Some("Heating Stage 1"));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::ZoneStatusChanged { zone: 0, .. })),
        1
    );
}

#[test]
fn timing_update_applies_to_running_cycle() {
    let mut rig = Rig::new(config(1));
    rig.controller
        .handle_command(AppCommand::UpdateTiming {
            min_cycle_time_ms: Some(60_000),
            purge_duration_ms: Some(30_000),
            stage2_escalation_ms: None,
            damper_settle_ms: None,
            conflict_alarm_ms: None,
        })
        .expect("valid timing");

    rig.zone(0).heat(false);
    rig.run(0, 10, 10);
    rig.zone(0).idle();
    rig.run(20, 50, 10);
    assert_eq!(rig.controller.phase(), Phase::Running);
    rig.tick_at(60);
    assert_eq!(rig.controller.phase(), Phase::Purging);
    rig.tick_at(90);
    assert_eq!(rig.controller.phase(), Phase::Idle);
}

#[test]
fn rejected_timing_update_keeps_config() {
    let mut rig = Rig::new(config(1));
    let before = rig.controller.config().clone();
    let result = rig.controller.handle_command(AppCommand::UpdateTiming {
        min_cycle_time_ms: Some(0),
        purge_duration_ms: None,
        stage2_escalation_ms: None,
        damper_settle_ms: None,
        conflict_alarm_ms: None,
    });
    assert!(result.is_err());
    assert_eq!(rig.controller.config(), &before);
}

#[test]
fn started_event_first_and_ticks_counted() {
    let mut rig = Rig::new(config(2));
    assert_eq!(rig.sink.events.first(), Some(&AppEvent::Started { zones: 2 }));
    rig.run(0, 40, 10);
    assert_eq!(rig.controller.tick_count(), 5);
}
