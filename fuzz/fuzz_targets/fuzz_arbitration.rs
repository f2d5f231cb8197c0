//! Fuzz target: `EquipmentArbitrator::decide`
//!
//! Each input byte is one tick for one zone: the low four bits are the
//! Y1/Y2/G/OB terminal levels, the high bits pick how far the damper got.
//! Asserts that arbitration never panics and never energizes heat and
//! cool together.
//!
//! cargo fuzz run fuzz_arbitration

#![no_main]

use libfuzzer_sys::fuzz_target;
use openzone::config::ChangeoverPolarity;
use openzone::sensors::{RawLevels, decode};
use openzone::zone::{CallTimer, DamperIntent, DamperState, MAX_ZONES, ZoneSnapshot};
use openzone::{ControllerConfig, EquipmentArbitrator, Instant, SystemState};

fuzz_target!(|data: &[u8]| {
    let Some((&header, body)) = data.split_first() else {
        return;
    };
    let n = (header as usize % MAX_ZONES) + 1;
    let config = ControllerConfig {
        num_zones: n as u8,
        min_cycle_time_ms: 30_000,
        purge_duration_ms: if header & 0x80 != 0 { 0 } else { 20_000 },
        stage2_escalation_ms: 60_000,
        hold_reversing_valve_in_purge: header & 0x40 != 0,
        ..ControllerConfig::default()
    };

    let arbitrator = EquipmentArbitrator::new();
    let mut state = SystemState::new();
    let mut timers = [CallTimer::default(); MAX_ZONES];
    let mut intents = [DamperIntent::Closed; MAX_ZONES];

    for (tick, chunk) in body.chunks(n).enumerate() {
        let now = Instant::from_secs(tick as u64 * 10);
        let mut zones = [ZoneSnapshot::idle(); MAX_ZONES];
        for (i, &byte) in chunk.iter().enumerate() {
            let levels = RawLevels {
                y1: byte & 0x01 != 0,
                y2: byte & 0x02 != 0,
                g: byte & 0x04 != 0,
                ob: byte & 0x08 != 0,
            };
            let call = decode(levels, ChangeoverPolarity::AssertedIsHeat);
            let (call_started_at, stage2_since) = timers[i].observe(&call, now);
            let settled = byte & 0x10 != 0;
            let damper = match (intents[i], settled) {
                (DamperIntent::Open, true) => DamperState::Open,
                (DamperIntent::Open, false) => DamperState::Opening,
                (DamperIntent::Closed, true) => DamperState::Closed,
                (DamperIntent::Closed, false) => DamperState::Closing,
            };
            zones[i] = ZoneSnapshot {
                call,
                call_started_at,
                stage2_since,
                damper,
                faulted: false,
            };
        }

        let d = arbitrator.decide(&zones[..n], &state, &config, now);
        let o = d.outputs;
        assert!(!((o.w1e || o.w2 || o.w3) && o.ob), "heat and cool energized together");
        assert!(!o.w3, "W3 energized");
        assert_eq!(d.intents.len(), n);

        for (slot, intent) in intents.iter_mut().zip(d.intents.iter()) {
            *slot = *intent;
        }
        state = d.state;
    }
});
