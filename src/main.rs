//! OpenZone Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  PinDriver inputs   PinDriver relays   LogTextOutput           │
//! │  (zone Y1/Y2/G/OB)  (dampers, Y/G/OB/W) MemoryModeSelect       │
//! │  MonotonicClock     LogEventSink                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              ZoningController (pure logic)             │    │
//! │  │  Reader · Arbitrator/FSM · Dampers · Faults            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use log::{info, warn};

use openzone::adapters::entities::{LogTextOutput, MemoryModeSelect};
use openzone::adapters::log_sink::LogEventSink;
use openzone::adapters::time::MonotonicClock;
use openzone::app::ports::Clock;
use openzone::drivers::{CentralOutputs, StatusIndicators};
use openzone::{ControllerConfig, ZoneBinding, ZoningController, pins};

type InPin = PinDriver<'static, AnyIOPin, Input>;
type OutPin = PinDriver<'static, AnyOutputPin, Output>;

/// Optional JSON configuration baked in at build time.
const CONFIG_JSON: Option<&str> = option_env!("OPENZONE_CONFIG_JSON");

fn input(gpio: i32) -> Result<InPin> {
    // SAFETY: each GPIO number in `pins` is bound exactly once, here.
    let mut pin = PinDriver::input(unsafe { AnyIOPin::new(gpio) })?;
    pin.set_pull(Pull::Down)?;
    Ok(pin)
}

fn output(gpio: i32) -> Result<OutPin> {
    // SAFETY: as above.
    let mut pin = PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?;
    pin.set_low()?;
    Ok(pin)
}

fn load_config() -> ControllerConfig {
    let zones = pins::ZONES.len() as u8;
    let Some(json) = CONFIG_JSON else {
        return ControllerConfig::with_zones(zones);
    };
    match ControllerConfig::from_json(json) {
        Ok(config) => {
            info!("Config loaded from build-time JSON");
            config
        }
        Err(e) => {
            warn!("Build-time config rejected ({}), using defaults", e);
            ControllerConfig::with_zones(zones)
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  OpenZone v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config();

    // ── 3. Bind hardware ──────────────────────────────────────
    let mut builder = ZoningController::builder(config.clone());
    for (zone, name) in pins::ZONES.iter().zip(pins::ZONE_STATUS_NAMES) {
        builder = builder.zone(ZoneBinding {
            y1: input(zone.y1)?,
            y2: input(zone.y2)?,
            g: input(zone.g)?,
            ob: input(zone.ob)?,
            damper_open: output(zone.damper_open)?,
            damper_close: output(zone.damper_close)?,
            status: Some(LogTextOutput::new(name)),
        });
    }

    let mut outputs = CentralOutputs::new(
        output(pins::Y1_GPIO)?,
        output(pins::Y2_GPIO)?,
        output(pins::G_GPIO)?,
        output(pins::OB_GPIO)?,
    );
    if let Some(gpio) = pins::W1E_GPIO {
        outputs = outputs.with_w1e(output(gpio)?);
    }
    if let Some(gpio) = pins::W2_GPIO {
        outputs = outputs.with_w2(output(gpio)?);
    }
    if let Some(gpio) = pins::W3_GPIO {
        outputs = outputs.with_w3(output(gpio)?);
    }

    let indicators = StatusIndicators::new(
        output(pins::LED_HEAT_GPIO)?,
        output(pins::LED_COOL_GPIO)?,
        output(pins::LED_FAN_GPIO)?,
        output(pins::LED_ERROR_GPIO)?,
    );

    let mut controller = builder
        .outputs(outputs)
        .indicators(indicators)
        .mode_select(MemoryModeSelect::new())
        .delay(FreeRtos)
        .build()?;

    // ── 4. Run ────────────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    controller.start(clock.now(), &mut sink);

    info!("System ready. Polling every {} ms.", config.poll_interval_ms);
    loop {
        controller.tick(clock.now(), &mut sink);
        FreeRtos::delay_ms(config.poll_interval_ms);
    }
}
