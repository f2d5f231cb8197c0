//! GPIO assignments for the OpenZone two-zone reference board (ESP32-S3).
//!
//! Single source of truth: the firmware binary binds every pin from this
//! module.  Thermostat inputs come in through optocouplers (HIGH =
//! 24 VAC present); every output drives a relay through a ULN2803 channel
//! (HIGH = energized).

/// GPIO numbers for one zone.
#[derive(Debug, Clone, Copy)]
pub struct ZonePins {
    pub y1: i32,
    pub y2: i32,
    pub g: i32,
    pub ob: i32,
    pub damper_open: i32,
    pub damper_close: i32,
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

pub const ZONES: [ZonePins; 2] = [
    ZonePins {
        y1: 4,
        y2: 5,
        g: 6,
        ob: 7,
        damper_open: 8,
        damper_close: 9,
    },
    ZonePins {
        y1: 10,
        y2: 11,
        g: 12,
        ob: 13,
        damper_open: 14,
        damper_close: 15,
    },
];

/// Names of the per-zone status text entities, in zone order.
pub const ZONE_STATUS_NAMES: [&str; 2] = ["Zone 1 status", "Zone 2 status"];

// ---------------------------------------------------------------------------
// Central equipment relays
// ---------------------------------------------------------------------------

pub const Y1_GPIO: i32 = 16;
pub const Y2_GPIO: i32 = 17;
pub const G_GPIO: i32 = 18;
pub const OB_GPIO: i32 = 21;
/// Auxiliary / emergency heat.  Populated on the heat-pump variant.
pub const W1E_GPIO: Option<i32> = Some(38);
/// Second heat stage.  Unpopulated: heat stage 2 falls back to Y2.
pub const W2_GPIO: Option<i32> = None;
/// Third heat stage.  Populated, never energized by the controller.
pub const W3_GPIO: Option<i32> = Some(40);

// ---------------------------------------------------------------------------
// Front-panel indicators
// ---------------------------------------------------------------------------

pub const LED_HEAT_GPIO: i32 = 41;
pub const LED_COOL_GPIO: i32 = 42;
pub const LED_FAN_GPIO: i32 = 47;
pub const LED_ERROR_GPIO: i32 = 48;
