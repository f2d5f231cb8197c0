//! Zone thermostat inputs and the call decoder.
//!
//! Each zone has four 24 VAC thermostat terminals brought in through
//! optocouplers: Y1 (stage 1), Y2 (stage 2), G (fan) and O/B (changeover).
//! The controller samples them once per poll tick; the tick interval is
//! long enough that contact bounce is not a concern here.
//!
//! ## Decoding
//!
//! | Y1 | Y2 | G | result                                  |
//! |----|----|---|-----------------------------------------|
//! | 0  | 0  | 0 | idle                                    |
//! | 0  | 0  | 1 | fan only                                |
//! | 1  | 0  | x | stage 1, mode from O/B                  |
//! | 1  | 1  | x | stage 2, mode from O/B                  |
//! | 0  | 1  | x | stage 1 (Y2 only escalates an existing Y1 call) |

use embedded_hal::digital::InputPin;
use log::warn;

use crate::config::ChangeoverPolarity;
use crate::zone::{CallMode, CallState, Stage, ZoneId};

/// Raw terminal levels for one zone, `true` = asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawLevels {
    pub y1: bool,
    pub y2: bool,
    pub g: bool,
    pub ob: bool,
}

impl RawLevels {
    /// A stage terminal is up while G is down.
    pub fn stage_without_fan(&self) -> bool {
        (self.y1 || self.y2) && !self.g
    }
}

/// Pure decoding of raw levels into a call.
pub fn decode(levels: RawLevels, polarity: ChangeoverPolarity) -> CallState {
    let stage = match (levels.y1, levels.y2) {
        (true, true) => Stage::Stage2,
        (true, false) | (false, true) => Stage::Stage1,
        (false, false) => Stage::None,
    };

    if stage == Stage::None {
        return CallState {
            mode: CallMode::Off,
            stage,
            fan_requested: levels.g,
        };
    }

    let heat = match polarity {
        ChangeoverPolarity::AssertedIsHeat => levels.ob,
        ChangeoverPolarity::AssertedIsCool => !levels.ob,
    };

    CallState {
        mode: if heat { CallMode::Heat } else { CallMode::Cool },
        stage,
        fan_requested: levels.g,
    }
}

// ---------------------------------------------------------------------------
// Pin bundle
// ---------------------------------------------------------------------------

/// The four thermostat inputs of one zone.
///
/// Keeps the last good level of each terminal: a failed read is logged
/// and the previous level reused, so one flaky expander read cannot drop
/// a call for a whole tick.
pub struct ZoneInputs<I> {
    y1: I,
    y2: I,
    g: I,
    ob: I,
    last: RawLevels,
}

impl<I: InputPin> ZoneInputs<I> {
    pub fn new(y1: I, y2: I, g: I, ob: I) -> Self {
        Self {
            y1,
            y2,
            g,
            ob,
            last: RawLevels::default(),
        }
    }

    /// Read all four terminals.
    pub fn read(&mut self, zone: ZoneId) -> RawLevels {
        let last = self.last;
        let levels = RawLevels {
            y1: read_or_keep(&mut self.y1, last.y1, zone, "Y1"),
            y2: read_or_keep(&mut self.y2, last.y2, zone, "Y2"),
            g: read_or_keep(&mut self.g, last.g, zone, "G"),
            ob: read_or_keep(&mut self.ob, last.ob, zone, "OB"),
        };
        self.last = levels;
        levels
    }

    /// Levels from the most recent read.
    pub fn last_levels(&self) -> RawLevels {
        self.last
    }
}

fn read_or_keep<I: InputPin>(pin: &mut I, previous: bool, zone: ZoneId, name: &str) -> bool {
    match pin.is_high() {
        Ok(level) => level,
        Err(e) => {
            warn!("Zone {} {} read failed ({:?}), keeping last level", zone + 1, name, e);
            previous
        }
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Normalises zone terminals into [`CallState`]s.
#[derive(Debug, Clone, Copy)]
pub struct ZoneCallReader {
    polarity: ChangeoverPolarity,
}

impl ZoneCallReader {
    pub fn new(polarity: ChangeoverPolarity) -> Self {
        Self { polarity }
    }

    /// Sample the zone's inputs once and decode them.
    pub fn sample<I: InputPin>(&self, zone: ZoneId, inputs: &mut ZoneInputs<I>) -> (CallState, RawLevels) {
        let levels = inputs.read(zone);
        (decode(levels, self.polarity), levels)
    }
}
