//! Front-panel status indicators.
//!
//! Four discrete LEDs: heat, cool, fan and error.  On ESP-IDF they are
//! GPIO `PinDriver`s, on host/test in-memory mocks.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::fsm::context::OutputDecision;

/// Indicator levels for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicatorLevels {
    pub heat: bool,
    pub cool: bool,
    pub fan: bool,
    pub error: bool,
}

impl IndicatorLevels {
    /// Heat/cool/fan follow the terminals actually energized this tick,
    /// so a cycle held behind travelling dampers shows nothing yet.
    /// Error is on while any fault is latched.
    pub fn derive(outputs: &OutputDecision, faults: u8) -> Self {
        let compressor_heat = outputs.y1 && !outputs.ob;
        Self {
            heat: compressor_heat || outputs.w1e || outputs.w2 || outputs.w3,
            cool: outputs.y1 && outputs.ob,
            fan: outputs.g,
            error: faults != 0,
        }
    }
}

pub struct StatusIndicators<O> {
    heat: O,
    cool: O,
    fan: O,
    error: O,
    current: IndicatorLevels,
}

impl<O: OutputPin> StatusIndicators<O> {
    pub fn new(heat: O, cool: O, fan: O, error: O) -> Self {
        Self {
            heat,
            cool,
            fan,
            error,
            current: IndicatorLevels::default(),
        }
    }

    pub fn set(&mut self, levels: IndicatorLevels) {
        drive(&mut self.heat, levels.heat, "heat");
        drive(&mut self.cool, levels.cool, "cool");
        drive(&mut self.fan, levels.fan, "fan");
        drive(&mut self.error, levels.error, "error");
        self.current = levels;
    }

    pub fn off(&mut self) {
        self.set(IndicatorLevels::default());
    }

    pub fn current(&self) -> IndicatorLevels {
        self.current
    }
}

fn drive<O: OutputPin>(pin: &mut O, on: bool, name: &str) {
    let result = if on { pin.set_high() } else { pin.set_low() };
    if let Err(e) = result {
        warn!("Indicator {} write failed: {:?}", name, e);
    }
}
