//! Mock hardware for integration tests.
//!
//! Every pin is a shared cell: the test keeps one clone as a handle and
//! the controller owns the other, so tests can drive thermostat inputs
//! and inspect relay levels between ticks without touching real GPIO.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use openzone::app::events::AppEvent;
use openzone::app::ports::{EventSink, ModeSelect, TextOutput};
use openzone::drivers::{CentralOutputs, StatusIndicators};
use openzone::{ControllerConfig, Instant, SystemMode, ZoneBinding, ZoningController};

// ── Pins ──────────────────────────────────────────────────────

/// Shared-level pin usable as input or output.
#[derive(Clone, Default)]
pub struct MockPin {
    level: Rc<Cell<bool>>,
    /// Ordered (pin id, level) writes shared across a damper pair.
    journal: Option<(u8, Rc<RefCell<Vec<(u8, bool)>>>)>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn set(&self, level: bool) {
        self.level.set(level);
    }

    pub fn get(&self) -> bool {
        self.level.get()
    }

    fn journaled(id: u8, journal: Rc<RefCell<Vec<(u8, bool)>>>) -> Self {
        Self {
            level: Rc::default(),
            journal: Some((id, journal)),
        }
    }

    fn write(&self, level: bool) {
        self.level.set(level);
        if let Some((id, journal)) = &self.journal {
            journal.borrow_mut().push((*id, level));
        }
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.get())
    }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.write(true);
        Ok(())
    }
}

// ── Entities ──────────────────────────────────────────────────

/// Records every text published to it.
#[derive(Clone, Default)]
pub struct MockText(Rc<RefCell<Vec<String>>>);

#[allow(dead_code)]
impl MockText {
    pub fn last(&self) -> Option<String> {
        self.0.borrow().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.0.borrow().len()
    }
}

impl TextOutput for MockText {
    fn publish(&mut self, text: &str) {
        self.0.borrow_mut().push(text.to_string());
    }
}

/// A select entity: publishing sets its value; tests may also set it.
#[derive(Clone, Default)]
pub struct MockSelect {
    value: Rc<RefCell<Option<SystemMode>>>,
    published: Rc<RefCell<Vec<SystemMode>>>,
}

#[allow(dead_code)]
impl MockSelect {
    pub fn choose(&self, mode: Option<SystemMode>) {
        *self.value.borrow_mut() = mode;
    }

    pub fn published(&self) -> Vec<SystemMode> {
        self.published.borrow().clone()
    }
}

impl ModeSelect for MockSelect {
    fn publish(&mut self, mode: SystemMode) {
        *self.value.borrow_mut() = Some(mode);
        self.published.borrow_mut().push(mode);
    }

    fn selected(&mut self) -> Option<SystemMode> {
        *self.value.borrow()
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Records blocking waits instead of sleeping.
#[derive(Clone, Default)]
pub struct MockDelay(Rc<RefCell<Vec<u32>>>);

#[allow(dead_code)]
impl MockDelay {
    /// Every wait requested so far, in milliseconds.
    pub fn waits(&self) -> Vec<u32> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().push(ms);
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Handles ───────────────────────────────────────────────────

pub struct ZoneHandles {
    pub y1: MockPin,
    pub y2: MockPin,
    pub g: MockPin,
    pub ob: MockPin,
    pub open: MockPin,
    pub close: MockPin,
    pub status: MockText,
    /// Damper relay writes in order: id 0 = open, 1 = close.
    pub damper_journal: Rc<RefCell<Vec<(u8, bool)>>>,
}

#[allow(dead_code)]
impl ZoneHandles {
    /// Thermostat calls for heat (O/B asserted = heat).
    pub fn heat(&self, stage2: bool) {
        self.set(true, stage2, true, true);
    }

    pub fn cool(&self, stage2: bool) {
        self.set(true, stage2, true, false);
    }

    pub fn fan(&self) {
        self.set(false, false, true, false);
    }

    pub fn idle(&self) {
        self.set(false, false, false, false);
    }

    pub fn set(&self, y1: bool, y2: bool, g: bool, ob: bool) {
        self.y1.set(y1);
        self.y2.set(y2);
        self.g.set(g);
        self.ob.set(ob);
    }

    pub fn damper_open(&self) -> bool {
        self.open.get() && !self.close.get()
    }
}

pub struct OutputHandles {
    pub y1: MockPin,
    pub y2: MockPin,
    pub g: MockPin,
    pub ob: MockPin,
    pub w1e: MockPin,
    pub w2: MockPin,
    pub w3: MockPin,
}

pub struct LedHandles {
    pub heat: MockPin,
    pub cool: MockPin,
    pub fan: MockPin,
    pub error: MockPin,
}

pub type TestController = ZoningController<MockPin, MockPin, MockText, MockSelect, MockDelay>;

// ── Rig ───────────────────────────────────────────────────────

/// A started controller plus handles to all of its hardware.
pub struct Rig {
    pub controller: TestController,
    pub zones: Vec<ZoneHandles>,
    pub outputs: OutputHandles,
    pub leds: LedHandles,
    pub select: MockSelect,
    pub delay: MockDelay,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    /// Board with W1E and W3 bound and W2 unbound.
    pub fn new(config: ControllerConfig) -> Self {
        Self::build(config, false)
    }

    /// Board with every optional output bound.
    pub fn with_w2(config: ControllerConfig) -> Self {
        Self::build(config, true)
    }

    fn build(config: ControllerConfig, bind_w2: bool) -> Self {
        let mut builder = TestController::builder(config.clone());
        let mut zones = Vec::new();
        for _ in 0..config.num_zones {
            let journal = Rc::new(RefCell::new(Vec::new()));
            let handles = ZoneHandles {
                y1: MockPin::default(),
                y2: MockPin::default(),
                g: MockPin::default(),
                ob: MockPin::default(),
                open: MockPin::journaled(0, journal.clone()),
                close: MockPin::journaled(1, journal.clone()),
                status: MockText::default(),
                damper_journal: journal,
            };
            builder = builder.zone(ZoneBinding {
                y1: handles.y1.clone(),
                y2: handles.y2.clone(),
                g: handles.g.clone(),
                ob: handles.ob.clone(),
                damper_open: handles.open.clone(),
                damper_close: handles.close.clone(),
                status: Some(handles.status.clone()),
            });
            zones.push(handles);
        }

        let outputs = OutputHandles {
            y1: MockPin::default(),
            y2: MockPin::default(),
            g: MockPin::default(),
            ob: MockPin::default(),
            w1e: MockPin::default(),
            w2: MockPin::default(),
            w3: MockPin::default(),
        };
        let mut central = CentralOutputs::new(
            outputs.y1.clone(),
            outputs.y2.clone(),
            outputs.g.clone(),
            outputs.ob.clone(),
        )
        .with_w1e(outputs.w1e.clone())
        .with_w3(outputs.w3.clone());
        if bind_w2 {
            central = central.with_w2(outputs.w2.clone());
        }

        let leds = LedHandles {
            heat: MockPin::default(),
            cool: MockPin::default(),
            fan: MockPin::default(),
            error: MockPin::default(),
        };
        let indicators = StatusIndicators::new(
            leds.heat.clone(),
            leds.cool.clone(),
            leds.fan.clone(),
            leds.error.clone(),
        );

        let select = MockSelect::default();
        let delay = MockDelay::default();
        let mut controller = builder
            .outputs(central)
            .indicators(indicators)
            .mode_select(select.clone())
            .delay(delay.clone())
            .build()
            .expect("valid test rig");

        let mut sink = RecordingSink::default();
        controller.start(Instant::ZERO, &mut sink);

        Self {
            controller,
            zones,
            outputs,
            leds,
            select,
            delay,
            sink,
        }
    }

    pub fn tick_at(&mut self, secs: u64) {
        self.controller.tick(Instant::from_secs(secs), &mut self.sink);
    }

    /// Tick every `step` seconds over `from..=to`.
    pub fn run(&mut self, from: u64, to: u64, step: u64) {
        let mut t = from;
        while t <= to {
            self.tick_at(t);
            t += step;
        }
    }

    pub fn zone(&self, i: usize) -> &ZoneHandles {
        &self.zones[i]
    }
}
