//! Central equipment relay bank.
//!
//! Maps an [`OutputDecision`] onto the bound relay outputs.  Y1, Y2, G and
//! O/B are required; W1E, W2 and W3 are optional and simply skipped when
//! the board leaves them unbound.  A heat stage-2 request falls back to Y2
//! when W2 is missing.
//!
//! Writes happen only on change, and every pin keeps its last commanded
//! level so `current()` reports what the relays were told.

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::fsm::context::OutputDecision;

/// One relay output with change tracking.
struct Relay<O> {
    name: &'static str,
    pin: O,
    level: bool,
    driven: bool,
}

impl<O: OutputPin> Relay<O> {
    fn new(name: &'static str, pin: O) -> Self {
        Self {
            name,
            pin,
            level: false,
            driven: false,
        }
    }

    fn set(&mut self, on: bool) {
        if self.driven && self.level == on {
            return;
        }
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        if let Err(e) = result {
            warn!("Output {} write failed: {:?}", self.name, e);
        }
        if self.driven {
            info!("Output {} -> {}", self.name, if on { "ON" } else { "OFF" });
        }
        self.level = on;
        self.driven = true;
    }
}

/// The central equipment outputs.
pub struct CentralOutputs<O> {
    y1: Relay<O>,
    y2: Relay<O>,
    g: Relay<O>,
    ob: Relay<O>,
    w1e: Option<Relay<O>>,
    w2: Option<Relay<O>>,
    w3: Option<Relay<O>>,
    current: OutputDecision,
}

impl<O: OutputPin> CentralOutputs<O> {
    /// Bind the four required outputs.  Optional ones are added with the
    /// `with_*` builders.
    pub fn new(y1: O, y2: O, g: O, ob: O) -> Self {
        Self {
            y1: Relay::new("Y1", y1),
            y2: Relay::new("Y2", y2),
            g: Relay::new("G", g),
            ob: Relay::new("OB", ob),
            w1e: None,
            w2: None,
            w3: None,
            current: OutputDecision::all_off(),
        }
    }

    pub fn with_w1e(mut self, pin: O) -> Self {
        self.w1e = Some(Relay::new("W1E", pin));
        self
    }

    pub fn with_w2(mut self, pin: O) -> Self {
        self.w2 = Some(Relay::new("W2", pin));
        self
    }

    pub fn with_w3(mut self, pin: O) -> Self {
        self.w3 = Some(Relay::new("W3", pin));
        self
    }

    /// Drive every bound relay to match `decision`.
    pub fn apply(&mut self, decision: &OutputDecision) {
        // Heat stage 2 rides on Y2 when the board has no W2 relay.
        let y2 = decision.y2 || (decision.w2 && self.w2.is_none());

        self.y1.set(decision.y1);
        self.y2.set(y2);
        self.g.set(decision.g);
        self.ob.set(decision.ob);
        if let Some(w1e) = self.w1e.as_mut() {
            w1e.set(decision.w1e);
        }
        if let Some(w2) = self.w2.as_mut() {
            w2.set(decision.w2);
        }
        if let Some(w3) = self.w3.as_mut() {
            w3.set(decision.w3);
        }

        self.current = OutputDecision {
            y1: decision.y1,
            y2,
            g: decision.g,
            ob: decision.ob,
            w1e: decision.w1e && self.w1e.is_some(),
            w2: decision.w2 && self.w2.is_some(),
            w3: decision.w3 && self.w3.is_some(),
        };
    }

    /// De-energize everything.
    pub fn all_off(&mut self) {
        self.apply(&OutputDecision::all_off());
    }

    /// Levels actually driven, after fallback and unbound outputs.
    pub fn current(&self) -> OutputDecision {
        self.current
    }

    /// Names of the bound optional outputs, for the startup dump.
    pub fn bound_optional(&self) -> [(&'static str, bool); 3] {
        [
            ("W1E", self.w1e.is_some()),
            ("W2", self.w2.is_some()),
            ("W3", self.w3.is_some()),
        ]
    }
}
