//! Two-wire zone damper driver.
//!
//! Each damper motor has an OPEN and a CLOSE relay.  The driver is the
//! only code that touches them and guarantees:
//!
//! - **Break before make**: both relays are released and held off for
//!   `release_ms` before the requested direction is engaged, so the motor
//!   never sees an instant reversal and both relays are never on together.
//! - **Settling**: with no position feedback, a commanded move is reported
//!   as `Opening` / `Closing` until `settle_ms` has elapsed.  The arbitrator
//!   will not start the blower into a zone that is still `Opening`.
//! - **Unknown at boot**: the first command after power-up always drives
//!   the relays, whatever position was assumed.
//!
//! ## Dual-target design
//!
//! Generic over [`OutputPin`]: on ESP-IDF the pins are `PinDriver`s, on
//! host/test they are in-memory mocks.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::time::Instant;
use crate::zone::{DamperIntent, DamperState, ZoneId};

pub struct DamperDriver<O> {
    zone: ZoneId,
    open: O,
    close: O,
    state: DamperState,
    since: Instant,
    settle_ms: u32,
    release_ms: u32,
    driven: bool,
}

impl<O: OutputPin> DamperDriver<O> {
    pub fn new(zone: ZoneId, open: O, close: O, settle_ms: u32, release_ms: u32) -> Self {
        Self {
            zone,
            open,
            close,
            state: DamperState::Closed,
            since: Instant::ZERO,
            settle_ms,
            release_ms,
            driven: false,
        }
    }

    /// Command the damper towards `desired`.  No-op if it is already there
    /// or on its way.  Blocks on `delay` for the release dead-time when the
    /// damper moves; returns `true` in that case.
    pub fn apply(&mut self, desired: DamperIntent, now: Instant, delay: &mut impl DelayNs) -> bool {
        let heading = match self.state {
            DamperState::Open | DamperState::Opening => DamperIntent::Open,
            DamperState::Closed | DamperState::Closing => DamperIntent::Closed,
        };
        if self.driven && heading == desired {
            return false;
        }

        set_pin(&mut self.open, false, self.zone, "open");
        set_pin(&mut self.close, false, self.zone, "close");
        if self.release_ms > 0 {
            delay.delay_ms(self.release_ms);
        }

        match desired {
            DamperIntent::Open => {
                info!("Zone {} damper opening", self.zone + 1);
                set_pin(&mut self.open, true, self.zone, "open");
                self.state = DamperState::Opening;
            }
            DamperIntent::Closed => {
                info!("Zone {} damper closing", self.zone + 1);
                set_pin(&mut self.close, true, self.zone, "close");
                self.state = DamperState::Closing;
            }
        }
        self.since = now;
        self.driven = true;

        if self.settle_ms == 0 {
            self.settle();
        }
        true
    }

    /// Advance `Opening`/`Closing` to their end position once settled.
    pub fn service(&mut self, now: Instant) {
        if self.state.is_moving() && now.has_elapsed(self.since, self.settle_ms) {
            self.settle();
        }
    }

    pub fn state(&self) -> DamperState {
        self.state
    }

    pub fn set_settle_ms(&mut self, settle_ms: u32) {
        self.settle_ms = settle_ms;
    }

    fn settle(&mut self) {
        self.state = match self.state {
            DamperState::Opening => DamperState::Open,
            DamperState::Closing => DamperState::Closed,
            other => other,
        };
    }
}

fn set_pin<O: OutputPin>(pin: &mut O, on: bool, zone: ZoneId, which: &str) {
    let result = if on { pin.set_high() } else { pin.set_low() };
    if let Err(e) = result {
        warn!("Zone {} damper {} write failed: {:?}", zone + 1, which, e);
    }
}
