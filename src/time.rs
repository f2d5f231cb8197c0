//! Monotonic timestamps.
//!
//! Every timer in the controller (call start, cycle start/stop, purge,
//! escalation, damper settling) is an [`Instant`]: milliseconds since boot
//! from a monotonic source.  Wall-clock adjustments never move it.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Milliseconds since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Instant(u64);

impl Instant {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, clamped at zero.
    pub const fn millis_since(self, earlier: Instant) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// `true` once at least `ms` have passed since `start`.
    pub const fn has_elapsed(self, start: Instant, ms: u32) -> bool {
        self.millis_since(start) >= ms as u64
    }

    pub const fn plus_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}s", self.0 / 1000, self.0 % 1000)
    }
}
