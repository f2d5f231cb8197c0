//! Unified error types for the OpenZone controller.
//!
//! Configuration problems are the only errors the core can return, and
//! they are all caught before the first tick.  Runtime conditions that
//! deserve attention (a conflicting call held too long, a miswired
//! thermostat) are *faults*: they light the error indicator but never
//! stop arbitration.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or incomplete.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Zone count outside 1..=6.
    ZoneCount(u8),
    /// Number of zone bindings does not match `num_zones`.
    ZoneBindingMismatch { configured: u8, bound: usize },
    /// A required binding was not supplied.
    MissingBinding(&'static str),
    /// A timing parameter is out of range.
    InvalidTiming(&'static str),
    /// The configuration document could not be parsed.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZoneCount(n) => write!(f, "zone count {n} outside 1..=6"),
            Self::ZoneBindingMismatch { configured, bound } => {
                write!(f, "{configured} zones configured but {bound} bound")
            }
            Self::MissingBinding(what) => write!(f, "missing required binding: {what}"),
            Self::InvalidTiming(msg) => write!(f, "invalid timing: {msg}"),
            Self::Malformed => write!(f, "malformed configuration"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Runtime faults
// ---------------------------------------------------------------------------

/// Non-fatal runtime conditions.  Accumulated in a bitfield by the fault
/// supervisor so several can be active at once and cleared individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Fault {
    /// An opposing-mode call has been deferred longer than the alarm bound.
    ConflictDeferred = 0b0000_0001,
    /// A zone asserts a stage call without its fan input (confirmed).
    MissingFanCall = 0b0000_0010,
}

impl Fault {
    pub const ALL: [Self; 2] = [Self::ConflictDeferred, Self::MissingFanCall];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConflictDeferred => write!(f, "conflicting call deferred too long"),
            Self::MissingFanCall => write!(f, "stage call without fan"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
