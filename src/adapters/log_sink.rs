//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured controller events to
//! the logger (UART / USB-CDC on target).  A home-automation bridge would
//! implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { zones } => {
                info!("START | zones={}", zones);
            }
            AppEvent::PhaseChanged { from, to } => {
                info!("PHASE | {:?} -> {:?}", from, to);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE  | {} -> {}", from, to);
            }
            AppEvent::ZoneStatusChanged { zone, status } => {
                info!("ZONE  | {} = {}", zone + 1, status);
            }
            AppEvent::FaultDetected(fault) => {
                warn!("FAULT | detected: {}", fault);
            }
            AppEvent::FaultCleared(fault) => {
                info!("FAULT | cleared: {}", fault);
            }
        }
    }
}
