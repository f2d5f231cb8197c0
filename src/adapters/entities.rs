//! Console-backed home-automation entities.
//!
//! Stand-ins for the zone status text sensors and the mode selector when
//! no automation host is attached: status lines go to the log, and the
//! selector keeps its value in memory (seeded from configuration or set
//! by a service command).

use heapless::String;
use log::{info, warn};

use crate::app::ports::{ModeSelect, TextOutput};
use crate::mode::SystemMode;

/// Longest status or selector label.
const LABEL_LEN: usize = 32;

/// Zone status text written to the log.
pub struct LogTextOutput {
    name: &'static str,
    last: String<LABEL_LEN>,
}

impl LogTextOutput {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            last: String::new(),
        }
    }

    /// Last published text.
    pub fn text(&self) -> &str {
        &self.last
    }
}

impl TextOutput for LogTextOutput {
    fn publish(&mut self, text: &str) {
        self.last.clear();
        if self.last.push_str(text).is_err() {
            warn!("{}: status text truncated", self.name);
        }
        info!("{} -> {}", self.name, text);
    }
}

/// In-memory mode selector.
///
/// Holds the raw label so an unknown value set by the host reads back as
/// "no selection" instead of being coerced.
#[derive(Default)]
pub struct MemoryModeSelect {
    label: String<LABEL_LEN>,
}

impl MemoryModeSelect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selection from a host-provided label.
    pub fn select_label(&mut self, label: &str) {
        self.label.clear();
        if self.label.push_str(label).is_err() {
            warn!("Mode selection '{}' too long, ignored", label);
            self.label.clear();
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl ModeSelect for MemoryModeSelect {
    fn publish(&mut self, mode: SystemMode) {
        self.select_label(mode.as_str());
        info!("Mode select -> {}", mode);
    }

    fn selected(&mut self) -> Option<SystemMode> {
        SystemMode::from_label(&self.label)
    }
}
