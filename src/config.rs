//! Controller configuration parameters
//!
//! All tunable parameters for the OpenZone controller.  The host-side
//! loader builds this from its declarative zone list (or JSON) and the
//! controller validates it once at startup.

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::zone::MAX_ZONES;

/// How a manual selection on the mode entity affects arbitration when
/// `auto_mode` is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManualPolicy {
    /// The selected mode overrides the zones' changeover signals.
    Constrain,
    /// Zones still decide; a mismatch with the selection is only logged.
    Advisory,
}

/// Level of the zone O/B changeover input that means "heat".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeoverPolarity {
    AssertedIsHeat,
    AssertedIsCool,
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Zones ---
    /// Number of configured zones (1-6)
    pub num_zones: u8,

    // --- Equipment protection ---
    /// Minimum compressor/burner run time once a cycle starts (ms)
    pub min_cycle_time_ms: u32,
    /// Fan-only purge after a cycle (ms); 0 disables purge
    pub purge_duration_ms: u32,
    /// Continuous stage-2 demand needed before escalating (ms)
    pub stage2_escalation_ms: u32,

    // --- Mode ---
    /// Derive the system mode from zone changeover signals
    pub auto_mode: bool,
    /// Manual-mode behaviour when `auto_mode` is false
    pub manual_policy: ManualPolicy,
    /// Zone changeover input polarity
    pub changeover_polarity: ChangeoverPolarity,

    // --- Dampers ---
    /// Travel/settle window with no position feedback (ms)
    pub damper_settle_ms: u32,
    /// Dead-time with both damper relays off before a move (ms)
    pub damper_release_ms: u32,
    /// Pause between consecutive damper moves on one tick (ms)
    pub damper_stagger_ms: u32,

    // --- Faults ---
    /// Opposing-mode deferral age that raises the error indicator (ms)
    pub conflict_alarm_ms: u32,
    /// Flag zones that call a stage without the fan input
    pub detect_missing_fan: bool,
    /// Keep OB asserted while purging after a cooling cycle
    pub hold_reversing_valve_in_purge: bool,

    // --- Timing ---
    /// Poll interval of the host scheduler (ms)
    pub poll_interval_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            num_zones: 1,

            min_cycle_time_ms: 480_000,    // 8 min
            purge_duration_ms: 300_000,    // 5 min
            stage2_escalation_ms: 3_600_000, // 1 h

            auto_mode: true,
            manual_policy: ManualPolicy::Constrain,
            changeover_polarity: ChangeoverPolarity::AssertedIsHeat,

            damper_settle_ms: 5_000,
            damper_release_ms: 250,
            damper_stagger_ms: 100,

            conflict_alarm_ms: 1_800_000, // 30 min
            detect_missing_fan: true,
            hold_reversing_valve_in_purge: false,

            poll_interval_ms: 10_000, // 0.1 Hz
        }
    }
}

impl ControllerConfig {
    /// Default timing with the given zone count.
    pub fn with_zones(num_zones: u8) -> Self {
        Self {
            num_zones,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_zones == 0 || self.num_zones as usize > MAX_ZONES {
            return Err(ConfigError::ZoneCount(self.num_zones));
        }
        if self.min_cycle_time_ms == 0 {
            return Err(ConfigError::InvalidTiming("min_cycle_time must be > 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidTiming("poll_interval must be > 0"));
        }
        // Both delays block the poll loop.
        if self.damper_release_ms > 2_000 {
            return Err(ConfigError::InvalidTiming("damper_release must be <= 2000 ms"));
        }
        if self.damper_stagger_ms > 1_000 {
            return Err(ConfigError::InvalidTiming("damper_stagger must be <= 1000 ms"));
        }
        Ok(())
    }

    /// Number of zones as an index bound.
    pub fn zone_count(&self) -> usize {
        self.num_zones as usize
    }

    /// Log every parameter at startup.
    pub fn log_summary(&self) {
        info!("OpenZone controller:");
        info!("  Update interval: {:.1}s", self.poll_interval_ms as f32 / 1000.0);
        info!("  Zones configured: {}", self.num_zones);
        info!("  Min cycle time: {} ms", self.min_cycle_time_ms);
        info!("  Purge duration: {} ms", self.purge_duration_ms);
        info!("  Stage 2 escalation: {} ms", self.stage2_escalation_ms);
        info!("  Damper settle: {} ms", self.damper_settle_ms);
        info!("  Damper release/stagger: {}/{} ms", self.damper_release_ms, self.damper_stagger_ms);
        info!("  Auto mode: {}", if self.auto_mode { "YES" } else { "NO" });
        info!("  Manual policy: {:?}", self.manual_policy);
        info!("  Changeover: {:?}", self.changeover_polarity);
        info!("  Conflict alarm after: {} ms", self.conflict_alarm_ms);
    }
}
