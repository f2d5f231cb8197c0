//! Fuzz target: `ControllerConfig::from_json`
//!
//! Arbitrary documents must either be rejected or produce a configuration
//! that passes its own validation.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use openzone::ControllerConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = ControllerConfig::from_json(text) {
        assert!(config.validate().is_ok());
        assert!(config.zone_count() >= 1);
    }
});
