//! Fuzz target for config parsing and resolution.
//!
//! Goal: parsing and resolving `datalint.toml` should **never panic** on any input.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(cfg) = datalint_settings::parse_config_toml(text) {
        let _ = datalint_settings::resolve_config(cfg, Default::default());
    }
});
