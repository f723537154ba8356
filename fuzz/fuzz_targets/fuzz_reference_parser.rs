//! Fuzz target for module reference parsing.
//!
//! Goal: the parser should **never panic**, and every accepted reference must be pinned to a
//! 40-hex commit and install below the cache base.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_reference_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(reference) = datalint_domain::parse_reference(line) {
        assert_eq!(reference.git_ref().len(), 40);
        assert!(reference.git_ref().bytes().all(|b| b.is_ascii_hexdigit()));
        let dir = reference.install_dir(camino::Utf8Path::new("/cache"));
        assert!(dir.starts_with("/cache/github.com"));
    }
});
