//! Fuzz target for glob matching with negation.
//!
//! Goal: compiling and matching pattern sets should **never panic** on any input.
//! Invalid patterns may return errors, but panics are unacceptable.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_glob_expansion
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct GlobInput {
    /// Patterns, `!` negates (e.g. "data/**/*.json", "!data/skip.json")
    patterns: Vec<String>,
    /// Relative paths to match
    candidates: Vec<String>,
}

fuzz_target!(|input: GlobInput| {
    if input.patterns.len() > 20 || input.candidates.len() > 100 {
        return;
    }
    let patterns: Vec<String> = input
        .patterns
        .into_iter()
        .filter(|p| p.len() <= 256)
        .collect();

    let Ok(set) = datalint_repo::PatternSet::new(&patterns) else {
        return;
    };
    for candidate in input.candidates.iter().filter(|c| c.len() <= 512) {
        let matched = set.is_match(candidate);
        if matched {
            assert!(!set.is_excluded(candidate));
        }
    }
});
