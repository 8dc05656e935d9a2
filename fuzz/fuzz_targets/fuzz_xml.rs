//! Fuzz testing for the XML-to-JSON converter.
//!
//! The converter is fed whatever the upstream provider returns, so it must
//! never panic on arbitrary bytes: any input yields either a JSON tree or
//! an error.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! # Install cargo-fuzz (requires nightly)
//! cargo +nightly install cargo-fuzz
//!
//! # Run the XML fuzz target
//! cargo +nightly fuzz run fuzz_xml
//!
//! # Run with a time limit (e.g., 60 seconds)
//! cargo +nightly fuzz run fuzz_xml -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use stagegate::upstream::xml::xml_to_value;
use stagegate::validation::validate_date;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Must never panic, only Ok or Err.
        let _ = xml_to_value(text);
        let _ = validate_date("start_date", text);
    }
});
