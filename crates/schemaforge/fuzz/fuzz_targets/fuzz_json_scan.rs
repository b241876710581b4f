//! Fuzz target for the LLM response JSON scanner.
//!
//! This fuzzer checks that the scanner:
//! 1. Never panics on arbitrary text
//! 2. Only returns a substring that starts with `{` and ends with `}`
//! 3. Agrees with the decoder: a returned object either decodes or is rejected

#![no_main]

use libfuzzer_sys::fuzz_target;
use schemaforge::classify::{extract_json_object, find_json_object};

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Some(found) = find_json_object(text) {
        assert!(found.starts_with('{'));
        assert!(found.ends_with('}'));
        assert!(text.contains(found));
    }

    let _ = extract_json_object(text);
});
