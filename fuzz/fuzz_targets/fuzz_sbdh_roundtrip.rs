#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Wrapping a parsed document must keep it parseable.
        if let Ok(document) = factuur::parse(s) {
            if let Ok(wrapped) = factuur::generate_with_sbdh(&document) {
                let _ = factuur::parse(&wrapped);
            }
        }
    }
});
