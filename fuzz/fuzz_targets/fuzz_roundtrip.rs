#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parse → generate → parse must not panic at any step.
        if let Ok(document) = factuur::parse(s) {
            if let Ok(xml2) = factuur::generate(&document) {
                let _ = factuur::parse(&xml2);
            }
        }
    }
});
