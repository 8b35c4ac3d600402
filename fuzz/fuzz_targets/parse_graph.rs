#![no_main]

use circlerank_core::graph::{EngagementTable, GraphDocument};
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes must never panic the parsers; errors are fine.
fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = GraphDocument::parse(text);
        let _ = EngagementTable::parse(text);
    }
});
