//! Arbitrary chunk sequences must reassemble exactly.

#![no_main]

use ledwire_proto::{DELIMITER, LineFramer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|chunks: Vec<String>| {
    let mut framer = LineFramer::new();
    let mut rebuilt = String::new();

    for chunk in &chunks {
        for line in framer.feed(chunk) {
            assert!(!line.contains(DELIMITER));
            rebuilt.push_str(&line);
            rebuilt.push_str(DELIMITER);
        }
        assert!(!framer.pending().contains(DELIMITER));
    }
    rebuilt.push_str(framer.pending());

    assert_eq!(rebuilt, chunks.concat());
});
