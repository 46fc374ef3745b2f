//! Property tests for the line framer.
//!
//! Inputs are drawn from an alphabet heavy in `\r` and `\n` so delimiters,
//! split delimiters and stray carriage returns all show up often.

use ledwire_proto::{DELIMITER, LineFramer};
use proptest::prelude::*;

fn chunks() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[ab\r\n\u{e9}]{0,12}", 0..24)
}

proptest! {
    #[test]
    fn lines_plus_remainder_reassemble_input(chunks in chunks()) {
        let mut framer = LineFramer::new();
        let mut rebuilt = String::new();
        for chunk in &chunks {
            for line in framer.feed(chunk) {
                prop_assert!(!line.contains(DELIMITER));
                rebuilt.push_str(&line);
                rebuilt.push_str(DELIMITER);
            }
        }
        rebuilt.push_str(framer.pending());

        prop_assert_eq!(rebuilt, chunks.concat());
    }

    #[test]
    fn chunk_boundaries_do_not_change_lines(chunks in chunks()) {
        let mut split = LineFramer::new();
        let mut split_lines = Vec::new();
        for chunk in &chunks {
            split_lines.extend(split.feed(chunk));
        }

        let mut whole = LineFramer::new();
        let whole_lines = whole.feed(&chunks.concat());

        prop_assert_eq!(split_lines, whole_lines);
        prop_assert_eq!(split.pending(), whole.pending());
    }

    #[test]
    fn buffer_never_holds_a_complete_line(chunks in chunks()) {
        let mut framer = LineFramer::new();
        for chunk in &chunks {
            framer.feed(chunk);
            prop_assert!(!framer.pending().contains(DELIMITER));
        }
    }
}
