//! Fuzz target: `LineDecoder::push`
//!
//! Streams arbitrary bytes through the upstream line decoder and asserts
//! that every yielded line is non-empty, trimmed, and within the buffer
//! bound, and that a reset leaves the decoder usable.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use envnode::protocol::LineDecoder;
use envnode::protocol::line::MAX_LINE_LEN;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    for &b in data {
        if let Some(line) = decoder.push(b) {
            assert!(!line.is_empty(), "decoder must not yield blank lines");
            assert!(line.len() <= MAX_LINE_LEN, "line exceeds MAX_LINE_LEN");
            assert_eq!(line.as_str(), line.trim());
        }
    }

    decoder.reset();
    for &b in b"MEGA_TEST\n" {
        if let Some(line) = decoder.push(b) {
            assert_eq!(line.as_str(), "MEGA_TEST");
        }
    }
});
