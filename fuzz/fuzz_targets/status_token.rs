//! Fuzz target for StatusToken and FloorNotice parsing
//!
//! Arbitrary status channel payloads must never panic, and whatever parses
//! must print back to the same text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use liftcall_proto::{FloorNotice, StatusToken};

fuzz_target!(|data: &[u8]| {
    let token = StatusToken::from_payload(data);
    assert_eq!(StatusToken::parse(token.as_str()), token);

    if let Ok(text) = std::str::from_utf8(data) {
        assert_eq!(token.as_str(), text);

        if let Ok(notice) = text.parse::<FloorNotice>() {
            assert_eq!(notice.to_string().parse::<FloorNotice>().ok(), Some(notice));
        }
    }
});
