//! Fuzz target for Frame::decode
//!
//! Arbitrary radio datagrams must never panic the decoder. Anything that is
//! not exactly 9 bytes is rejected; every 9-byte input decodes and re-encodes
//! to the same bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use liftcall_proto::Frame;

fuzz_target!(|data: &[u8]| {
    match Frame::decode(data) {
        Ok(frame) => {
            assert_eq!(data.len(), Frame::SIZE);
            assert_eq!(&frame.to_bytes()[..], data);
        }
        Err(_) => assert_ne!(data.len(), Frame::SIZE),
    }
});
