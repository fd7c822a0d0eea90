//! Fuzz target for console request handling
//!
//! Arbitrary request heads go through the gateway against an idle machine.
//!
//! # Invariants
//!
//! - Never panics, whatever the request bytes
//! - Only 200, 400 and 404 are possible while idle
//! - A rejected request leaves the machine untouched

#![no_main]

use libfuzzer_sys::fuzz_target;
use liftcall_core::{Gateway, RequestMachine, RobotState};

fuzz_target!(|data: &[u8]| {
    let request = String::from_utf8_lossy(data);
    let gateway = Gateway::default();
    let mut machine = RequestMachine::new();

    let reply = gateway.handle(&request, &mut machine);
    assert!(matches!(reply.status, 200 | 400 | 404), "unexpected status {}", reply.status);

    if reply.status != 200 {
        assert_eq!(machine.state(), RobotState::Idle);
        assert_eq!(machine.floor_request().current_floor, 0);
        assert_eq!(machine.floor_request().target_floor, 0);
    }
});
