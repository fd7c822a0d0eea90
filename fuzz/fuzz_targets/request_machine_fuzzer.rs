//! Fuzz target for the request state machine
//!
//! Applies arbitrary event sequences, including events that are invalid in
//! the current state.
//!
//! # Invariants
//!
//! - A rejected event leaves state, floors and sequence unchanged
//! - The sequence only advances when a call starts, by exactly one
//! - Floors are only accepted while `Idle`
//! - A call outcome always returns the machine to `Idle` with floors cleared
//! - A position that preempts an accepted or running call clears the floors

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use liftcall_core::{CallFailure, MachineEvent, PositionEvent, RequestMachine, RobotState};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Current(u8),
    Target(u8),
    Start,
    Confirm,
    Fail,
    EnteredZone,
    EnteredElevator,
    Exited,
}

impl Op {
    fn event(&self) -> MachineEvent {
        match *self {
            Op::Current(floor) => MachineEvent::CurrentFloorSelected(floor),
            Op::Target(floor) => MachineEvent::TargetFloorSelected(floor),
            Op::Start => MachineEvent::CallStarted,
            Op::Confirm => MachineEvent::CallConfirmed,
            Op::Fail => MachineEvent::CallFailed(CallFailure::RetriesExhausted { attempts: 6 }),
            Op::EnteredZone => MachineEvent::Position(PositionEvent::EnteredZone),
            Op::EnteredElevator => MachineEvent::Position(PositionEvent::EnteredElevator),
            Op::Exited => MachineEvent::Position(PositionEvent::Exited),
        }
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut machine = RequestMachine::new();

    for op in ops {
        let state = machine.state();
        let request = machine.floor_request();
        let sequence = machine.sequence();

        match machine.apply(op.event()) {
            Ok(transitions) => {
                if let Some(first) = transitions.first() {
                    assert_eq!(first.from, state);
                }
                if let Some(last) = transitions.last() {
                    assert_eq!(last.to, machine.state());
                }

                match op {
                    Op::Current(_) | Op::Target(_) => assert_eq!(state, RobotState::Idle),
                    Op::Start => {
                        assert_eq!(machine.sequence(), sequence.next());
                        assert_eq!(machine.state(), RobotState::Calling);
                    }
                    Op::Confirm | Op::Fail => {
                        assert_eq!(machine.state(), RobotState::Idle);
                        assert_eq!(machine.floor_request().current_floor, 0);
                        assert_eq!(machine.floor_request().target_floor, 0);
                    }
                    Op::EnteredZone | Op::EnteredElevator | Op::Exited => {
                        let preempted =
                            matches!(state, RobotState::RequestAccepted | RobotState::Calling);
                        if preempted {
                            assert_eq!(machine.floor_request().target_floor, 0);
                            assert!(!machine.has_pending_call());
                        }
                    }
                }
                if !matches!(op, Op::Start) {
                    assert_eq!(machine.sequence(), sequence);
                }
            }
            Err(_) => {
                assert_eq!(machine.state(), state);
                assert_eq!(machine.floor_request(), request);
                assert_eq!(machine.sequence(), sequence);
            }
        }
    }
});
