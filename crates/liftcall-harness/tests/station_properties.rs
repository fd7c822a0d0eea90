//! Property-based tests for the station runtime.
//!
//! Arbitrary interleavings of console requests and companion tokens are fed
//! to the runtime one tick at a time, against a panel that loses a random
//! number of requests. Invariants are checked after every tick.

use liftcall_app::{Runtime, RuntimeConfig};
use liftcall_core::{CallConfig, RobotState};
use liftcall_harness::{PanelSim, ScriptedRadio, SimDriver, SimEnv};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Input {
    Get(String),
    Status(&'static str),
    Idle,
}

fn floor_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => (0u32..10).prop_map(|n| n.to_string()),
        1 => Just("abc".to_string()),
        1 => Just(String::new()),
    ]
}

fn input_strategy() -> impl Strategy<Value = Input> {
    prop_oneof![
        3 => floor_strategy().prop_map(|n| Input::Get(format!("/currentfloor/{n}"))),
        3 => floor_strategy().prop_map(|n| Input::Get(format!("/floor/{n}"))),
        1 => Just(Input::Get("/status".to_string())),
        1 => Just(Input::Get("/".to_string())),
        2 => prop::sample::select(vec!["entered1", "entered2", "exited", "positioning", "bogus"])
            .prop_map(Input::Status),
        1 => Just(Input::Idle),
    ]
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(future)
}

proptest! {
    /// Calls always run to completion within their tick, and the sequence
    /// advances exactly once per call.
    #[test]
    fn calls_complete_within_tick(
        inputs in prop::collection::vec(input_strategy(), 1..40),
        lost in 0usize..8,
    ) {
        block_on(async {
            let env = SimEnv::new();
            let radio = ScriptedRadio::with_panel(env.clone(), PanelSim::new().drop_first(lost));
            let driver = SimDriver::new();
            let mut runtime =
                Runtime::new(driver.clone(), radio.clone(), env, RuntimeConfig::default());
            let max_attempts = CallConfig::default().max_attempts() as usize;

            for input in inputs {
                match input {
                    Input::Get(path) => driver.inject_get(&path),
                    Input::Status(token) => driver.inject_status(token),
                    Input::Idle => {},
                }
                runtime.tick().await;

                let state = runtime.machine().state();
                prop_assert!(state != RobotState::Calling, "left in Calling");
                prop_assert!(!runtime.machine().has_pending_call(), "call left pending in {state:?}");

                let calls = driver
                    .display()
                    .iter()
                    .filter(|lines| lines.line1 == "Calling elevator")
                    .count();
                prop_assert_eq!(usize::from(runtime.machine().sequence().value()), calls);
                prop_assert!(radio.transmitted().len() <= calls * max_attempts);

                for reply in driver.take_replies() {
                    prop_assert!(matches!(reply.status, 200 | 400 | 409), "status {}", reply.status);
                }
            }
            Ok(())
        })?;
    }
}
