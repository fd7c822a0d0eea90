//! Status channel behavior through the real runtime: connection upkeep,
//! position tokens and floor notices.

use liftcall_app::{Runtime, RuntimeConfig};
use liftcall_core::{ChannelEvent, ConnectionStatus, DisplayLines, RobotState};
use liftcall_harness::{PanelSim, ScriptedRadio, SimDriver, SimEnv};
use liftcall_proto::{FLOOR_REQUEST_TOPIC, ROBOT_IN_TOPIC, STATUS_TOPIC};

type SimRuntime = Runtime<SimDriver, ScriptedRadio, SimEnv>;

fn station() -> (SimRuntime, SimDriver) {
    let env = SimEnv::new();
    let radio = ScriptedRadio::with_panel(env.clone(), PanelSim::new());
    let driver = SimDriver::new();
    let runtime = Runtime::new(driver.clone(), radio, env, RuntimeConfig::default());
    (runtime, driver)
}

fn presence_count(driver: &SimDriver) -> usize {
    driver.published().iter().filter(|(topic, _)| topic == STATUS_TOPIC).count()
}

#[tokio::test]
async fn first_tick_connects_subscribes_and_announces() {
    let (mut runtime, driver) = station();

    runtime.tick().await;

    assert!(runtime.bridge().is_connected());
    assert_eq!(driver.connect_attempts(), 1);
    assert_eq!(driver.subscriptions(), vec![ROBOT_IN_TOPIC.to_string()]);
    assert_eq!(
        driver.published(),
        vec![(STATUS_TOPIC.to_string(), "ESP32 connected and subscribed".to_string())]
    );
}

#[tokio::test]
async fn reconnect_attempts_are_spaced() {
    let (mut runtime, driver) = station();
    driver.set_broker_up(false);

    // Ticks at t = 0..=11 s
    runtime.run_ticks(12).await;
    assert_eq!(driver.connect_attempts(), 3);
    assert_eq!(runtime.bridge().status(), ConnectionStatus::Disconnected);
    assert!(driver.display().contains(&DisplayLines::single("MQTT not connected")));

    driver.set_broker_up(true);
    // Ticks at t = 12..=15 s; the attempt at 15 s succeeds
    runtime.run_ticks(4).await;
    assert_eq!(driver.connect_attempts(), 4);
    assert!(runtime.bridge().is_connected());
    assert_eq!(presence_count(&driver), 1);
}

#[tokio::test]
async fn subscription_refreshed_every_thirty_seconds() {
    let (mut runtime, driver) = station();

    // Ticks at t = 0..=60 s
    runtime.run_ticks(61).await;

    assert_eq!(driver.connect_attempts(), 1);
    assert_eq!(driver.subscriptions().len(), 3);
}

#[tokio::test]
async fn dropped_session_reconnects_and_reannounces() {
    let (mut runtime, driver) = station();
    runtime.run_ticks(10).await;

    driver.inject_event(ChannelEvent::Disconnected { reason: "keep-alive timeout".into() });
    runtime.tick().await;

    assert!(runtime.bridge().is_connected());
    assert_eq!(driver.connect_attempts(), 2);
    assert_eq!(presence_count(&driver), 2);
}

#[tokio::test]
async fn position_tokens_drive_state() {
    let (mut runtime, driver) = station();
    runtime.tick().await;

    driver.inject_status("entered1");
    runtime.tick().await;
    assert_eq!(runtime.machine().state(), RobotState::WaitingAtZone);

    driver.inject_status("entered2");
    runtime.tick().await;
    assert_eq!(runtime.machine().state(), RobotState::InElevator);

    driver.inject_status("exited");
    runtime.tick().await;
    assert_eq!(runtime.machine().state(), RobotState::Exited);

    // Exited is only left by another position token
    driver.inject_get("/floor/3");
    runtime.tick().await;
    assert_eq!(runtime.machine().state(), RobotState::Exited);
    assert_eq!(driver.take_replies().pop().unwrap().status, 409);
}

#[tokio::test]
async fn non_position_messages_only_update_display() {
    let (mut runtime, driver) = station();
    runtime.tick().await;

    driver.inject_status("positioning");
    driver.inject_status("dancing");
    driver.inject_message("robot/other", "entered2");
    runtime.tick().await;

    assert_eq!(runtime.machine().state(), RobotState::Idle);
    let display = driver.display();
    assert!(display.contains(&DisplayLines::single("Received: positioning")));
    assert!(display.contains(&DisplayLines::new("Robot positioning", "(from Pi via MQTT)")));
    assert!(display.contains(&DisplayLines::single("Received: dancing")));
    // Messages on other topics leave the display alone
    assert!(!display.iter().any(|lines| lines.line1.contains("entered2")));
    assert!(!display.contains(&DisplayLines::new("Robot in elevator", "(from Pi via MQTT)")));
}

#[tokio::test]
async fn waiting_screen_returns_after_quiet_period() {
    let (mut runtime, driver) = station();
    runtime.run_ticks(2).await;

    driver.inject_status("positioning");
    runtime.run_ticks(1).await;
    assert_eq!(
        driver.last_display(),
        Some(DisplayLines::new("Robot positioning", "(from Pi via MQTT)"))
    );

    // Message at t = 2 s; quiet until t = 5 s
    runtime.run_ticks(3).await;
    assert_eq!(
        driver.last_display(),
        Some(DisplayLines::new("MQTT connected", "Waiting for messages..."))
    );
}

#[tokio::test]
async fn floor_notice_dropped_while_broker_down() {
    let (mut runtime, driver) = station();
    driver.set_broker_up(false);

    driver.inject_get("/currentfloor/2");
    runtime.tick().await;
    driver.inject_get("/floor/5");
    runtime.tick().await;

    // One scheduled attempt, one immediate attempt ahead of the notice
    assert_eq!(driver.connect_attempts(), 2);
    assert!(driver.published().iter().all(|(topic, _)| topic != FLOOR_REQUEST_TOPIC));

    // The call itself still goes out
    assert_eq!(runtime.machine().state(), RobotState::Idle);
    assert_eq!(driver.last_display().unwrap().line1, "Elevator called");
}

#[tokio::test]
async fn floor_notice_reconnects_when_broker_returns() {
    let (mut runtime, driver) = station();
    driver.set_broker_up(false);

    driver.inject_get("/currentfloor/4");
    runtime.tick().await;
    driver.set_broker_up(true);
    driver.inject_get("/floor/1");
    runtime.tick().await;

    assert!(runtime.bridge().is_connected());
    assert!(driver.published().contains(&(FLOOR_REQUEST_TOPIC.to_string(), "4,1,0".to_string())));
}
