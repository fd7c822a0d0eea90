//! Generic runtime for station orchestration.
//!
//! The Runtime drives the coordination loop, one tick at a time:
//!
//! 1. Let the [`Gateway`] admit at most one console request
//! 2. Drain status channel events through the [`StatusBridge`] and run its
//!    maintenance
//! 3. If a floor request is pending, run the [`CallProtocol`] to completion
//!
//! Step 3 blocks the loop for the whole protocol run. Status events that
//! arrive meanwhile queue up in the driver and are drained right after the
//! outcome is applied, before the console is served again, so the last
//! event wins over the call outcome.

use std::{collections::VecDeque, time::Duration};

use liftcall_core::{
    BridgeAction, BridgeConfig, CallConfig, CallOutcome, CallProtocol, CallStep, ChannelEvent,
    DisplayLines, Environment, Gateway, GatewayConfig, MachineEvent, RequestMachine, StatusBridge,
    Transition,
};

use crate::{Driver, ListenOutcome, RadioAdapter, RadioLink};

/// Pause between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Retry protocol settings
    pub call: CallConfig,
    /// Status channel settings
    pub bridge: BridgeConfig,
    /// Console settings
    pub gateway: GatewayConfig,
    /// Pause after every tick
    pub tick_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            call: CallConfig::default(),
            bridge: BridgeConfig::default(),
            gateway: GatewayConfig::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Generic runtime that orchestrates the station state machines.
///
/// # Type Parameters
///
/// - `D`: console, status channel and display driver
/// - `R`: radio link to the call panel
/// - `E`: time source
pub struct Runtime<D, R, E>
where
    D: Driver,
    R: RadioLink,
    E: Environment,
{
    driver: D,
    radio: RadioAdapter<R, E>,
    env: E,
    machine: RequestMachine,
    bridge: StatusBridge<E::Instant>,
    gateway: Gateway,
    call_config: CallConfig,
    tick_interval: Duration,
}

impl<D, R, E> Runtime<D, R, E>
where
    D: Driver,
    R: RadioLink,
    E: Environment,
{
    /// Create a runtime in the boot state: `Idle`, sequence 0, status
    /// channel disconnected.
    pub fn new(driver: D, radio: R, env: E, config: RuntimeConfig) -> Self {
        let tick_interval = config.tick_interval;
        Self {
            driver,
            radio: RadioAdapter::new(radio, env.clone()),
            env,
            machine: RequestMachine::new(),
            bridge: StatusBridge::new(config.bridge),
            gateway: Gateway::new(config.gateway),
            call_config: config.call,
            tick_interval,
        }
    }

    /// Run the coordination loop forever.
    ///
    /// Nothing inside the loop is fatal: I/O errors are logged and folded
    /// into state.
    pub async fn run(&mut self) {
        self.driver.show(&DisplayLines::new("Robot ready", "Waiting for floor"));
        tracing::info!(
            tick_ms = self.tick_interval.as_millis(),
            max_attempts = self.call_config.max_attempts(),
            "Coordination loop started"
        );

        loop {
            self.tick().await;
            self.env.sleep(self.tick_interval).await;
        }
    }

    /// Run `ticks` iterations of the loop, sleeping between them.
    pub async fn run_ticks(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick().await;
            self.env.sleep(self.tick_interval).await;
        }
    }

    /// One loop iteration (without the trailing sleep).
    pub async fn tick(&mut self) {
        self.serve_console().await;
        self.service_status_channel().await;

        if self.machine.has_pending_call() {
            self.run_call().await;
        }
    }

    /// Request state machine.
    pub fn machine(&self) -> &RequestMachine {
        &self.machine
    }

    /// Status channel bridge.
    pub fn bridge(&self) -> &StatusBridge<E::Instant> {
        &self.bridge
    }

    /// I/O driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// I/O driver, mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Radio adapter.
    pub fn radio(&self) -> &RadioAdapter<R, E> {
        &self.radio
    }

    async fn serve_console(&mut self) {
        let request = match self.driver.next_request().await {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Console accept failed");
                return;
            },
        };

        let reply = self.gateway.handle(&request, &mut self.machine);
        if let Some(lines) = &reply.display {
            self.driver.show(lines);
        }
        if let Err(e) = self.driver.reply(&reply).await {
            tracing::warn!(error = %e, status = reply.status, "Console reply failed");
        }
    }

    async fn service_status_channel(&mut self) {
        let now = self.env.now();
        let mut actions = self.drain_status_events(now);
        actions.extend(self.bridge.tick(now));

        self.execute_bridge_actions(actions).await;
    }

    fn drain_status_events(&mut self, now: E::Instant) -> Vec<BridgeAction> {
        let mut actions = Vec::new();
        while let Some(event) = self.driver.poll_status() {
            actions.extend(self.bridge.handle_event(event, now));
        }
        actions
    }

    /// Execute bridge actions in order. Follow-up actions produced by a
    /// connection attempt run before the remaining ones.
    async fn execute_bridge_actions(&mut self, actions: Vec<BridgeAction>) {
        let mut queue = VecDeque::from(actions);

        while let Some(action) = queue.pop_front() {
            match action {
                BridgeAction::Connect => {
                    let event = match self.driver.connect().await {
                        Ok(()) => ChannelEvent::Connected,
                        Err(e) => ChannelEvent::Disconnected { reason: e.to_string() },
                    };
                    let follow_ups = self.bridge.handle_event(event, self.env.now());
                    for follow_up in follow_ups.into_iter().rev() {
                        queue.push_front(follow_up);
                    }
                },
                BridgeAction::Subscribe { topic } => {
                    if let Err(e) = self.driver.subscribe(&topic).await {
                        tracing::warn!(%topic, error = %e, "Subscribe failed");
                    }
                },
                BridgeAction::Publish { topic, payload } => {
                    if !self.bridge.is_connected() {
                        tracing::warn!(%topic, %payload, "Status channel not connected, dropping message");
                        continue;
                    }
                    match self.driver.publish(&topic, &payload).await {
                        Ok(()) => tracing::debug!(%topic, %payload, "Published"),
                        Err(e) => tracing::warn!(%topic, error = %e, "Publish failed"),
                    }
                },
                BridgeAction::Position(position) => {
                    if let Some(transition) = self.machine.apply_position(position) {
                        log_transition(transition);
                    }
                },
                BridgeAction::Display(lines) => self.driver.show(&lines),
            }
        }
    }

    async fn run_call(&mut self) {
        let ticket = match self.machine.begin_call() {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::error!(error = %e, "Cannot start call");
                return;
            },
        };
        let request = ticket.request;
        let route = format!("Floor {} -> {}", request.current_floor, request.target_floor);

        tracing::info!(
            sequence = %ticket.sequence,
            current_floor = request.current_floor,
            target_floor = request.target_floor,
            "Calling elevator"
        );
        self.driver.show(&DisplayLines::new("Calling elevator", route.clone()));

        let notice = ticket.notice(self.env.uptime_secs());
        let actions = self.bridge.announce_floor_request(notice, self.env.now());
        self.execute_bridge_actions(actions).await;

        let mut protocol = CallProtocol::new(ticket, self.call_config);
        let mut step = protocol.start(self.env.uptime_secs());

        let outcome = loop {
            step = match step {
                CallStep::Transmit(frame) => {
                    let result = self.radio.transmit(&frame).await.map_err(|e| e.to_string());
                    protocol.on_transmitted(result)
                },
                CallStep::Listen(window) => match self.radio.listen(window).await {
                    ListenOutcome::Received(frame) => protocol.on_frame(&frame),
                    ListenOutcome::Timeout => protocol.on_listen_timeout(),
                },
                CallStep::Wait(delay) => {
                    self.env.sleep(delay).await;
                    protocol.on_wait_elapsed(self.env.uptime_secs())
                },
                CallStep::Done(outcome) => break outcome,
            };
        };

        let (event, display) = match outcome {
            CallOutcome::Confirmed { attempt } => {
                tracing::info!(attempt, sequence = %protocol.sequence(), "Elevator call confirmed");
                (MachineEvent::CallConfirmed, DisplayLines::new("Elevator called", route))
            },
            CallOutcome::Failed(failure) => {
                tracing::warn!(error = %failure, sequence = %protocol.sequence(), "Elevator call failed");
                (MachineEvent::CallFailed(failure), DisplayLines::new("Elevator call failed", route))
            },
        };

        match self.machine.apply(event) {
            Ok(transitions) => transitions.into_iter().for_each(log_transition),
            Err(e) => tracing::error!(error = %e, "Call outcome rejected"),
        }
        self.driver.show(&display);

        // Positions reported during the call override its outcome
        let actions = self.drain_status_events(self.env.now());
        self.execute_bridge_actions(actions).await;
    }
}

fn log_transition(transition: Transition) {
    tracing::info!(
        from = ?transition.from,
        to = ?transition.to,
        status = transition.to.description(),
        "State transition"
    );
}
