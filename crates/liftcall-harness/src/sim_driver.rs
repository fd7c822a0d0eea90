//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the station driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`liftcall_app::Runtime`] orchestration code runs in both production and
//! simulation.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use liftcall_app::Driver;
use liftcall_core::{ChannelEvent, DisplayLines, GatewayReply};
use liftcall_proto::ROBOT_IN_TOPIC;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Shared state for injection and capture.
///
/// This allows injection from outside async contexts, including from a
/// radio hook while the call protocol is running.
struct SharedState {
    requests: VecDeque<String>,
    awaiting_reply: bool,
    replies: Vec<GatewayReply>,
    status_events: VecDeque<ChannelEvent>,
    broker_up: bool,
    connect_attempts: usize,
    subscriptions: Vec<String>,
    published: Vec<(String, String)>,
    display: Vec<DisplayLines>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            requests: VecDeque::new(),
            awaiting_reply: false,
            replies: Vec::new(),
            status_events: VecDeque::new(),
            broker_up: true,
            connect_attempts: 0,
            subscriptions: Vec::new(),
            published: Vec::new(),
            display: Vec::new(),
        }
    }
}

/// Simulation driver for deterministic testing.
///
/// Clones share state: keep one clone in the test and hand the other to the
/// runtime.
#[derive(Clone, Default)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
}

impl SimDriver {
    /// Create a new simulation driver with a reachable broker.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a bodiless `GET` for `path`.
    pub fn inject_get(&self, path: &str) {
        self.inject_request(format!("GET {path} HTTP/1.1\r\nHost: robot\r\n\r\n"));
    }

    /// Queue a raw request head.
    pub fn inject_request(&self, head: impl Into<String>) {
        self.state().requests.push_back(head.into());
    }

    /// Queue a status token on the inbound topic.
    pub fn inject_status(&self, token: &str) {
        self.inject_message(ROBOT_IN_TOPIC, token);
    }

    /// Queue a message on any topic.
    pub fn inject_message(&self, topic: &str, payload: &str) {
        self.inject_event(ChannelEvent::Message {
            topic: topic.to_string(),
            payload: payload.as_bytes().to_vec(),
        });
    }

    /// Queue a raw channel event.
    pub fn inject_event(&self, event: ChannelEvent) {
        self.state().status_events.push_back(event);
    }

    /// Make connection attempts succeed or fail.
    pub fn set_broker_up(&self, up: bool) {
        self.state().broker_up = up;
    }

    /// Console replies, in order.
    pub fn replies(&self) -> Vec<GatewayReply> {
        self.state().replies.clone()
    }

    /// Take all captured console replies.
    pub fn take_replies(&self) -> Vec<GatewayReply> {
        std::mem::take(&mut self.state().replies)
    }

    /// Number of connection attempts made.
    pub fn connect_attempts(&self) -> usize {
        self.state().connect_attempts
    }

    /// Topics subscribed, in order (repeats included).
    pub fn subscriptions(&self) -> Vec<String> {
        self.state().subscriptions.clone()
    }

    /// `(topic, payload)` pairs published, in order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.state().published.clone()
    }

    /// Every display update, in order.
    pub fn display(&self) -> Vec<DisplayLines> {
        self.state().display.clone()
    }

    /// Most recent display update.
    pub fn last_display(&self) -> Option<DisplayLines> {
        self.state().display.last().cloned()
    }

    /// True if queued requests or status events remain.
    pub fn has_pending(&self) -> bool {
        let state = self.state();
        !state.requests.is_empty() || !state.status_events.is_empty()
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn next_request(&mut self) -> Result<Option<String>, Self::Error> {
        let mut state = self.state();
        let request = state.requests.pop_front();
        state.awaiting_reply = request.is_some();
        Ok(request)
    }

    async fn reply(&mut self, reply: &GatewayReply) -> Result<(), Self::Error> {
        let mut state = self.state();
        if !state.awaiting_reply {
            return Err(SimDriverError("no pending console connection".to_string()));
        }
        state.awaiting_reply = false;
        state.replies.push(reply.clone());
        Ok(())
    }

    fn poll_status(&mut self) -> Option<ChannelEvent> {
        self.state().status_events.pop_front()
    }

    async fn connect(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.connect_attempts += 1;
        if state.broker_up {
            Ok(())
        } else {
            Err(SimDriverError("broker unreachable".to_string()))
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        self.state().subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Self::Error> {
        self.state().published.push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    fn show(&mut self, lines: &DisplayLines) {
        self.state().display.push(lines.clone());
    }
}
