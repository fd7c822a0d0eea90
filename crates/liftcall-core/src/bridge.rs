//! Status channel bridge.
//!
//! Maintains the publish/subscribe connection to the companion device and
//! turns its text tokens into position events. Uses the action pattern:
//! methods take time as input and return [`BridgeAction`]s for the driver to
//! execute.
//!
//! # Connection maintenance
//!
//! ```text
//!                 tick (≥ reconnect_interval since last attempt)
//! ┌──────────────┐ ──────────────────────────> ┌────────────┐
//! │ Disconnected │                             │ Connecting │
//! └──────────────┘ <────── failure ─────────── └────────────┘
//!        ^                                           │ success
//!        │ channel lost                              ↓
//!        │                                     ┌───────────┐
//!        └──────────────────────────────────── │ Connected │ ── resubscribe
//!                                              └───────────┘    every 30 s
//! ```

use std::{ops::Sub, time::Duration};

use liftcall_proto::{FLOOR_REQUEST_TOPIC, FloorNotice, ROBOT_IN_TOPIC, STATUS_TOPIC, StatusToken};

use crate::{display::DisplayLines, machine::PositionEvent};

/// Minimum spacing between connection attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(5000);

/// Subscription refresh period while connected.
pub const DEFAULT_RESUBSCRIBE_INTERVAL: Duration = Duration::from_millis(30_000);

/// Silence after which the display falls back to the waiting screen.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(3000);

/// Period of the connected status report.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(10_000);

/// Default client identifier on the status channel.
pub const DEFAULT_CLIENT_ID: &str = "robot_esp32";

/// Published on the status topic after every (re)connect.
pub const PRESENCE_MESSAGE: &str = "ESP32 connected and subscribed";

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Client identifier
    pub client_id: String,
    /// Topic carrying position tokens
    pub inbound_topic: String,
    /// Topic for floor-request notices
    pub floor_request_topic: String,
    /// Topic for the presence message
    pub status_topic: String,
    /// Minimum spacing between connection attempts
    pub reconnect_interval: Duration,
    /// Subscription refresh period
    pub resubscribe_interval: Duration,
    /// Silence before the waiting screen is shown
    pub quiet_period: Duration,
    /// Status report period
    pub report_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            inbound_topic: ROBOT_IN_TOPIC.to_string(),
            floor_request_topic: FLOOR_REQUEST_TOPIC.to_string(),
            status_topic: STATUS_TOPIC.to_string(),
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            resubscribe_interval: DEFAULT_RESUBSCRIBE_INTERVAL,
            quiet_period: DEFAULT_QUIET_PERIOD,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

/// Connection state of the status channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No session
    #[default]
    Disconnected,
    /// Attempt issued, result pending
    Connecting,
    /// Session established
    Connected,
}

/// Events reported by the status channel driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Session established
    Connected,
    /// Connection attempt failed or session lost
    Disconnected {
        /// Transport error description
        reason: String,
    },
    /// Message received
    Message {
        /// Topic it arrived on
        topic: String,
        /// Raw payload
        payload: Vec<u8>,
    },
}

/// Actions returned by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeAction {
    /// Attempt a connection, then report the result as a [`ChannelEvent`]
    Connect,
    /// Subscribe (idempotent)
    Subscribe {
        /// Topic to subscribe
        topic: String,
    },
    /// Publish a text message
    Publish {
        /// Destination topic
        topic: String,
        /// Message body
        payload: String,
    },
    /// Feed a position into the request machine
    Position(PositionEvent),
    /// Update the status display
    Display(DisplayLines),
}

/// Status channel bridge.
///
/// Pure state machine, generic over `Instant` like the rest of the core.
#[derive(Debug, Clone)]
pub struct StatusBridge<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    config: BridgeConfig,
    status: ConnectionStatus,
    last_attempt: Option<I>,
    last_message: Option<I>,
    last_subscribe: Option<I>,
    last_report: Option<I>,
    waiting_shown: bool,
    disconnected_shown: bool,
}

impl<I> StatusBridge<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a disconnected bridge. The first tick attempts a connection.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            status: ConnectionStatus::Disconnected,
            last_attempt: None,
            last_message: None,
            last_subscribe: None,
            last_report: None,
            waiting_shown: false,
            disconnected_shown: false,
        }
    }

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// True if the session is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Time of the most recent inbound message.
    #[must_use]
    pub fn last_message(&self) -> Option<I> {
        self.last_message
    }

    /// Bridge configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Periodic maintenance: reconnect, resubscribe, display fallback and
    /// status reporting.
    pub fn tick(&mut self, now: I) -> Vec<BridgeAction> {
        let mut actions = Vec::new();

        match self.status {
            ConnectionStatus::Disconnected | ConnectionStatus::Connecting => {
                if !self.disconnected_shown {
                    self.disconnected_shown = true;
                    actions.push(BridgeAction::Display(DisplayLines::single("MQTT not connected")));
                }

                if due(self.last_report, now, self.config.reconnect_interval) {
                    self.last_report = Some(now);
                    tracing::info!(topic = %self.config.inbound_topic, "Status channel disconnected");
                }

                if due(self.last_attempt, now, self.config.reconnect_interval) {
                    actions.push(self.begin_connect(now));
                }
            },
            ConnectionStatus::Connected => {
                if due(self.last_subscribe, now, self.config.resubscribe_interval) {
                    self.last_subscribe = Some(now);
                    tracing::debug!(topic = %self.config.inbound_topic, "Refreshing subscription");
                    actions.push(self.subscribe());
                }

                if !self.waiting_shown && due(self.last_message, now, self.config.quiet_period) {
                    self.waiting_shown = true;
                    actions.push(BridgeAction::Display(DisplayLines::new(
                        "MQTT connected",
                        "Waiting for messages...",
                    )));
                }

                if due(self.last_report, now, self.config.report_interval) {
                    self.last_report = Some(now);
                    tracing::debug!(
                        connected = true,
                        topic = %self.config.inbound_topic,
                        since_last_message_secs = self.last_message.map(|t| (now - t).as_secs()),
                        "Status channel report"
                    );
                }
            },
        }

        actions
    }

    /// Process an event from the channel driver.
    pub fn handle_event(&mut self, event: ChannelEvent, now: I) -> Vec<BridgeAction> {
        match event {
            ChannelEvent::Connected => {
                tracing::info!(
                    client_id = %self.config.client_id,
                    topic = %self.config.inbound_topic,
                    "Status channel connected"
                );
                self.status = ConnectionStatus::Connected;
                self.last_subscribe = Some(now);
                self.last_report = None;
                self.waiting_shown = false;
                self.disconnected_shown = false;

                vec![
                    self.subscribe(),
                    BridgeAction::Publish {
                        topic: self.config.status_topic.clone(),
                        payload: PRESENCE_MESSAGE.to_string(),
                    },
                ]
            },
            ChannelEvent::Disconnected { reason } => {
                if self.status != ConnectionStatus::Disconnected {
                    tracing::warn!(%reason, "Status channel connection failed");
                }
                self.status = ConnectionStatus::Disconnected;
                self.disconnected_shown = false;
                Vec::new()
            },
            ChannelEvent::Message { topic, payload } => self.handle_message(&topic, &payload, now),
        }
    }

    /// Announce a floor request to the companion device.
    ///
    /// While disconnected this issues one immediate connection attempt ahead
    /// of the publish. The driver drops the publish if that attempt fails.
    pub fn announce_floor_request(&mut self, notice: FloorNotice, now: I) -> Vec<BridgeAction> {
        let publish = BridgeAction::Publish {
            topic: self.config.floor_request_topic.clone(),
            payload: notice.to_string(),
        };

        if self.is_connected() {
            vec![publish]
        } else {
            tracing::info!("Status channel down, reconnecting before floor notice");
            vec![self.begin_connect(now), publish]
        }
    }

    fn handle_message(&mut self, topic: &str, payload: &[u8], now: I) -> Vec<BridgeAction> {
        self.last_message = Some(now);
        self.waiting_shown = false;

        let token = StatusToken::from_payload(payload);
        tracing::debug!(%topic, payload = %token, "Status message received");

        if topic != self.config.inbound_topic {
            tracing::warn!(
                %topic,
                expected = %self.config.inbound_topic,
                "Status message topic mismatch"
            );
            return Vec::new();
        }

        let received = DisplayLines::single(format!("Received: {token}"));
        let mut actions = vec![BridgeAction::Display(received)];
        if let Some(position) = PositionEvent::from_token(&token) {
            actions.push(BridgeAction::Position(position));
        }
        match token_screen(&token) {
            Some(headline) => {
                tracing::info!(%token, screen = headline, "Status token applied");
                actions.push(BridgeAction::Display(DisplayLines::new(headline, FROM_COMPANION)));
            },
            None => tracing::warn!(%token, "Unknown status token"),
        }

        actions
    }

    fn begin_connect(&mut self, now: I) -> BridgeAction {
        self.status = ConnectionStatus::Connecting;
        self.last_attempt = Some(now);
        BridgeAction::Connect
    }

    fn subscribe(&self) -> BridgeAction {
        BridgeAction::Subscribe { topic: self.config.inbound_topic.clone() }
    }
}

/// Second display line of every token screen.
const FROM_COMPANION: &str = "(from Pi via MQTT)";

fn token_screen(token: &StatusToken) -> Option<&'static str> {
    match token {
        StatusToken::EnteredZone => Some("Robot at RWZ"),
        StatusToken::EnteredElevator => Some("Robot in elevator"),
        StatusToken::Exited => Some("Robot exited elevator"),
        StatusToken::Positioning => Some("Robot positioning"),
        StatusToken::Unknown(_) => None,
    }
}

fn due<I>(last: Option<I>, now: I, interval: Duration) -> bool
where
    I: Copy + Sub<Output = Duration>,
{
    last.is_none_or(|at| now - at >= interval)
}
