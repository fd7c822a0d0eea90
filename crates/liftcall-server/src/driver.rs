//! Production driver: HTTP console, MQTT status channel, log display.

use liftcall_app::Driver;
use liftcall_core::{ChannelEvent, DisplayLines, GatewayReply};

use crate::{HttpConsole, MqttChannel, StationError};

/// Tracing target the status display is rendered to.
pub const DISPLAY_TARGET: &str = "display";

/// [`Driver`] backed by real sockets.
pub struct StationDriver {
    console: HttpConsole,
    channel: MqttChannel,
}

impl StationDriver {
    /// Combine a bound console with a started status channel.
    pub fn new(console: HttpConsole, channel: MqttChannel) -> Self {
        Self { console, channel }
    }

    /// Console transport.
    pub fn console(&self) -> &HttpConsole {
        &self.console
    }
}

impl Driver for StationDriver {
    type Error = StationError;

    async fn next_request(&mut self) -> Result<Option<String>, Self::Error> {
        self.console.accept_request().await
    }

    async fn reply(&mut self, reply: &GatewayReply) -> Result<(), Self::Error> {
        self.console.respond(reply).await
    }

    fn poll_status(&mut self) -> Option<ChannelEvent> {
        self.channel.poll()
    }

    async fn connect(&mut self) -> Result<(), Self::Error> {
        self.channel.connect().await
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        self.channel.subscribe(topic)
    }

    async fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Self::Error> {
        self.channel.publish(topic, payload)
    }

    fn show(&mut self, lines: &DisplayLines) {
        tracing::info!(target: DISPLAY_TARGET, line1 = %lines.line1, line2 = %lines.line2);
    }
}
