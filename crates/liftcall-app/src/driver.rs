//! Driver trait for abstracting station I/O.
//!
//! The [`Driver`] trait decouples the coordination loop from the console
//! server, the status channel client and the display. Production and
//! simulation each implement it, while the generic [`crate::Runtime`] handles
//! all orchestration.

use std::future::Future;

use liftcall_core::{ChannelEvent, DisplayLines, GatewayReply};

/// Abstracts console, status channel and display I/O.
///
/// # Implementations
///
/// - **Station**: TCP console, MQTT client, display log target
/// - **Simulation**: injected requests and status events, captured output
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Admit at most one console connection and return its request head.
    ///
    /// Returns `None` if nobody is waiting. Must not block past a short
    /// read deadline.
    fn next_request(&mut self) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;

    /// Answer the connection returned by the last
    /// [`next_request`](Driver::next_request) and close it.
    fn reply(&mut self, reply: &GatewayReply) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Next pending status channel event, without waiting.
    fn poll_status(&mut self) -> Option<ChannelEvent>;

    /// Attempt to establish the status channel session.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker cannot be reached in time.
    fn connect(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Subscribe to a topic. Repeated subscriptions are harmless.
    fn subscribe(&mut self, topic: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Publish a text message.
    fn publish(
        &mut self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Show two lines on the status display.
    fn show(&mut self, lines: &DisplayLines);
}
