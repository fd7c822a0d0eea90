//! Radio link adapter.
//!
//! [`RadioLink`] is the raw datagram radio. [`RadioAdapter`] layers the
//! frame codec and the bounded listen window on top of it. There is no retry
//! logic here; retries belong to the call protocol.

use std::{future::Future, time::Duration};

use liftcall_core::Environment;
use liftcall_proto::Frame;

/// Point-to-point datagram radio.
///
/// One datagram carries one frame. The link gives no delivery or ordering
/// guarantees.
pub trait RadioLink: Send {
    /// Radio error type.
    type Error: std::error::Error + Send + 'static;

    /// Send one datagram.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio refuses the transmission.
    fn transmit(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Wait up to `timeout` for one datagram.
    ///
    /// Returns `None` when the timeout elapses first.
    fn receive(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;
}

/// Result of one listen window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    /// A well-formed frame arrived
    Received(Frame),
    /// The window elapsed without a well-formed frame
    Timeout,
}

/// Frame-level view of a [`RadioLink`].
pub struct RadioAdapter<R, E>
where
    R: RadioLink,
    E: Environment,
{
    radio: R,
    env: E,
}

impl<R, E> RadioAdapter<R, E>
where
    R: RadioLink,
    E: Environment,
{
    /// Wrap a radio.
    pub fn new(radio: R, env: E) -> Self {
        Self { radio, env }
    }

    /// Underlying radio.
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Underlying radio, mutably.
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Encode and send a frame.
    pub async fn transmit(&mut self, frame: &Frame) -> Result<(), R::Error> {
        self.radio.transmit(&frame.to_bytes()).await
    }

    /// Listen for up to `window`.
    ///
    /// Returns the first well-formed frame. Malformed datagrams are dropped
    /// and listening continues for the rest of the same window. Never waits
    /// past the window.
    pub async fn listen(&mut self, window: Duration) -> ListenOutcome {
        let started = self.env.now();

        loop {
            let elapsed = self.env.now() - started;
            let Some(remaining) = window.checked_sub(elapsed).filter(|r| !r.is_zero()) else {
                return ListenOutcome::Timeout;
            };

            match self.radio.receive(remaining).await {
                Ok(Some(bytes)) => match Frame::decode(&bytes) {
                    Ok(frame) => {
                        tracing::debug!(?frame, "Frame received");
                        return ListenOutcome::Received(frame);
                    },
                    Err(e) => {
                        tracing::debug!(error = %e, "Ignoring malformed datagram");
                    },
                },
                Ok(None) => return ListenOutcome::Timeout,
                Err(e) => {
                    tracing::error!(error = %e, "Radio receive failed");
                    return ListenOutcome::Timeout;
                },
            }
        }
    }
}
