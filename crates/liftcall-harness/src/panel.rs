//! Elevator-call panel model.
//!
//! The panel answers every request frame it hears with an acknowledgment
//! carrying the same sequence. The model can be told to misbehave the ways
//! the real radio does: lose requests, hear the robot's own transmission
//! echoed back, or acknowledge the wrong sequence.

use liftcall_proto::{Frame, FrameKind, SequenceNumber};
use rand::Rng;
use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};

/// Simulated elevator-call panel.
#[derive(Debug, Clone)]
pub struct PanelSim {
    drop_first: usize,
    echo: bool,
    sequence_skew: u16,
    loss: Option<(ChaCha8Rng, f64)>,
    requests: Vec<Frame>,
    calls: Vec<(u8, u8)>,
    uptime_secs: u32,
}

impl Default for PanelSim {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelSim {
    /// Panel that acknowledges every request.
    pub fn new() -> Self {
        Self {
            drop_first: 0,
            echo: false,
            sequence_skew: 0,
            loss: None,
            requests: Vec::new(),
            calls: Vec::new(),
            uptime_secs: 0,
        }
    }

    /// Lose the first `n` requests.
    #[must_use]
    pub fn drop_first(mut self, n: usize) -> Self {
        self.drop_first = n;
        self
    }

    /// Deliver the robot's own request back to it ahead of any ACK.
    #[must_use]
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Acknowledge `sequence + skew` instead of the request's sequence.
    #[must_use]
    pub fn with_sequence_skew(mut self, skew: u16) -> Self {
        self.sequence_skew = skew;
        self
    }

    /// Lose each request with probability `rate`, seeded for replay.
    #[must_use]
    pub fn with_loss(mut self, seed: u64, rate: f64) -> Self {
        self.loss = Some((ChaCha8Rng::seed_from_u64(seed), rate));
        self
    }

    /// Every request frame heard, lost ones included.
    pub fn requests(&self) -> &[Frame] {
        &self.requests
    }

    /// `(current, target)` floors of every acknowledged request.
    pub fn calls(&self) -> &[(u8, u8)] {
        &self.calls
    }

    /// Handle one datagram and return the datagrams sent back, in order.
    ///
    /// Malformed datagrams and acknowledgments are ignored.
    pub fn handle_datagram(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let Ok(frame) = Frame::decode(bytes) else {
            return Vec::new();
        };
        if frame.kind() != FrameKind::Request {
            return Vec::new();
        }

        self.requests.push(frame);
        self.uptime_secs = self.uptime_secs.wrapping_add(1);

        let mut replies = Vec::new();
        if self.echo {
            replies.push(bytes.to_vec());
        }

        if self.requests.len() <= self.drop_first || self.lose() {
            tracing::debug!(sequence = %frame.sequence(), "Panel lost request");
            return replies;
        }

        let sequence = SequenceNumber::new(frame.sequence().value().wrapping_add(self.sequence_skew));
        let ack = Frame::new(
            FrameKind::Ack,
            sequence,
            frame.current_floor(),
            frame.target_floor(),
            self.uptime_secs,
        );
        self.calls.push((frame.current_floor(), frame.target_floor()));
        replies.push(ack.to_bytes().to_vec());
        replies
    }

    fn lose(&mut self) -> bool {
        match &mut self.loss {
            Some((rng, rate)) => rng.gen_bool(*rate),
            None => false,
        }
    }
}
