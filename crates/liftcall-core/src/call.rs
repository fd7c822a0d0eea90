//! Elevator call retry protocol.
//!
//! One [`CallProtocol`] runs one request cycle: transmit the request frame,
//! listen for the panel's acknowledgment, and retry after a fixed delay until
//! the attempt budget is spent. It uses the step pattern: every method returns
//! the next [`CallStep`] for the driver to execute, and the driver reports the
//! result back. No I/O and no clock live here; timestamps are passed in.
//!
//! ```text
//!            start
//!              │
//!              ↓
//!  ┌──────> Transmit ── error ──────────────> Done(Failed)
//!  │           │ ok
//!  │           ↓
//!  │        Listen ──── matching ACK ───────> Done(Confirmed)
//!  │           │ timeout, echo or foreign frame
//!  │           ↓
//!  └─ budget ─ Wait ─── budget spent ───────> Done(Failed)
//!     left
//! ```
//!
//! The delay follows every failed attempt, including the last one, so the
//! worst case is `(listen_window + retry_delay) × max_attempts`.

use std::time::Duration;

use liftcall_proto::{Frame, FrameKind, SequenceNumber};

use crate::{error::CallFailure, machine::CallTicket};

/// Retries after the first transmission.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// How long to listen for an acknowledgment after each transmission.
pub const DEFAULT_LISTEN_WINDOW: Duration = Duration::from_millis(1000);

/// Pause between a failed attempt and the next transmission.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Retry protocol configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallConfig {
    /// Retries after the first attempt (total attempts = `max_retries + 1`)
    pub max_retries: u32,
    /// Listen window per attempt
    pub listen_window: Duration,
    /// Delay after each failed attempt
    pub retry_delay: Duration,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            listen_window: DEFAULT_LISTEN_WINDOW,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl CallConfig {
    /// Total transmissions allowed per cycle.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Longest time one cycle can block the coordination loop when every
    /// transmission succeeds.
    #[must_use]
    pub fn worst_case(&self) -> Duration {
        (self.listen_window + self.retry_delay) * self.max_attempts()
    }
}

/// Next thing the driver must do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStep {
    /// Send this frame, then report via [`CallProtocol::on_transmitted`]
    Transmit(Frame),
    /// Listen up to this long. Report frames via [`CallProtocol::on_frame`]
    /// and expiry via [`CallProtocol::on_listen_timeout`]
    Listen(Duration),
    /// Sleep this long, then call [`CallProtocol::on_wait_elapsed`]
    Wait(Duration),
    /// Cycle finished
    Done(CallOutcome),
}

/// How a request cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Panel acknowledged the request
    Confirmed {
        /// 1-based attempt that was acknowledged
        attempt: u32,
    },
    /// Cycle gave up
    Failed(CallFailure),
}

/// Classification of a frame received while listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVerdict {
    /// `ack = 1` with the outstanding sequence
    Acknowledged,
    /// `ack = 0`: a request, typically our own transmission echoed back
    Echo,
    /// Acknowledgment for another sequence, or an unknown `ack` byte
    Foreign,
}

impl FrameVerdict {
    /// Classify `frame` against the outstanding sequence.
    #[must_use]
    pub fn classify(frame: &Frame, outstanding: SequenceNumber) -> Self {
        if frame.acknowledges(outstanding) {
            Self::Acknowledged
        } else if frame.kind() == FrameKind::Request {
            Self::Echo
        } else {
            Self::Foreign
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Transmitting,
    Listening,
    Waiting,
    Finished,
}

/// Retry protocol for one request cycle.
///
/// # Invariants
///
/// - At most `max_attempts` frames are transmitted, all with the ticket's
///   sequence.
/// - Only [`FrameVerdict::Acknowledged`] confirms. Echoes and foreign frames
///   end the attempt exactly like a timeout.
/// - Once `Done` is returned the protocol accepts no further input.
#[derive(Debug, Clone)]
pub struct CallProtocol {
    ticket: CallTicket,
    config: CallConfig,
    attempt: u32,
    phase: Phase,
}

impl CallProtocol {
    /// Protocol for `ticket`, not yet started.
    pub fn new(ticket: CallTicket, config: CallConfig) -> Self {
        Self { ticket, config, attempt: 0, phase: Phase::Ready }
    }

    /// Sequence carried by every transmission.
    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        self.ticket.sequence
    }

    /// 1-based attempt in progress (0 before start).
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// True once `Done` has been returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Begin the first attempt.
    pub fn start(&mut self, uptime_secs: u32) -> CallStep {
        debug_assert_eq!(self.phase, Phase::Ready, "call protocol started twice");
        self.transmit(uptime_secs)
    }

    /// Report the result of a `Transmit` step.
    ///
    /// A radio error ends the cycle immediately without listening.
    pub fn on_transmitted(&mut self, result: Result<(), String>) -> CallStep {
        debug_assert_eq!(self.phase, Phase::Transmitting);
        match result {
            Ok(()) => {
                self.phase = Phase::Listening;
                CallStep::Listen(self.config.listen_window)
            },
            Err(reason) => {
                tracing::error!(attempt = self.attempt, %reason, "Transmit failed");
                self.finish(CallOutcome::Failed(CallFailure::TransmitFailed {
                    attempt: self.attempt,
                    reason,
                }))
            },
        }
    }

    /// Report a frame received during a `Listen` step.
    pub fn on_frame(&mut self, frame: &Frame) -> CallStep {
        debug_assert_eq!(self.phase, Phase::Listening);
        match FrameVerdict::classify(frame, self.ticket.sequence) {
            FrameVerdict::Acknowledged => {
                tracing::info!(
                    attempt = self.attempt,
                    sequence = %self.ticket.sequence,
                    "ACK received"
                );
                self.finish(CallOutcome::Confirmed { attempt: self.attempt })
            },
            FrameVerdict::Echo => {
                tracing::debug!(
                    attempt = self.attempt,
                    sequence = %frame.sequence(),
                    "Received own request echo"
                );
                self.attempt_failed()
            },
            FrameVerdict::Foreign => {
                tracing::warn!(
                    attempt = self.attempt,
                    expected = %self.ticket.sequence,
                    ?frame,
                    "Ignoring non-matching frame"
                );
                self.attempt_failed()
            },
        }
    }

    /// Report that a `Listen` step expired without a frame.
    pub fn on_listen_timeout(&mut self) -> CallStep {
        debug_assert_eq!(self.phase, Phase::Listening);
        tracing::debug!(attempt = self.attempt, "No ACK within listen window");
        self.attempt_failed()
    }

    /// Report that a `Wait` step elapsed.
    pub fn on_wait_elapsed(&mut self, uptime_secs: u32) -> CallStep {
        debug_assert_eq!(self.phase, Phase::Waiting);
        if self.attempt >= self.config.max_attempts() {
            tracing::warn!(attempts = self.attempt, "Retries exhausted");
            return self.finish(CallOutcome::Failed(CallFailure::RetriesExhausted {
                attempts: self.attempt,
            }));
        }
        self.transmit(uptime_secs)
    }

    fn transmit(&mut self, uptime_secs: u32) -> CallStep {
        self.attempt += 1;
        self.phase = Phase::Transmitting;

        let request = self.ticket.request;
        tracing::debug!(
            attempt = self.attempt,
            max_attempts = self.config.max_attempts(),
            sequence = %self.ticket.sequence,
            "Sending elevator call"
        );
        CallStep::Transmit(Frame::request(
            self.ticket.sequence,
            request.current_floor,
            request.target_floor,
            uptime_secs,
        ))
    }

    fn attempt_failed(&mut self) -> CallStep {
        self.phase = Phase::Waiting;
        CallStep::Wait(self.config.retry_delay)
    }

    fn finish(&mut self, outcome: CallOutcome) -> CallStep {
        self.phase = Phase::Finished;
        CallStep::Done(outcome)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::machine::FloorRequest;

    fn ticket(sequence: u16) -> CallTicket {
        CallTicket {
            sequence: SequenceNumber::new(sequence),
            request: FloorRequest { current_floor: 3, target_floor: 7 },
        }
    }

    fn expect_transmit(step: CallStep) -> Frame {
        match step {
            CallStep::Transmit(frame) => frame,
            other => panic!("expected Transmit, got {other:?}"),
        }
    }

    #[test]
    fn first_step_transmits_request() {
        let mut call = CallProtocol::new(ticket(1), CallConfig::default());
        let frame = expect_transmit(call.start(12));

        assert_eq!(frame.kind(), FrameKind::Request);
        assert_eq!(frame.sequence(), SequenceNumber::new(1));
        assert_eq!(frame.current_floor(), 3);
        assert_eq!(frame.target_floor(), 7);
        assert_eq!(frame.timestamp(), 12);
        assert_eq!(call.attempt(), 1);
    }

    #[test]
    fn ack_on_first_attempt_confirms() {
        let mut call = CallProtocol::new(ticket(1), CallConfig::default());
        let frame = expect_transmit(call.start(0));

        assert_eq!(call.on_transmitted(Ok(())), CallStep::Listen(DEFAULT_LISTEN_WINDOW));
        assert_eq!(
            call.on_frame(&frame.to_ack(1)),
            CallStep::Done(CallOutcome::Confirmed { attempt: 1 })
        );
        assert!(call.is_finished());
    }

    #[test]
    fn transmit_error_fails_without_listening() {
        let mut call = CallProtocol::new(ticket(1), CallConfig::default());
        call.start(0);

        let step = call.on_transmitted(Err("radio busy".to_string()));
        assert_eq!(
            step,
            CallStep::Done(CallOutcome::Failed(CallFailure::TransmitFailed {
                attempt: 1,
                reason: "radio busy".to_string(),
            }))
        );
    }

    #[test]
    fn echo_ends_attempt() {
        let mut call = CallProtocol::new(ticket(4), CallConfig::default());
        let frame = expect_transmit(call.start(0));
        call.on_transmitted(Ok(()));

        assert_eq!(call.on_frame(&frame), CallStep::Wait(DEFAULT_RETRY_DELAY));
        assert!(!call.is_finished());
    }

    #[test]
    fn stale_ack_ends_attempt() {
        let mut call = CallProtocol::new(ticket(4), CallConfig::default());
        call.start(0);
        call.on_transmitted(Ok(()));

        let stale = Frame::new(FrameKind::Ack, SequenceNumber::new(3), 3, 7, 0);
        assert_eq!(call.on_frame(&stale), CallStep::Wait(DEFAULT_RETRY_DELAY));
    }

    #[test]
    fn exhausts_after_max_attempts() {
        let config = CallConfig::default();
        let mut call = CallProtocol::new(ticket(1), config);
        let mut step = call.start(0);
        let mut transmissions = 0;

        loop {
            step = match step {
                CallStep::Transmit(_) => {
                    transmissions += 1;
                    call.on_transmitted(Ok(()))
                },
                CallStep::Listen(_) => call.on_listen_timeout(),
                CallStep::Wait(_) => call.on_wait_elapsed(0),
                CallStep::Done(outcome) => {
                    assert_eq!(
                        outcome,
                        CallOutcome::Failed(CallFailure::RetriesExhausted { attempts: 6 })
                    );
                    break;
                },
            };
        }

        assert_eq!(transmissions, 6);
    }

    #[test]
    fn worst_case_duration() {
        assert_eq!(CallConfig::default().worst_case(), Duration::from_secs(18));
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let config = CallConfig { max_retries: 0, ..CallConfig::default() };
        let mut call = CallProtocol::new(ticket(1), config);
        call.start(0);
        call.on_transmitted(Ok(()));
        call.on_listen_timeout();

        assert_eq!(
            call.on_wait_elapsed(3),
            CallStep::Done(CallOutcome::Failed(CallFailure::RetriesExhausted { attempts: 1 }))
        );
    }

    #[test]
    fn classify_frames() {
        let seq = SequenceNumber::new(10);
        let request = Frame::request(seq, 1, 2, 0);

        assert_eq!(FrameVerdict::classify(&request, seq), FrameVerdict::Echo);
        assert_eq!(FrameVerdict::classify(&request.to_ack(0), seq), FrameVerdict::Acknowledged);
        assert_eq!(
            FrameVerdict::classify(&request.to_ack(0), SequenceNumber::new(11)),
            FrameVerdict::Foreign
        );
        let unknown = Frame::new(FrameKind::Unknown(2), seq, 1, 2, 0);
        assert_eq!(FrameVerdict::classify(&unknown, seq), FrameVerdict::Foreign);
    }

    /// Listen-window outcomes the strategy can pick for each attempt
    #[derive(Debug, Clone)]
    enum Reply {
        Silence,
        Echo,
        Foreign(u16),
        Matching,
    }

    fn arbitrary_reply() -> impl Strategy<Value = Reply> {
        prop_oneof![
            Just(Reply::Silence),
            Just(Reply::Echo),
            any::<u16>().prop_map(Reply::Foreign),
            Just(Reply::Matching)
        ]
    }

    proptest! {
        #[test]
        fn confirms_iff_matching_ack_within_budget(
            sequence in any::<u16>(),
            replies in prop::collection::vec(arbitrary_reply(), 6),
        ) {
            let outstanding = SequenceNumber::new(sequence);
            let mut call = CallProtocol::new(ticket(sequence), CallConfig::default());
            let mut step = call.start(0);
            let mut sent = Vec::new();

            let outcome = loop {
                step = match step {
                    CallStep::Transmit(frame) => {
                        sent.push(frame);
                        call.on_transmitted(Ok(()))
                    },
                    CallStep::Listen(_) => match &replies[sent.len() - 1] {
                        Reply::Silence => call.on_listen_timeout(),
                        Reply::Echo => call.on_frame(&Frame::request(outstanding, 3, 7, 0)),
                        Reply::Foreign(other) => {
                            let seq = SequenceNumber::new(*other);
                            let frame = if seq == outstanding {
                                Frame::new(FrameKind::Unknown(9), seq, 3, 7, 0)
                            } else {
                                Frame::new(FrameKind::Ack, seq, 3, 7, 0)
                            };
                            call.on_frame(&frame)
                        },
                        Reply::Matching => call.on_frame(&Frame::new(FrameKind::Ack, outstanding, 3, 7, 0)),
                    },
                    CallStep::Wait(_) => call.on_wait_elapsed(0),
                    CallStep::Done(outcome) => break outcome,
                };
            };

            // PROPERTY: every transmission carries the outstanding sequence
            prop_assert!(sent.iter().all(|f| f.sequence() == outstanding && f.kind() == FrameKind::Request));

            let first_match = replies.iter().position(|r| matches!(r, Reply::Matching));
            match first_match {
                Some(index) => {
                    // PROPERTY: a matching ACK short-circuits remaining attempts
                    prop_assert_eq!(outcome, CallOutcome::Confirmed { attempt: index as u32 + 1 });
                    prop_assert_eq!(sent.len(), index + 1);
                },
                None => {
                    prop_assert_eq!(outcome, CallOutcome::Failed(CallFailure::RetriesExhausted { attempts: 6 }));
                    prop_assert_eq!(sent.len(), 6);
                },
            }
        }
    }
}
