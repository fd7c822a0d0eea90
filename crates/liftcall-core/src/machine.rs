//! Request state machine.
//!
//! Owns the robot state, the pending floor request and the sequence counter.
//! Every mutation goes through [`RequestMachine::apply`], which validates the
//! source state and reports the transitions it performed.
//!
//! # State Machine
//!
//! ```text
//!          floor selected           tick picks it up
//! ┌──────┐ ──────────────> ┌─────────────────┐ ─────────> ┌─────────┐
//! │ Idle │                 │ RequestAccepted │            │ Calling │
//! └──────┘ <─┐             └─────────────────┘            └─────────┘
//!     ^      │                                             │       │
//!     │      │ (immediate)  ┌───────────┐      matching ACK│       │retries
//!     │      └──────────────│ Confirmed │<─────────────────┘       │exhausted
//!     │                     └───────────┘                          ↓
//!     │         (immediate)           ┌────────────────────┐
//!     └───────────────────────────────│ CommunicationError │
//!                                     └────────────────────┘
//!
//!   any state ── entered1 ──> WaitingAtZone
//!   any state ── entered2 ──> InElevator
//!   any state ── exited ────> Exited
//! ```
//!
//! `Confirmed` and `CommunicationError` are transient: applying the outcome
//! records both hops and leaves the machine `Idle`. A position that preempts
//! `RequestAccepted` or `Calling` discards the floor request. The position states are
//! sticky and only leave on another position event, so floor selection stays
//! blocked until the companion device reports a new position.

use std::fmt;

use liftcall_proto::{FloorNotice, SequenceNumber, StatusToken};

use crate::error::{CallFailure, MachineError};

/// Lowest valid floor. Floor 0 means "unset".
pub const MIN_FLOOR: u8 = 1;

/// Robot state as seen by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RobotState {
    /// Ready for a floor selection
    #[default]
    Idle,
    /// Target floor stored, waiting for the next tick to start calling
    RequestAccepted,
    /// Retry protocol running
    Calling,
    /// Panel acknowledged the call
    Confirmed,
    /// Companion reported the robot in the waiting zone
    WaitingAtZone,
    /// Companion reported the robot inside the car
    InElevator,
    /// Companion reported the robot left the car
    Exited,
    /// Retry protocol gave up
    CommunicationError,
}

impl RobotState {
    /// Operator-visible status string.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Idle => "Ready for floor request",
            Self::RequestAccepted => "Request sent",
            Self::Calling => "Calling elevator",
            Self::Confirmed => "Elevator called",
            Self::CommunicationError => "Elevator call failed",
            Self::InElevator => "Robot is in the elevator",
            Self::WaitingAtZone => "Robot waiting for elevator",
            Self::Exited => "Robot exited elevator",
        }
    }

    /// True if a new floor selection may be accepted.
    #[must_use]
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Floors selected by the operator. 0 means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloorRequest {
    /// Floor the robot is on
    pub current_floor: u8,
    /// Floor the robot wants to reach
    pub target_floor: u8,
}

impl FloorRequest {
    /// True once a target floor has been stored.
    #[must_use]
    pub fn has_target(&self) -> bool {
        self.target_floor >= MIN_FLOOR
    }
}

/// Position reported by the companion device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionEvent {
    /// `entered1`
    EnteredZone,
    /// `entered2`
    EnteredElevator,
    /// `exited`
    Exited,
}

impl PositionEvent {
    /// Map a status token to a position. `positioning` and unknown tokens
    /// have no state effect.
    #[must_use]
    pub fn from_token(token: &StatusToken) -> Option<Self> {
        match token {
            StatusToken::EnteredZone => Some(Self::EnteredZone),
            StatusToken::EnteredElevator => Some(Self::EnteredElevator),
            StatusToken::Exited => Some(Self::Exited),
            StatusToken::Positioning | StatusToken::Unknown(_) => None,
        }
    }

    /// State this position forces.
    #[must_use]
    pub fn target_state(self) -> RobotState {
        match self {
            Self::EnteredZone => RobotState::WaitingAtZone,
            Self::EnteredElevator => RobotState::InElevator,
            Self::Exited => RobotState::Exited,
        }
    }
}

/// Input to [`RequestMachine::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineEvent {
    /// Operator set the current floor
    CurrentFloorSelected(u8),
    /// Operator set the target floor
    TargetFloorSelected(u8),
    /// Coordination loop picked up the pending request
    CallStarted,
    /// Panel acknowledged the outstanding sequence
    CallConfirmed,
    /// Retry protocol ended without acknowledgment
    CallFailed(CallFailure),
    /// Companion device reported a position
    Position(PositionEvent),
}

impl MachineEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::CurrentFloorSelected(_) => "select current floor",
            Self::TargetFloorSelected(_) => "select target floor",
            Self::CallStarted => "start call",
            Self::CallConfirmed => "confirm call",
            Self::CallFailed(_) => "fail call",
            Self::Position(_) => "apply position",
        }
    }
}

/// One state change performed by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before
    pub from: RobotState,
    /// State after
    pub to: RobotState,
}

/// Everything the retry protocol needs for one request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTicket {
    /// Sequence assigned to this cycle
    pub sequence: SequenceNumber,
    /// Floors captured when the cycle started
    pub request: FloorRequest,
}

impl CallTicket {
    /// Floor-request notice for the companion device.
    #[must_use]
    pub fn notice(&self, uptime_secs: u32) -> FloorNotice {
        FloorNotice {
            current_floor: self.request.current_floor,
            target_floor: self.request.target_floor,
            uptime_secs,
        }
    }
}

/// Robot state, floor request and sequence counter.
///
/// # Invariants
///
/// - Floor selections are only accepted while `Idle`.
/// - The sequence advances exactly once per request cycle (on
///   [`MachineEvent::CallStarted`]), never per attempt.
/// - Leaving a call cycle (confirmed, failed or preempted by a position)
///   clears the floor request.
#[derive(Debug, Clone, Default)]
pub struct RequestMachine {
    state: RobotState,
    request: FloorRequest,
    sequence: SequenceNumber,
}

impl RequestMachine {
    /// Fresh machine: `Idle`, no floors, sequence 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RobotState {
        self.state
    }

    /// Stored floors.
    #[must_use]
    pub fn floor_request(&self) -> FloorRequest {
        self.request
    }

    /// Sequence of the most recent (or current) cycle.
    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    /// True if the coordination loop should start the retry protocol.
    #[must_use]
    pub fn has_pending_call(&self) -> bool {
        self.state == RobotState::RequestAccepted && self.request.has_target()
    }

    /// Apply an event.
    ///
    /// Returns the transitions performed, in order. Selecting the current
    /// floor stores it without a transition, and a position event matching
    /// the current state is a no-op.
    ///
    /// # Errors
    ///
    /// - `MachineError::RequestInProgress` if a floor is selected while not
    ///   `Idle`
    /// - `MachineError::InvalidFloor` if a selected floor is 0
    /// - `MachineError::InvalidTransition` if a call event arrives in the
    ///   wrong state
    ///
    /// The machine is unchanged on error.
    pub fn apply(&mut self, event: MachineEvent) -> Result<Vec<Transition>, MachineError> {
        match (self.state, event) {
            (RobotState::Idle, MachineEvent::CurrentFloorSelected(floor)) => {
                self.request.current_floor = validate_floor(floor)?;
                Ok(Vec::new())
            },
            (RobotState::Idle, MachineEvent::TargetFloorSelected(floor)) => {
                self.request.target_floor = validate_floor(floor)?;
                Ok(vec![self.enter(RobotState::RequestAccepted)])
            },
            (
                state,
                MachineEvent::CurrentFloorSelected(_) | MachineEvent::TargetFloorSelected(_),
            ) => Err(MachineError::RequestInProgress { state }),
            (RobotState::RequestAccepted, MachineEvent::CallStarted)
                if self.request.has_target() =>
            {
                self.sequence = self.sequence.next();
                Ok(vec![self.enter(RobotState::Calling)])
            },
            (RobotState::Calling, MachineEvent::CallConfirmed) => {
                let confirmed = self.enter(RobotState::Confirmed);
                Ok(vec![confirmed, self.reset()])
            },
            (RobotState::Calling, MachineEvent::CallFailed(_)) => {
                let failed = self.enter(RobotState::CommunicationError);
                Ok(vec![failed, self.reset()])
            },
            (state, MachineEvent::Position(position)) => {
                let to = position.target_state();
                if state == to {
                    return Ok(Vec::new());
                }
                // A request that never completed its call is abandoned
                if matches!(state, RobotState::RequestAccepted | RobotState::Calling) {
                    self.request = FloorRequest::default();
                }
                Ok(vec![self.enter(to)])
            },
            (state, event) => Err(MachineError::InvalidTransition { state, event: event.name() }),
        }
    }

    /// Store the current floor. Only valid while `Idle`.
    pub fn select_current_floor(&mut self, floor: u8) -> Result<(), MachineError> {
        self.apply(MachineEvent::CurrentFloorSelected(floor)).map(|_| ())
    }

    /// Store the target floor and accept the request. Only valid while
    /// `Idle`.
    pub fn select_target_floor(&mut self, floor: u8) -> Result<Transition, MachineError> {
        let transitions = self.apply(MachineEvent::TargetFloorSelected(floor))?;
        debug_assert_eq!(transitions.len(), 1);
        Ok(transitions
            .first()
            .copied()
            .unwrap_or(Transition { from: RobotState::Idle, to: self.state }))
    }

    /// Start a request cycle: `RequestAccepted` to `Calling`, advancing the
    /// sequence.
    pub fn begin_call(&mut self) -> Result<CallTicket, MachineError> {
        self.apply(MachineEvent::CallStarted)?;
        Ok(CallTicket { sequence: self.sequence, request: self.request })
    }

    /// Apply a position reported by the companion device.
    pub fn apply_position(&mut self, position: PositionEvent) -> Option<Transition> {
        // Position events are accepted from every state
        self.apply(MachineEvent::Position(position)).ok().and_then(|t| t.first().copied())
    }

    fn enter(&mut self, to: RobotState) -> Transition {
        let from = self.state;
        self.state = to;
        Transition { from, to }
    }

    fn reset(&mut self) -> Transition {
        self.request = FloorRequest::default();
        self.enter(RobotState::Idle)
    }
}

fn validate_floor(floor: u8) -> Result<u8, MachineError> {
    if floor < MIN_FLOOR {
        return Err(MachineError::InvalidFloor { floor: u32::from(floor) });
    }
    Ok(floor)
}
