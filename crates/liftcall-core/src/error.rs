//! Error types for the station core.
//!
//! `MachineError` covers rejected state-machine events (the console maps
//! these to HTTP status codes). `CallFailure` records why a request cycle
//! ended in `CommunicationError`. Neither is ever fatal to the process.

use thiserror::Error;

use crate::machine::RobotState;

/// Errors from [`crate::RequestMachine`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    /// Floor selection attempted while a request cycle is active
    #[error("request already in progress: robot is {state:?}")]
    RequestInProgress {
        /// State that blocked the selection
        state: RobotState,
    },

    /// Floor outside the valid range (0 means unset)
    #[error("invalid floor: {floor}")]
    InvalidFloor {
        /// Floor that was requested
        floor: u32,
    },

    /// Event not valid for the current state
    #[error("invalid state transition: cannot {event} from {state:?}")]
    InvalidTransition {
        /// Current state when error occurred
        state: RobotState,
        /// Event that was attempted
        event: &'static str,
    },
}

impl MachineError {
    /// Returns true if the event was rejected because the robot is busy.
    ///
    /// Busy rejections go away once the machine returns to `Idle`; invalid
    /// floors never do.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::RequestInProgress { .. } | Self::InvalidTransition { .. })
    }
}

/// Why a request cycle failed.
///
/// Both variants surface identically to the operator (`Elevator call
/// failed`); the distinction is kept for logs only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    /// Radio refused to transmit
    #[error("transmit failed on attempt {attempt}: {reason}")]
    TransmitFailed {
        /// 1-based attempt that failed
        attempt: u32,
        /// Radio error description
        reason: String,
    },

    /// No matching acknowledgment within the retry budget
    #[error("no acknowledgment after {attempts} attempts")]
    RetriesExhausted {
        /// Number of transmissions made
        attempts: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_rejections_are_conflicts() {
        assert!(MachineError::RequestInProgress { state: RobotState::Calling }.is_conflict());
        assert!(
            MachineError::InvalidTransition { state: RobotState::Idle, event: "confirm call" }
                .is_conflict()
        );
        assert!(!MachineError::InvalidFloor { floor: 0 }.is_conflict());
    }

    #[test]
    fn failure_display() {
        let err = CallFailure::RetriesExhausted { attempts: 6 };
        assert_eq!(err.to_string(), "no acknowledgment after 6 attempts");

        let err = CallFailure::TransmitFailed { attempt: 1, reason: "radio busy".to_string() };
        assert_eq!(err.to_string(), "transmit failed on attempt 1: radio busy");
    }
}
