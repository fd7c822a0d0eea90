//! Status channel vocabulary.
//!
//! The companion device reports where the robot is relative to the elevator
//! by publishing short plain-text tokens. These literals are the protocol
//! contract with that device: changing one is a breaking change.

use std::fmt;

/// Inbound topic carrying [`StatusToken`]s (companion → robot).
pub const ROBOT_IN_TOPIC: &str = "robot/robot-in";

/// Outbound topic carrying the [`crate::FloorNotice`] (robot → companion).
pub const FLOOR_REQUEST_TOPIC: &str = "robot/floor-request";

/// Outbound topic for presence messages.
pub const STATUS_TOPIC: &str = "robot/status";

/// Parsed status token.
///
/// Matching is exact and case-sensitive. Anything else parses to
/// [`StatusToken::Unknown`] so callers can log it instead of silently
/// dropping it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatusToken {
    /// `entered1`: robot reached the waiting zone in front of the elevator
    EnteredZone,
    /// `entered2`: robot is inside the elevator car
    EnteredElevator,
    /// `exited`: robot left the elevator
    Exited,
    /// `positioning`: robot is manoeuvring (informational only)
    Positioning,
    /// Any other payload
    Unknown(String),
}

impl StatusToken {
    /// Parse a text payload.
    #[must_use]
    pub fn parse(payload: &str) -> Self {
        match payload {
            "entered1" => Self::EnteredZone,
            "entered2" => Self::EnteredElevator,
            "exited" => Self::Exited,
            "positioning" => Self::Positioning,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Parse a raw payload. Invalid UTF-8 is replaced, which never matches a
    /// known token.
    #[must_use]
    pub fn from_payload(payload: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(payload))
    }

    /// Wire literal for this token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::EnteredZone => "entered1",
            Self::EnteredElevator => "entered2",
            Self::Exited => "exited",
            Self::Positioning => "positioning",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for StatusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
