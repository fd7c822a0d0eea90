//! Floor-request notice published to the companion device.

use std::{fmt, str::FromStr};

use crate::errors::ProtocolError;

/// `"<currentFloor>,<targetFloor>,<secondsSinceBoot>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorNotice {
    /// Floor the robot is on
    pub current_floor: u8,
    /// Floor the robot is going to
    pub target_floor: u8,
    /// Robot uptime when the call started
    pub uptime_secs: u32,
}

impl fmt::Display for FloorNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.current_floor, self.target_floor, self.uptime_secs)
    }
}

impl FromStr for FloorNotice {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidNotice(s.to_string());

        let mut parts = s.split(',');
        let (Some(current), Some(target), Some(uptime), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Self {
            current_floor: current.trim().parse().map_err(|_| invalid())?,
            target_floor: target.trim().parse().map_err(|_| invalid())?,
            uptime_secs: uptime.trim().parse().map_err(|_| invalid())?,
        })
    }
}
