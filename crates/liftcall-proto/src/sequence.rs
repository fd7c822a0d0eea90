//! Request sequence numbers.

use std::fmt;

/// 16-bit request identifier.
///
/// Incremented exactly once per request cycle and wraps on overflow. An ACK
/// is bound to the request carrying the same value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SequenceNumber(u16);

impl SequenceNumber {
    /// Sequence number at boot.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Raw value.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// The following sequence number, wrapping at `u16::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl From<u16> for SequenceNumber {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
