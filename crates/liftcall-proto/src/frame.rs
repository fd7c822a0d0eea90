//! Radio frame with zero-copy parsing.
//!
//! The [`Frame`] is a fixed 9-byte packed record exchanged with the
//! elevator-call panel. There is no magic, version or checksum: the radio's
//! own integrity checking is the only protection, so every 9-byte pattern is
//! a structurally valid frame. Multi-byte fields are little-endian, which is
//! the panel firmware's native packed layout.
//!
//! ```text
//! offset  0      1..3       3        4        5..9
//!        ┌─────┬──────────┬────────┬────────┬────────────┐
//!        │ ack │ sequence │ current│ target │ timestamp  │
//!        │ u8  │ u16 LE   │ u8     │ u8     │ u32 LE     │
//!        └─────┴──────────┴────────┴────────┴────────────┘
//! ```

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    SequenceNumber,
    errors::{ProtocolError, Result},
};

/// Meaning of the frame's `ack` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// `ack = 0`: an elevator call request (ours, an echo, or a stranger's)
    Request,
    /// `ack = 1`: the panel acknowledging a request
    Ack,
    /// Any other `ack` byte. Never treated as an acknowledgment.
    Unknown(u8),
}

impl FrameKind {
    /// Classify a raw `ack` byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Request,
            1 => Self::Ack,
            other => Self::Unknown(other),
        }
    }

    /// Raw `ack` byte for this kind.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Request => 0,
            Self::Ack => 1,
            Self::Unknown(other) => other,
        }
    }
}

/// Fixed 9-byte radio frame (little-endian, packed).
///
/// Fields are stored as raw byte arrays so the struct has alignment 1 and
/// can be cast from any 9-byte buffer.
///
/// # Invariants
///
/// - A received frame only means something if its sequence equals the
///   sequence of the request currently outstanding. See
///   [`Frame::acknowledges`].
/// - `ack = 0` frames are requests and are never acknowledgments, whatever
///   their sequence.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Frame {
    ack: u8,
    sequence: [u8; 2],
    current_floor: u8,
    target_floor: u8,
    timestamp: [u8; 4],
}

impl Frame {
    /// Size of the serialized frame (9 bytes)
    pub const SIZE: usize = 9;

    /// Build a frame from its logical fields.
    #[must_use]
    pub fn new(
        kind: FrameKind,
        sequence: SequenceNumber,
        current_floor: u8,
        target_floor: u8,
        timestamp: u32,
    ) -> Self {
        Self {
            ack: kind.to_byte(),
            sequence: sequence.value().to_le_bytes(),
            current_floor,
            target_floor,
            timestamp: timestamp.to_le_bytes(),
        }
    }

    /// Build an elevator call request (`ack = 0`).
    #[must_use]
    pub fn request(
        sequence: SequenceNumber,
        current_floor: u8,
        target_floor: u8,
        timestamp: u32,
    ) -> Self {
        Self::new(FrameKind::Request, sequence, current_floor, target_floor, timestamp)
    }

    /// Encode logical fields straight to wire bytes.
    #[must_use]
    pub fn encode(
        kind: FrameKind,
        sequence: SequenceNumber,
        current_floor: u8,
        target_floor: u8,
        timestamp: u32,
    ) -> [u8; Self::SIZE] {
        Self::new(kind, sequence, current_floor, target_floor, timestamp).to_bytes()
    }

    /// Parse a frame from a received datagram.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::MalformedFrame` if `bytes.len() != 9`. No other
    ///   check is made: any 9-byte pattern is accepted.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::read_from_bytes(bytes)
            .map_err(|_| ProtocolError::MalformedFrame { expected: Self::SIZE, actual: bytes.len() })
    }

    /// Serialize frame to bytes (zero-copy)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Request, acknowledgment, or something else.
    #[must_use]
    pub fn kind(&self) -> FrameKind {
        FrameKind::from_byte(self.ack)
    }

    /// Sequence number binding an ACK to its request.
    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        SequenceNumber::new(u16::from_le_bytes(self.sequence))
    }

    /// Floor the robot is on.
    #[must_use]
    pub fn current_floor(&self) -> u8 {
        self.current_floor
    }

    /// Floor the robot wants to go to.
    #[must_use]
    pub fn target_floor(&self) -> u8 {
        self.target_floor
    }

    /// Sender's seconds since boot at transmission time.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        u32::from_le_bytes(self.timestamp)
    }

    /// True if this is a valid acknowledgment of `outstanding`.
    ///
    /// Only `ack = 1` with an equal sequence counts.
    #[must_use]
    pub fn acknowledges(&self, outstanding: SequenceNumber) -> bool {
        self.kind() == FrameKind::Ack && self.sequence() == outstanding
    }

    /// Acknowledgment for this request, as the panel would send it.
    #[must_use]
    pub fn to_ack(&self, timestamp: u32) -> Self {
        Self::new(
            FrameKind::Ack,
            self.sequence(),
            self.current_floor,
            self.target_floor,
            timestamp,
        )
    }
}

// Manual Debug implementation (can't borrow fields of a packed struct)
impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("kind", &self.kind())
            .field("sequence", &self.sequence().value())
            .field("current_floor", &self.current_floor())
            .field("target_floor", &self.target_floor())
            .field("timestamp", &self.timestamp())
            .finish()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Frame {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn frame_size() {
        assert_eq!(std::mem::size_of::<Frame>(), Frame::SIZE);
        assert_eq!(Frame::SIZE, 9);
    }

    #[test]
    fn layout_matches_panel_firmware() {
        let bytes = Frame::encode(FrameKind::Ack, SequenceNumber::new(0x0102), 3, 7, 0x0A0B_0C0D);
        assert_eq!(bytes, [0x01, 0x02, 0x01, 0x03, 0x07, 0x0D, 0x0C, 0x0B, 0x0A]);
    }

    #[test]
    fn reject_short_buffer() {
        let result = Frame::decode(&[0u8; 8]);
        assert_eq!(result, Err(ProtocolError::MalformedFrame { expected: 9, actual: 8 }));
    }

    #[test]
    fn reject_long_buffer() {
        let result = Frame::decode(&[0u8; 10]);
        assert_eq!(result, Err(ProtocolError::MalformedFrame { expected: 9, actual: 10 }));
    }

    #[test]
    fn request_never_acknowledges() {
        let seq = SequenceNumber::new(42);
        let request = Frame::request(seq, 3, 7, 100);
        assert_eq!(request.kind(), FrameKind::Request);
        assert!(!request.acknowledges(seq));
        assert!(request.to_ack(101).acknowledges(seq));
    }

    #[test]
    fn unknown_ack_byte_is_foreign() {
        let mut bytes = Frame::request(SequenceNumber::new(9), 1, 2, 0).to_bytes();
        bytes[0] = 0x7F;
        let frame = Frame::decode(&bytes).expect("9 bytes always decode");
        assert_eq!(frame.kind(), FrameKind::Unknown(0x7F));
        assert!(!frame.acknowledges(SequenceNumber::new(9)));
    }

    proptest! {
        #[test]
        fn any_nine_bytes_decode(bytes in prop::array::uniform9(any::<u8>())) {
            let frame = Frame::decode(&bytes).expect("should parse");
            prop_assert_eq!(frame.to_bytes(), bytes);
        }

        #[test]
        fn ack_requires_matching_sequence(seq in any::<u16>(), other in any::<u16>()) {
            let ack = Frame::new(FrameKind::Ack, SequenceNumber::new(seq), 1, 2, 0);
            prop_assert_eq!(ack.acknowledges(SequenceNumber::new(other)), seq == other);
        }
    }
}
