//! Property-based tests for Frame encoding/decoding
//!
//! These tests verify the codec for ALL inputs rather than specific
//! examples: logical fields survive encoding, only the length is validated,
//! and the acknowledgment rule holds for every frame.

use liftcall_proto::{Frame, FrameKind, ProtocolError, SequenceNumber};
use proptest::prelude::*;

/// Strategy for generating arbitrary frame kinds
fn arbitrary_kind() -> impl Strategy<Value = FrameKind> {
    prop_oneof![
        Just(FrameKind::Request),
        Just(FrameKind::Ack),
        any::<u8>().prop_map(FrameKind::from_byte)
    ]
}

/// Strategy for generating arbitrary frames
fn arbitrary_frame() -> impl Strategy<Value = Frame> {
    (arbitrary_kind(), any::<u16>(), any::<u8>(), any::<u8>(), any::<u32>()).prop_map(
        |(kind, sequence, current, target, timestamp)| {
            Frame::new(kind, SequenceNumber::new(sequence), current, target, timestamp)
        },
    )
}

#[test]
fn prop_frame_fields_survive_encoding() {
    proptest!(|(kind in arbitrary_kind(), sequence in any::<u16>(), current in any::<u8>(), target in any::<u8>(), timestamp in any::<u32>())| {
        let bytes = Frame::encode(kind, SequenceNumber::new(sequence), current, target, timestamp);
        let decoded = Frame::decode(&bytes).expect("decode should succeed");

        prop_assert_eq!(decoded.kind(), kind);
        prop_assert_eq!(decoded.sequence(), SequenceNumber::new(sequence));
        prop_assert_eq!(decoded.current_floor(), current);
        prop_assert_eq!(decoded.target_floor(), target);
        prop_assert_eq!(decoded.timestamp(), timestamp);
    });
}

#[test]
fn prop_wrong_length_is_malformed() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..64))| {
        let result = Frame::decode(&bytes);

        // PROPERTY: length is the only structural check
        if bytes.len() == Frame::SIZE {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(
                result,
                Err(ProtocolError::MalformedFrame { expected: Frame::SIZE, actual: bytes.len() })
            );
        }
    });
}

#[test]
fn prop_requests_never_acknowledge() {
    proptest!(|(frame in arbitrary_frame(), outstanding in any::<u16>())| {
        let outstanding = SequenceNumber::new(outstanding);

        // PROPERTY: only ack=1 with the outstanding sequence is an ACK
        let expected = frame.kind() == FrameKind::Ack && frame.sequence() == outstanding;
        prop_assert_eq!(frame.acknowledges(outstanding), expected);
    });
}

#[test]
fn prop_panel_ack_matches_request() {
    proptest!(|(frame in arbitrary_frame(), timestamp in any::<u32>())| {
        let request = Frame::request(frame.sequence(), frame.current_floor(), frame.target_floor(), frame.timestamp());
        let ack = request.to_ack(timestamp);

        prop_assert!(ack.acknowledges(request.sequence()));
        prop_assert_eq!(ack.current_floor(), request.current_floor());
        prop_assert_eq!(ack.target_floor(), request.target_floor());
    });
}
