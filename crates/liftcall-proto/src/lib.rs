//! Wire types for the liftcall elevator-call protocol.
//!
//! Two channels carry protocol data:
//!
//! - The radio link to the elevator-call panel, which exchanges the fixed
//!   9-byte [`Frame`]. Requests and acknowledgments are bound together by a
//!   [`SequenceNumber`].
//! - The publish/subscribe status channel to the companion device, which
//!   carries plain-text [`StatusToken`]s inbound and a [`FloorNotice`]
//!   outbound.
//!
//! Nothing in this crate performs I/O.

#![deny(missing_docs)]

mod errors;
pub mod frame;
pub mod notice;
pub mod sequence;
pub mod status;

pub use errors::{ProtocolError, Result};
pub use frame::{Frame, FrameKind};
pub use notice::FloorNotice;
pub use sequence::SequenceNumber;
pub use status::{FLOOR_REQUEST_TOPIC, ROBOT_IN_TOPIC, STATUS_TOPIC, StatusToken};
