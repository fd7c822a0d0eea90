//! Core logic for the liftcall elevator-call station.
//!
//! Every component here is a pure state machine: it takes events and time as
//! input and returns steps or actions for a driver to execute. No I/O
//! happens in this crate, so the same logic runs against real sockets in
//! production and against a virtual clock in simulation.
//!
//! # Components
//!
//! - [`RequestMachine`]: robot state, floor request and sequence numbering
//! - [`CallProtocol`]: transmit/listen/retry protocol for one request cycle
//! - [`StatusBridge`]: companion-device status channel maintenance
//! - [`Gateway`]: operator console request handling
//! - [`Environment`]: time source abstraction

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bridge;
pub mod call;
pub mod display;
pub mod env;
pub mod error;
pub mod gateway;
pub mod machine;
mod page;

pub use bridge::{BridgeAction, BridgeConfig, ChannelEvent, ConnectionStatus, StatusBridge};
pub use call::{CallConfig, CallOutcome, CallProtocol, CallStep, FrameVerdict};
pub use display::DisplayLines;
pub use env::Environment;
pub use error::{CallFailure, MachineError};
pub use gateway::{Gateway, GatewayConfig, GatewayReply, Route, StatusSnapshot, extract_floor_number};
pub use machine::{
    CallTicket, FloorRequest, MachineEvent, PositionEvent, RequestMachine, RobotState, Transition,
};
