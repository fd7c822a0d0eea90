//! Application layer for the liftcall station
//!
//! Generic coordination loop over pluggable I/O, so the same orchestration
//! code runs in production and in deterministic simulation.
//!
//! # Components
//!
//! - [`Driver`]: console, status channel and display I/O
//! - [`RadioLink`]: raw datagram radio
//! - [`RadioAdapter`]: frame-level transmit and bounded listen
//! - [`Runtime`]: the tick loop tying the core state machines together

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod radio;
mod runtime;

pub use driver::Driver;
pub use radio::{ListenOutcome, RadioAdapter, RadioLink};
pub use runtime::{DEFAULT_TICK_INTERVAL, Runtime, RuntimeConfig};
