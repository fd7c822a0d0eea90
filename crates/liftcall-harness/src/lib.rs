//! Deterministic simulation harness for the liftcall station.
//!
//! Simulated implementations of the [`liftcall_app::Driver`],
//! [`liftcall_app::RadioLink`] and [`liftcall_core::Environment`] traits, so
//! the production [`liftcall_app::Runtime`] can be driven tick by tick
//! against a virtual clock.
//!
//! # Components
//!
//! - [`SimEnv`]: virtual clock that only moves when something sleeps
//! - [`SimDriver`]: injects console requests and status messages, captures
//!   replies, publishes and display output
//! - [`ScriptedRadio`]: radio whose receptions are scripted or produced by a
//!   [`PanelSim`]
//! - [`PanelSim`]: model of the elevator-call panel
//! - [`TurmoilRadio`], [`TurmoilEnv`], [`serve_panel`]: UDP radio, clock and
//!   panel host inside a turmoil simulation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod panel;
pub mod scripted_radio;
pub mod sim_driver;
pub mod sim_env;
pub mod turmoil_radio;

pub use panel::PanelSim;
pub use scripted_radio::{Reception, ScriptedRadio, SimRadioError};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use turmoil_radio::{TurmoilEnv, TurmoilRadio, serve_panel};
