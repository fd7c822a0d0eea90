//! Scripted radio on the virtual clock.
//!
//! Receptions come from two places: an explicit script, consumed first, and
//! "the air", which holds whatever an attached [`PanelSim`] sent back to the
//! most recent transmission. The air is cleared on every transmission, since
//! a half-duplex radio misses anything sent while it is not listening.
//! Waiting out a listen window advances the [`SimEnv`] clock.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use liftcall_app::RadioLink;
use liftcall_proto::Frame;

use crate::{PanelSim, SimEnv};

/// Error type for the scripted radio.
#[derive(Debug, Clone)]
pub struct SimRadioError(pub String);

impl std::fmt::Display for SimRadioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimRadioError: {}", self.0)
    }
}

impl std::error::Error for SimRadioError {}

/// One scripted outcome of a `receive` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reception {
    /// Nothing arrives; the whole timeout elapses
    Silence,
    /// A datagram arrives after `delay` (if within the timeout)
    Datagram {
        /// Time before arrival
        delay: Duration,
        /// Raw bytes
        bytes: Vec<u8>,
    },
}

impl Reception {
    /// A frame arriving immediately.
    pub fn frame(frame: Frame) -> Self {
        Self::bytes(frame.to_bytes().to_vec())
    }

    /// Raw bytes arriving immediately.
    pub fn bytes(bytes: Vec<u8>) -> Self {
        Self::Datagram { delay: Duration::ZERO, bytes }
    }
}

type TransmitHook = Box<dyn FnMut(&Frame) + Send>;

#[derive(Default)]
struct RadioState {
    script: VecDeque<Reception>,
    air: VecDeque<Vec<u8>>,
    panel: Option<PanelSim>,
    transmitted: Vec<Vec<u8>>,
    failing_transmits: VecDeque<String>,
    receive_calls: usize,
    hook: Option<TransmitHook>,
}

/// Radio whose receptions are scripted or produced by a panel model.
///
/// Clones share state, so a test can keep a handle after moving the radio
/// into the runtime.
#[derive(Clone)]
pub struct ScriptedRadio {
    env: SimEnv,
    state: Arc<Mutex<RadioState>>,
}

impl ScriptedRadio {
    /// Radio with an empty script (every listen is silent).
    pub fn new(env: SimEnv) -> Self {
        Self { env, state: Arc::new(Mutex::new(RadioState::default())) }
    }

    /// Radio answered by `panel`.
    pub fn with_panel(env: SimEnv, panel: PanelSim) -> Self {
        let radio = Self::new(env);
        radio.state().panel = Some(panel);
        radio
    }

    fn state(&self) -> MutexGuard<'_, RadioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a scripted reception.
    pub fn push(&self, reception: Reception) {
        self.state().script.push_back(reception);
    }

    /// Append several scripted receptions.
    pub fn extend(&self, receptions: impl IntoIterator<Item = Reception>) {
        self.state().script.extend(receptions);
    }

    /// Make the next transmission fail with `reason`.
    pub fn fail_next_transmit(&self, reason: &str) {
        self.state().failing_transmits.push_back(reason.to_string());
    }

    /// Run `hook` on every successfully transmitted frame.
    pub fn on_transmit(&self, hook: impl FnMut(&Frame) + Send + 'static) {
        self.state().hook = Some(Box::new(hook));
    }

    /// Every frame handed to the radio, failed transmissions included.
    pub fn transmitted(&self) -> Vec<Frame> {
        self.state().transmitted.iter().filter_map(|b| Frame::decode(b).ok()).collect()
    }

    /// Number of `receive` calls made.
    pub fn receive_calls(&self) -> usize {
        self.state().receive_calls
    }

    /// Snapshot of the attached panel.
    pub fn panel(&self) -> Option<PanelSim> {
        self.state().panel.clone()
    }
}

impl RadioLink for ScriptedRadio {
    type Error = SimRadioError;

    async fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.transmitted.push(bytes.to_vec());

        if let Some(reason) = state.failing_transmits.pop_front() {
            return Err(SimRadioError(reason));
        }

        state.air.clear();
        if let Some(panel) = state.panel.as_mut() {
            let replies = panel.handle_datagram(bytes);
            state.air.extend(replies);
        }

        if let Ok(frame) = Frame::decode(bytes) {
            if let Some(hook) = state.hook.as_mut() {
                hook(&frame);
            }
        }
        Ok(())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, Self::Error> {
        let reception = {
            let mut state = self.state();
            state.receive_calls += 1;
            match state.script.pop_front() {
                Some(reception) => reception,
                None => match state.air.pop_front() {
                    Some(bytes) => Reception::bytes(bytes),
                    None => Reception::Silence,
                },
            }
        };

        match reception {
            Reception::Datagram { delay, bytes } if delay < timeout => {
                self.env.advance(delay);
                Ok(Some(bytes))
            },
            Reception::Datagram { .. } | Reception::Silence => {
                self.env.advance(timeout);
                Ok(None)
            },
        }
    }
}
