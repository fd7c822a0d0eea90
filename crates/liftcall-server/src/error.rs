//! Station error types.

use std::fmt;

/// Errors that can occur in the station.
///
/// Only startup can fail fatally. Once the coordination loop runs, these are
/// logged and folded into robot state.
#[derive(Debug)]
pub enum StationError {
    /// Configuration error (unparseable address, etc.).
    ///
    /// Fatal at startup. Fix configuration and restart.
    Config(String),

    /// Socket error on the console or radio.
    ///
    /// Fatal when binding; transient for a single connection or datagram.
    Transport(String),

    /// Status channel error (broker unreachable, client queue full, etc.).
    ///
    /// Never fatal. The bridge retries on its reconnect interval.
    Channel(String),
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Channel(msg) => write!(f, "status channel error: {msg}"),
        }
    }
}

impl std::error::Error for StationError {}

impl From<std::io::Error> for StationError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<rumqttc::ClientError> for StationError {
    fn from(err: rumqttc::ClientError) -> Self {
        Self::Channel(err.to_string())
    }
}
