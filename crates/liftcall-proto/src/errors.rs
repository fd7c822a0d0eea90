//! Protocol-level errors.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding wire data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Radio datagram does not have the fixed frame length
    #[error("malformed frame: expected {expected} bytes, got {actual}")]
    MalformedFrame {
        /// Required frame length
        expected: usize,
        /// Length that was received
        actual: usize,
    },

    /// Floor-request notice payload could not be parsed
    #[error("invalid floor notice: {0}")]
    InvalidNotice(String),
}
