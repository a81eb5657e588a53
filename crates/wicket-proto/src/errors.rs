//! Error types for wire-level validation.

use thiserror::Error;

/// Errors raised while validating inbound datagrams.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The datagram carried no payload bytes.
    #[error("empty datagram")]
    EmptyDatagram,

    /// The datagram is larger than the relay admission bound.
    #[error("datagram of {len} bytes exceeds the {max}-byte bound")]
    DatagramTooLarge {
        /// Observed datagram length.
        len: usize,
        /// Largest admissible length.
        max: usize,
    },
}

/// Convenience alias for wire-level results.
pub type Result<T> = std::result::Result<T, ProtocolError>;
