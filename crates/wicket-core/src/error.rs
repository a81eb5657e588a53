//! Transport error types.

use thiserror::Error;

/// Errors surfaced by a [`crate::transport::DatagramTransport`].
///
/// `WouldBlock` is the retryable sentinel: it means the operation could not
/// complete immediately and should be attempted again on a later tick. Every
/// other variant is fatal to the current session and forces a full reset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The operation could not complete immediately; retry on a later tick.
    #[error("operation would block")]
    WouldBlock,

    /// The transport is not open.
    #[error("transport is closed")]
    Closed,

    /// The transport failed; the session must reset.
    #[error("transport failure: {0}")]
    Failed(String),
}

impl TransportError {
    /// True for the retryable would-block sentinel.
    #[must_use]
    pub fn is_would_block(&self) -> bool {
        matches!(self, Self::WouldBlock)
    }
}
