//! Transport abstraction for the connectionless gateway.
//!
//! Production uses a non-blocking UDP socket; tests use a scripted double.
//! Connection-oriented servers carry a listening handle and an active-client
//! handle side by side; on a connectionless transport both collapse into one
//! bound socket plus a latched peer address, which is what
//! [`DatagramTransport`] models.

use crate::error::TransportError;

/// A non-blocking, connectionless transport bound to one local port and
/// carrying at most one active peer.
///
/// Implementations must never block: an operation that cannot complete
/// immediately returns [`TransportError::WouldBlock`], which callers treat as
/// "try again on a later tick". Any other error is fatal to the session.
///
/// The single-client discipline lives here: the first datagram observed on
/// the wire latches the active peer, and traffic from any other sender is
/// ignored until the transport is closed and reopened.
pub trait DatagramTransport {
    /// Open the transport and bind it to the given local port.
    ///
    /// # Errors
    ///
    /// Returns a fatal error when the socket cannot be created or bound; the
    /// caller stays in its start state and retries on a later tick.
    fn open(&mut self, port: u16) -> Result<(), TransportError>;

    /// One non-blocking send to the active peer.
    ///
    /// Returns the number of bytes handed to the transport.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] when the transport cannot take the
    /// datagram right now (including when no peer has been latched yet); any
    /// other error is fatal.
    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// One non-blocking receive into `buf`.
    ///
    /// Returns the number of bytes copied. Datagrams longer than `buf` are
    /// truncated by the transport.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] when nothing is pending; any other
    /// error is fatal.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// True once a single remote peer has been observed and latched.
    ///
    /// Implementations may poll the wire here to latch a waiting peer; the
    /// datagram that latches the peer is a connection knock and is not
    /// delivered to `recv`.
    fn has_peer(&mut self) -> bool;

    /// Close the bound socket and forget the latched peer.
    ///
    /// The transport may be reopened with [`DatagramTransport::open`].
    fn close(&mut self);
}
