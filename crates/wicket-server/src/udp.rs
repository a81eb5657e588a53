//! Non-blocking UDP transport.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use tracing::{debug, warn};

use wicket_core::{DatagramTransport, TransportError};

/// Scratch size for the peer-latching receive.
const KNOCK_BUFFER: usize = 512;

/// [`DatagramTransport`] over a non-blocking `std::net::UdpSocket`.
///
/// Exactly one client: the first datagram observed on the wire latches the
/// active peer and is treated as a connection knock, its payload discarded.
/// Datagrams from any other sender are ignored until the transport is closed
/// and reopened.
#[derive(Debug, Default)]
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    peer: Option<SocketAddr>,
}

impl UdpTransport {
    /// Create an unbound transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One non-blocking attempt to latch a waiting peer; the knock datagram
    /// is discarded.
    fn try_latch(&mut self) {
        let Some(socket) = self.socket.as_ref() else {
            return;
        };
        let mut knock = [0u8; KNOCK_BUFFER];
        match socket.recv_from(&mut knock) {
            Ok((len, addr)) => {
                debug!(%addr, len, "client latched");
                self.peer = Some(addr);
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
            Err(err) => {
                // surfaced as fatal by the next send or receive
                warn!(%err, "error while waiting for a client");
            }
        }
    }
}

impl DatagramTransport for UdpTransport {
    fn open(&mut self, port: u16) -> Result<(), TransportError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port)).map_err(fatal)?;
        socket.set_nonblocking(true).map_err(fatal)?;
        self.socket = Some(socket);
        self.peer = None;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let socket = self.socket.as_ref().ok_or(TransportError::Closed)?;
        let Some(peer) = self.peer else {
            // nobody to talk to yet
            return Err(TransportError::WouldBlock);
        };
        match socket.send_to(data, peer) {
            Ok(len) => Ok(len),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Err(TransportError::WouldBlock),
            Err(err) => Err(fatal(err)),
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let socket = self.socket.as_ref().ok_or(TransportError::Closed)?;
        loop {
            match socket.recv_from(buf) {
                Ok((len, addr)) => match self.peer {
                    Some(peer) if peer == addr => return Ok(len),
                    Some(_) => {
                        // single client: traffic from other senders is dropped
                        debug!(%addr, "ignoring datagram from non-active sender");
                    }
                    None => {
                        self.peer = Some(addr);
                        return Ok(len);
                    }
                },
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    return Err(TransportError::WouldBlock);
                }
                Err(err) => return Err(fatal(err)),
            }
        }
    }

    fn has_peer(&mut self) -> bool {
        if self.peer.is_none() {
            self.try_latch();
        }
        self.peer.is_some()
    }

    fn close(&mut self) {
        self.socket = None;
        self.peer = None;
    }
}

fn fatal(err: io::Error) -> TransportError {
    TransportError::Failed(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::net::UdpSocket;

    use wicket_core::{DatagramTransport, TransportError};

    use super::UdpTransport;

    fn bound_pair() -> (UdpTransport, UdpSocket, u16) {
        // port 0 lets the OS pick a free port for the test
        let mut transport = UdpTransport::new();
        transport.open(0).expect("bind");
        let port = transport
            .socket
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .map(|a| a.port())
            .expect("local addr");
        let client = UdpSocket::bind("127.0.0.1:0").expect("client bind");
        client.connect(("127.0.0.1", port)).expect("connect");
        (transport, client, port)
    }

    #[test]
    fn recv_reports_would_block_when_idle() {
        let (mut transport, _client, _port) = bound_pair();
        let mut buf = [0u8; 64];
        assert_eq!(transport.recv(&mut buf), Err(TransportError::WouldBlock));
    }

    #[test]
    fn first_datagram_latches_the_peer_and_is_discarded() {
        let (mut transport, client, _port) = bound_pair();
        assert!(!transport.has_peer());

        client.send(b"\r\n").expect("knock");
        // datagram delivery is asynchronous; poll briefly
        let mut latched = false;
        for _ in 0..50 {
            if transport.has_peer() {
                latched = true;
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert!(latched);

        // the knock payload was consumed, not queued
        let mut buf = [0u8; 64];
        assert_eq!(transport.recv(&mut buf), Err(TransportError::WouldBlock));
    }

    #[test]
    fn send_without_a_peer_would_block() {
        let (mut transport, _client, _port) = bound_pair();
        assert_eq!(transport.send(b"hello"), Err(TransportError::WouldBlock));
    }

    #[test]
    fn closed_transport_refuses_io() {
        let mut transport = UdpTransport::new();
        let mut buf = [0u8; 8];
        assert_eq!(transport.recv(&mut buf), Err(TransportError::Closed));
        assert_eq!(transport.send(b"x"), Err(TransportError::Closed));
    }
}
