//! Minimal line-echo console.
//!
//! Stands in for the interactive console the gateway normally feeds, so the
//! binary can be exercised end to end with any UDP-capable terminal client:
//! characters are echoed as typed, and each completed line is answered.

use wicket_core::{DatagramTransport, Delay, Session};

/// Longest line kept before further input is discarded.
const MAX_LINE: usize = 256;

/// Echoes every completed line back to the client.
#[derive(Debug, Default)]
pub struct EchoConsole {
    line: Vec<u8>,
}

impl EchoConsole {
    /// Create an empty console.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain relayed bytes and answer completed lines.
    ///
    /// Only ever sees data once the session reports active; the synthetic
    /// line erase staged at login makes the first prompt come out clean.
    pub fn poll<T: DatagramTransport, D: Delay>(&mut self, session: &mut Session<T, D>) {
        while let Some(byte) = session.rx_char() {
            match byte {
                b'\r' => {
                    session.tx(b"\r\n");
                    if !self.line.is_empty() {
                        let mut reply = Vec::with_capacity(self.line.len() + 1);
                        reply.extend_from_slice(&self.line);
                        reply.push(b'\n');
                        session.tx_cooked(&reply);
                        self.line.clear();
                    }
                    session.tx(b"> ");
                }
                b'\n' => {}
                b'\x08' | b'\x7f' => {
                    if self.line.pop().is_some() {
                        // rub the character out on the client's screen
                        session.tx(b"\x08 \x08");
                    }
                }
                _ => {
                    if self.line.len() < MAX_LINE {
                        self.line.push(byte);
                        // the console phase negotiated server-side echo
                        session.tx(&[byte]);
                    }
                }
            }
        }
    }
}
