//! Admission validation for inbound datagrams.
//!
//! The transport is connectionless and the dialogue is plain terminal bytes,
//! so there is no header to parse. Validation only decides whether a received
//! datagram may be admitted to the relay buffer at all: it must carry at
//! least one byte and fit the admission bound. Anything else is a framing
//! failure and the session resets.

use crate::errors::{ProtocolError, Result};

/// Largest datagram admitted to the relay path.
///
/// Matches the relay buffer capacity; a datagram that could never fit is
/// rejected outright instead of being silently truncated.
pub const MAX_DATAGRAM_LEN: usize = 256;

/// Validate an inbound datagram before its bytes are admitted.
pub fn validate(datagram: &[u8]) -> Result<()> {
    if datagram.is_empty() {
        return Err(ProtocolError::EmptyDatagram);
    }
    if datagram.len() > MAX_DATAGRAM_LEN {
        return Err(ProtocolError::DatagramTooLarge { len: datagram.len(), max: MAX_DATAGRAM_LEN });
    }
    Ok(())
}
