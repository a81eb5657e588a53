//! Wire vocabulary for the Wicket login gateway.
//!
//! The gateway speaks a terminal-style dialogue over single datagrams: each
//! login phase sends a short control-code option sequence or a prompt string,
//! and the client answers with carriage-return terminated lines. There is no
//! structured framing beyond that, so this crate only provides the byte
//! vocabulary, line scanning, credential classification, and the admission
//! check applied to inbound datagrams before their bytes reach the relay
//! buffer.
//!
//! Everything here is pure: no I/O, no state. The state machine that strings
//! these pieces together lives in `wicket-core`.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod frame;
pub mod line;
pub mod options;
pub mod prompts;

pub use errors::{ProtocolError, Result};
pub use line::LineScan;
