//! Deterministic test harness for the Wicket gateway.
//!
//! Scripted implementations of the transport and delay traits for
//! deterministic, reproducible testing of the session state machine: queued
//! inbound datagrams, recorded outbound sends, and programmable would-block
//! and failure injection. No real sockets, no real time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod script;

pub use script::{RecordingDelay, ScriptedTransport, SendScript};

use wicket_core::{Session, SessionConfig};

/// A session configuration sized for tests: tiny idle budget, short
/// credentials, reference retry limits.
#[must_use]
pub fn test_config() -> SessionConfig {
    SessionConfig {
        username: "guest".into(),
        password: "wicket".into(),
        banner: "test gateway\r\n".into(),
        idle_timeout: std::time::Duration::from_millis(500),
        cycle_time: std::time::Duration::from_millis(10),
        ..SessionConfig::default()
    }
}

/// Build a session over scripted doubles, returning the shared handles used
/// to drive and observe it.
#[must_use]
pub fn test_session(
    config: SessionConfig,
) -> (Session<ScriptedTransport, RecordingDelay>, ScriptedTransport, RecordingDelay) {
    let transport = ScriptedTransport::new();
    let delay = RecordingDelay::blocking();
    let session = Session::new(config, transport.clone(), delay.clone());
    (session, transport, delay)
}
