//! Wicket gateway core logic
//!
//! Pure state machine logic for the Wicket login gateway, completely
//! decoupled from I/O. This enables deterministic testing and reuse across
//! production drivers.
//!
//! # Architecture
//!
//! The gateway is cooperatively scheduled: the host invokes
//! [`session::Session::step`] once per tick, and each step performs at most
//! one non-blocking send or receive attempt before returning. Nothing here
//! blocks, with the single exception of the bounded-retry console transmit
//! path, which itself refuses to sleep in execution contexts that cannot
//! block.
//!
//! All external effects come through two traits supplied by the caller:
//! [`transport::DatagramTransport`] (a non-blocking connectionless socket
//! with a distinguishable would-block sentinel) and [`env::Delay`] (the
//! ability, or explicit inability, to sleep between retries). Production
//! drivers and deterministic test doubles implement the same traits, so the
//! protocol logic is tested without mocking sockets or clocks.
//!
//! Failures never escape [`session::Session::step`]: every fatal condition
//! self-heals by resetting the session to its start state, observable only
//! through the enabled/active queries.
//!
//! # Components
//!
//! - [`session`]: session state machine (login dialogue, relay, supervision)
//! - [`buffer`]: fixed-capacity relay ring buffer and credential line parser
//! - [`link`]: non-blocking I/O adapter with bounded-retry semantics
//! - [`transport`]: transport abstraction (datagram socket seam)
//! - [`mod@env`]: environment abstraction (delay capability)
//! - [`error`]: transport error types

pub mod buffer;
pub mod env;
pub mod error;
pub mod link;
pub mod session;
pub mod transport;

pub use buffer::{CredentialScan, RelayBuffer};
pub use env::Delay;
pub use error::TransportError;
pub use link::{Link, RecvStatus, RetryPolicy, SendStatus};
pub use session::{LoginPhase, Session, SessionConfig, SessionState};
pub use transport::DatagramTransport;
