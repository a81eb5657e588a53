//! Environment abstraction: effects supplied by the caller.
//!
//! The core never sleeps on its own authority. The one code path that may
//! wait, the bounded-retry console transmit, asks the host for permission
//! first, so a driver running in an interrupt-equivalent context can refuse
//! and get an immediate failure instead of a stall.

use std::time::Duration;

/// Bounded-delay capability for the retried console transmit path.
pub trait Delay {
    /// Whether the current execution context may sleep at all.
    ///
    /// When this returns false the retry loop is never entered and the
    /// transmit fails immediately, preserving real-time guarantees.
    fn can_block(&self) -> bool;

    /// Sleep for `duration`. Only invoked when [`Delay::can_block`] is true.
    fn sleep(&self, duration: Duration);
}
