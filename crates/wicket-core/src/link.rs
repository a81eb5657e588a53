//! Non-blocking I/O adapter with bounded-retry semantics.
//!
//! [`Link`] wraps a [`DatagramTransport`] and turns its raw results into the
//! three-way outcome the state machine works with: done, try again, failed.
//! It owns the would-block accounting for the dialogue send path and applies
//! framing validation before received bytes are admitted.
//!
//! The caller decides what "failed" means; the link never resets anything
//! itself.

use std::time::Duration;

use tracing::warn;

use crate::env::Delay;
use crate::error::TransportError;
use crate::transport::DatagramTransport;

/// Outcome of one non-blocking send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// The datagram was handed to the transport; the retry budget is reset.
    Sent,
    /// Would-block under budget; attempt the same send on a later tick.
    Again,
    /// Budget exhausted or fatal transport error; the session must reset.
    Failed,
}

/// Outcome of one non-blocking receive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvStatus {
    /// Validated bytes were received.
    Data(usize),
    /// Nothing pending this tick.
    Idle,
    /// Fatal transport error or framing rejection; the session must reset.
    Failed,
}

/// Bounded-retry policy for the latency-sensitive console transmit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries attempted after the initial send.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 25, backoff: Duration::from_millis(5) }
    }
}

/// A transport wrapped with would-block accounting and receive validation.
#[derive(Debug)]
pub struct Link<T> {
    transport: T,
    tx_retries: u32,
    max_tx_retries: u32,
}

impl<T: DatagramTransport> Link<T> {
    /// Wrap `transport`, budgeting `max_tx_retries` consecutive would-block
    /// results on the dialogue send path.
    pub fn new(transport: T, max_tx_retries: u32) -> Self {
        Self { transport, tx_retries: 0, max_tx_retries }
    }

    /// Open the transport on the given local port.
    ///
    /// # Errors
    ///
    /// Propagates the transport's bind failure.
    pub fn open(&mut self, port: u16) -> Result<(), TransportError> {
        self.tx_retries = 0;
        self.transport.open(port)
    }

    /// Close the transport and clear the retry accounting.
    pub fn close(&mut self) {
        self.tx_retries = 0;
        self.transport.close();
    }

    /// True once the transport has latched its single active peer.
    pub fn has_peer(&mut self) -> bool {
        self.transport.has_peer()
    }

    /// One non-blocking send attempt.
    ///
    /// Success clears the retry counter. Would-block consumes one unit of
    /// budget and reports [`SendStatus::Again`] while budget remains; budget
    /// exhaustion or any other failure reports [`SendStatus::Failed`].
    pub fn send(&mut self, data: &[u8]) -> SendStatus {
        match self.transport.send(data) {
            Ok(_) => {
                self.tx_retries = 0;
                SendStatus::Sent
            }
            Err(TransportError::WouldBlock) => {
                self.tx_retries += 1;
                if self.tx_retries <= self.max_tx_retries {
                    SendStatus::Again
                } else {
                    warn!(retries = self.tx_retries, "send retry budget exhausted");
                    SendStatus::Failed
                }
            }
            Err(err) => {
                warn!(%err, "fatal send error");
                SendStatus::Failed
            }
        }
    }

    /// One non-blocking receive attempt into `buf`.
    ///
    /// Received bytes are admitted only after framing validation. A
    /// zero-length result carries nothing to admit and counts as idle, like
    /// would-block; any other rejected datagram is fatal.
    pub fn recv(&mut self, buf: &mut [u8]) -> RecvStatus {
        match self.transport.recv(buf) {
            Ok(len) => match wicket_proto::frame::validate(&buf[..len]) {
                Ok(()) => RecvStatus::Data(len),
                Err(wicket_proto::ProtocolError::EmptyDatagram) => RecvStatus::Idle,
                Err(err) => {
                    warn!(%err, "rejecting inbound datagram");
                    RecvStatus::Failed
                }
            },
            Err(TransportError::WouldBlock) => RecvStatus::Idle,
            Err(err) => {
                warn!(%err, "fatal receive error");
                RecvStatus::Failed
            }
        }
    }

    /// Send with bounded retries and a fixed backoff between attempts.
    ///
    /// Used for latency-sensitive bytes destined for the console. Refuses to
    /// run at all when the execution context cannot block, returning failure
    /// immediately instead of sleeping.
    pub fn send_with_retries<D: Delay>(&mut self, data: &[u8], delay: &D, policy: RetryPolicy) -> bool {
        if !delay.can_block() {
            return false;
        }
        for attempt in 0..=policy.max_attempts {
            match self.transport.send(data) {
                Ok(_) => return true,
                Err(TransportError::WouldBlock) => {
                    if attempt < policy.max_attempts {
                        delay.sleep(policy.backoff);
                    }
                }
                Err(err) => {
                    warn!(%err, "console transmit failed");
                    return false;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::time::Duration;

    use super::{Link, RecvStatus, RetryPolicy, SendStatus};
    use crate::env::Delay;
    use crate::error::TransportError;
    use crate::transport::DatagramTransport;

    #[derive(Default)]
    struct FakeTransport {
        send_results: VecDeque<Result<usize, TransportError>>,
        recv_results: VecDeque<Result<Vec<u8>, TransportError>>,
        sends_attempted: u32,
    }

    impl DatagramTransport for FakeTransport {
        fn open(&mut self, _port: u16) -> Result<(), TransportError> {
            Ok(())
        }

        fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
            self.sends_attempted += 1;
            self.send_results.pop_front().unwrap_or(Ok(data.len()))
        }

        fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            match self.recv_results.pop_front() {
                Some(Ok(datagram)) => {
                    let len = datagram.len().min(buf.len());
                    buf[..len].copy_from_slice(&datagram[..len]);
                    Ok(len)
                }
                Some(Err(err)) => Err(err),
                None => Err(TransportError::WouldBlock),
            }
        }

        fn has_peer(&mut self) -> bool {
            true
        }

        fn close(&mut self) {}
    }

    struct CountingDelay {
        can_block: bool,
        sleeps: Cell<u32>,
    }

    impl Delay for CountingDelay {
        fn can_block(&self) -> bool {
            self.can_block
        }

        fn sleep(&self, _duration: Duration) {
            self.sleeps.set(self.sleeps.get() + 1);
        }
    }

    #[test]
    fn would_block_consumes_budget_then_fails() {
        let mut transport = FakeTransport::default();
        for _ in 0..4 {
            transport.send_results.push_back(Err(TransportError::WouldBlock));
        }
        let mut link = Link::new(transport, 3);

        for _ in 0..3 {
            assert_eq!(link.send(b"x"), SendStatus::Again);
        }
        assert_eq!(link.send(b"x"), SendStatus::Failed);
    }

    #[test]
    fn success_resets_the_budget() {
        let mut transport = FakeTransport::default();
        transport.send_results.push_back(Err(TransportError::WouldBlock));
        transport.send_results.push_back(Ok(1));
        transport.send_results.push_back(Err(TransportError::WouldBlock));
        let mut link = Link::new(transport, 1);

        assert_eq!(link.send(b"x"), SendStatus::Again);
        assert_eq!(link.send(b"x"), SendStatus::Sent);
        // counter restarted, so this would-block fits the budget again
        assert_eq!(link.send(b"x"), SendStatus::Again);
    }

    #[test]
    fn non_would_block_errors_are_fatal_immediately() {
        let mut transport = FakeTransport::default();
        transport.send_results.push_back(Err(TransportError::Failed("nope".into())));
        let mut link = Link::new(transport, 25);
        assert_eq!(link.send(b"x"), SendStatus::Failed);
    }

    #[test]
    fn recv_treats_empty_datagrams_as_idle() {
        let mut transport = FakeTransport::default();
        transport.recv_results.push_back(Ok(Vec::new()));
        transport.recv_results.push_back(Ok(b"data".to_vec()));
        let mut link = Link::new(transport, 25);

        let mut buf = [0u8; 16];
        assert_eq!(link.recv(&mut buf), RecvStatus::Idle);
        assert_eq!(link.recv(&mut buf), RecvStatus::Data(4));
        assert_eq!(link.recv(&mut buf), RecvStatus::Idle);
    }

    #[test]
    fn recv_fatal_errors_fail() {
        let mut transport = FakeTransport::default();
        transport.recv_results.push_back(Err(TransportError::Failed("gone".into())));
        let mut link = Link::new(transport, 25);

        let mut buf = [0u8; 16];
        assert_eq!(link.recv(&mut buf), RecvStatus::Failed);
    }

    #[test]
    fn retried_send_backs_off_between_attempts() {
        let mut transport = FakeTransport::default();
        for _ in 0..2 {
            transport.send_results.push_back(Err(TransportError::WouldBlock));
        }
        let mut link = Link::new(transport, 25);
        let delay = CountingDelay { can_block: true, sleeps: Cell::new(0) };

        let policy = RetryPolicy { max_attempts: 5, backoff: Duration::from_millis(5) };
        assert!(link.send_with_retries(b"x", &delay, policy));
        assert_eq!(delay.sleeps.get(), 2);
    }

    #[test]
    fn retried_send_refuses_non_blocking_contexts() {
        let mut link = Link::new(FakeTransport::default(), 25);
        let delay = CountingDelay { can_block: false, sleeps: Cell::new(0) };

        assert!(!link.send_with_retries(b"x", &delay, RetryPolicy::default()));
        assert_eq!(delay.sleeps.get(), 0);
        // the transport was never touched
        assert_eq!(link.transport.sends_attempted, 0);
    }

    #[test]
    fn retried_send_gives_up_after_the_budget() {
        let mut transport = FakeTransport::default();
        for _ in 0..10 {
            transport.send_results.push_back(Err(TransportError::WouldBlock));
        }
        let mut link = Link::new(transport, 25);
        let delay = CountingDelay { can_block: true, sleeps: Cell::new(0) };

        let policy = RetryPolicy { max_attempts: 3, backoff: Duration::from_millis(5) };
        assert!(!link.send_with_retries(b"x", &delay, policy));
        // initial attempt plus three retries, sleeping between them only
        assert_eq!(link.transport.sends_attempted, 4);
        assert_eq!(delay.sleeps.get(), 3);
    }
}
