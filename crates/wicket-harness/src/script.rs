//! Scripted transport and delay doubles.
//!
//! Both doubles are cheap shared handles: the session owns one clone while
//! the test keeps another to push datagrams, script faults, and inspect what
//! was sent. Everything is single-threaded, matching the gateway's
//! cooperative scheduling model.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use bytes::Bytes;

use wicket_core::{DatagramTransport, Delay, TransportError};

/// One scripted reaction to a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendScript {
    /// Accept and record the datagram.
    Deliver,
    /// Report would-block.
    Block,
    /// Report a fatal transport error.
    Fail,
}

#[derive(Debug, Default)]
struct TransportState {
    open: bool,
    peer_seen: bool,
    fail_next_open: bool,
    fail_next_recv: bool,
    inbound: VecDeque<Vec<u8>>,
    send_plan: VecDeque<SendScript>,
    sent: Vec<Bytes>,
    opens: u32,
    closes: u32,
}

/// Scripted [`DatagramTransport`]: queued inbound datagrams, recorded
/// outbound sends, programmable faults.
///
/// Cloning returns another handle onto the same state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Rc<RefCell<TransportState>>,
}

impl ScriptedTransport {
    /// Create an unbound transport with an empty wire.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a client as present without queueing data, as the latching
    /// connection knock would.
    pub fn connect_peer(&self) {
        self.state.borrow_mut().peer_seen = true;
    }

    /// Queue a datagram from the peer; implies the peer is present.
    pub fn push_datagram(&self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        state.peer_seen = true;
        state.inbound.push_back(data.to_vec());
    }

    /// Script the outcome of upcoming send attempts, consumed in order;
    /// unscripted sends deliver.
    pub fn script_send(&self, outcome: SendScript) {
        self.state.borrow_mut().send_plan.push_back(outcome);
    }

    /// Script `count` consecutive would-block send results.
    pub fn block_sends(&self, count: u32) {
        for _ in 0..count {
            self.script_send(SendScript::Block);
        }
    }

    /// Make the next receive fail fatally.
    pub fn fail_next_recv(&self) {
        self.state.borrow_mut().fail_next_recv = true;
    }

    /// Make the next open fail.
    pub fn fail_next_open(&self) {
        self.state.borrow_mut().fail_next_open = true;
    }

    /// All datagrams delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<Bytes> {
        self.state.borrow().sent.clone()
    }

    /// Forget the recorded sends.
    pub fn clear_sent(&self) {
        self.state.borrow_mut().sent.clear();
    }

    /// How many times the transport was opened.
    #[must_use]
    pub fn opens(&self) -> u32 {
        self.state.borrow().opens
    }

    /// How many times the transport was closed.
    #[must_use]
    pub fn closes(&self) -> u32 {
        self.state.borrow().closes
    }

    /// Whether the transport is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }
}

impl DatagramTransport for ScriptedTransport {
    fn open(&mut self, _port: u16) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if state.fail_next_open {
            state.fail_next_open = false;
            return Err(TransportError::Failed("scripted bind failure".into()));
        }
        state.open = true;
        state.opens += 1;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.state.borrow_mut();
        if !state.open {
            return Err(TransportError::Closed);
        }
        if !state.peer_seen {
            return Err(TransportError::WouldBlock);
        }
        match state.send_plan.pop_front().unwrap_or(SendScript::Deliver) {
            SendScript::Deliver => {
                state.sent.push(Bytes::copy_from_slice(data));
                Ok(data.len())
            }
            SendScript::Block => Err(TransportError::WouldBlock),
            SendScript::Fail => Err(TransportError::Failed("scripted send failure".into())),
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.state.borrow_mut();
        if !state.open {
            return Err(TransportError::Closed);
        }
        if state.fail_next_recv {
            state.fail_next_recv = false;
            return Err(TransportError::Failed("scripted receive failure".into()));
        }
        match state.inbound.pop_front() {
            Some(datagram) => {
                let len = datagram.len().min(buf.len());
                buf[..len].copy_from_slice(&datagram[..len]);
                Ok(len)
            }
            None => Err(TransportError::WouldBlock),
        }
    }

    fn has_peer(&mut self) -> bool {
        let state = self.state.borrow();
        state.open && state.peer_seen
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.open {
            state.closes += 1;
        }
        state.open = false;
        state.peer_seen = false;
        state.inbound.clear();
    }
}

#[derive(Debug, Default)]
struct DelayLog {
    sleeps: Vec<Duration>,
}

/// Recording [`Delay`]: counts sleeps instead of sleeping, and can model an
/// execution context that must not block.
#[derive(Debug, Clone)]
pub struct RecordingDelay {
    log: Rc<RefCell<DelayLog>>,
    can_block: bool,
}

impl RecordingDelay {
    /// A context that may sleep; sleeps are recorded, not performed.
    #[must_use]
    pub fn blocking() -> Self {
        Self { log: Rc::default(), can_block: true }
    }

    /// An interrupt-equivalent context that must never sleep.
    #[must_use]
    pub fn non_blocking() -> Self {
        Self { log: Rc::default(), can_block: false }
    }

    /// Every sleep requested so far.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.log.borrow().sleeps.clone()
    }
}

impl Delay for RecordingDelay {
    fn can_block(&self) -> bool {
        self.can_block
    }

    fn sleep(&self, duration: Duration) {
        self.log.borrow_mut().sleeps.push(duration);
    }
}
