//! Session state machine for the login gateway.
//!
//! This module implements the session layer: enablement, transport binding,
//! the terminal-style login dialogue, byte relay to the console, and
//! timeout-driven self-healing.
//!
//! # Architecture: tick-stepped state machine
//!
//! The host scheduler calls [`Session::step`] once per tick. Each step
//! performs at most one non-blocking send or receive attempt for the current
//! state and returns; a sub-state advances only when its operation fully
//! succeeds. Failures never surface to the scheduler: every fatal condition
//! resets the session to `Start`, observable only through
//! [`Session::is_enabled`] and [`Session::is_active`].
//!
//! # State machine
//!
//! ```text
//! ┌──────────┐ enable  ┌───────┐ bind ok ┌──────────────────────┐ dialogue ┌──────────┐
//! │ Disabled │────────>│ Start │────────>│ Connected(LoginPhase)│─────────>│ LoggedIn │
//! └──────────┘         └───────┘         └──────────────────────┘          └──────────┘
//!      ^                    ^                   │                                │
//!      │ disable (any)      └───────────────────┴── fatal error / idle timeout ──┘
//! ```
//!
//! Login phases, in order: `Welcome`, `SendUserOptions`, `RequestUser`,
//! `CollectUser`, `RequestPassword`, `SendPasswordOptions`,
//! `CollectPassword`, then either `InvalidLogin` back to `RequestUser` or
//! `SendReplOptions` and `LoginSuccess` into `LoggedIn`.
//!
//! # Single instance
//!
//! The design supports exactly one active session: one transport, one latched
//! peer, one relay buffer. The owning value replaces the global singleton of
//! classic firmware implementations; create it once at initialization and
//! step it for the life of the process.

use std::time::Duration;

use tracing::{debug, info, warn};

use wicket_proto::{options, prompts};

use crate::buffer::{CredentialScan, DEFAULT_CAPACITY, RelayBuffer};
use crate::env::Delay;
use crate::link::{Link, RecvStatus, RetryPolicy, SendStatus};
use crate::transport::DatagramTransport;

/// Top-level session state.
///
/// The login sub-state only exists while connected, so it is carried as the
/// payload of the `Connected` variant rather than alongside the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Service is off; nothing is bound and steps are no-ops until enabled.
    Disabled,
    /// Enabled but not yet bound; each step attempts to open the transport.
    Start,
    /// Transport bound; the login dialogue is in progress.
    Connected(LoginPhase),
    /// Credentials accepted; relaying raw bytes to the console.
    LoggedIn,
}

/// Steps of the login dialogue while connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPhase {
    /// Waiting for a client, then sending the welcome banner.
    Welcome,
    /// Sending the username-phase terminal options.
    SendUserOptions,
    /// Sending the username prompt.
    RequestUser,
    /// Collecting the username line.
    CollectUser,
    /// Sending the password prompt.
    RequestPassword,
    /// Sending the password-phase terminal options.
    SendPasswordOptions,
    /// Collecting the password line.
    CollectPassword,
    /// Reporting failed credentials, then retrying or resetting.
    InvalidLogin,
    /// Sending the console-phase terminal options.
    SendReplOptions,
    /// Sending the success notice, then entering the relay.
    LoginSuccess,
}

/// Session configuration.
///
/// Defaults carry the reference values; hosts override what they need and
/// must supply their own banner, since version-string construction belongs to
/// the embedding firmware.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Local port the transport binds.
    pub port: u16,
    /// Expected username.
    pub username: String,
    /// Expected password.
    pub password: String,
    /// Welcome banner sent when a client first appears.
    pub banner: String,
    /// Longest accepted credential line, terminator excluded.
    pub max_credential_len: usize,
    /// Failed login rounds tolerated before a full reset.
    pub max_login_attempts: u8,
    /// Consecutive would-block sends tolerated on the dialogue path.
    pub max_send_retries: u32,
    /// Retry policy for the console transmit path.
    pub retry_policy: RetryPolicy,
    /// Idle time without a successful receive before a forced reset.
    pub idle_timeout: Duration,
    /// Scheduler cycle period; with `idle_timeout` it fixes the tick budget.
    pub cycle_time: Duration,
    /// Relay buffer capacity in bytes.
    pub buffer_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port: 5683,
            username: "guest".into(),
            password: "guest".into(),
            banner: "Wicket console\r\n".into(),
            max_credential_len: 32,
            max_login_attempts: 3,
            max_send_retries: 25,
            retry_policy: RetryPolicy::default(),
            idle_timeout: Duration::from_secs(300),
            cycle_time: Duration::from_millis(10),
            buffer_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Which credential a collect phase is gathering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialRole {
    Username,
    Password,
}

/// The authentication gateway session.
///
/// Owns the transport link, the relay buffer, and all dialogue state. See
/// the module documentation for the scheduling and self-healing contract.
#[derive(Debug)]
pub struct Session<T, D> {
    config: SessionConfig,
    link: Link<T>,
    delay: D,
    buffer: RelayBuffer,
    /// Receive staging; bytes are copied here before being published to the
    /// relay buffer.
    scratch: Box<[u8]>,
    state: SessionState,
    enabled: bool,
    /// Username round outcome, reported only after the password round.
    user_matched: bool,
    idle_ticks: u32,
    login_attempts: u8,
    /// Ticks without a successful receive before a forced reset.
    idle_limit: u32,
}

impl<T: DatagramTransport, D: Delay> Session<T, D> {
    /// Create a disabled session.
    ///
    /// Performs the fixed-size buffer allocations up front; they are never
    /// resized, and nothing is bound until the session is enabled and
    /// stepped.
    pub fn new(config: SessionConfig, transport: T, delay: D) -> Self {
        let cycle_ms = config.cycle_time.as_millis().max(1);
        let idle_limit = (config.idle_timeout.as_millis() / cycle_ms) as u32;
        let buffer = RelayBuffer::new(config.buffer_capacity);
        let scratch = vec![0u8; config.buffer_capacity].into_boxed_slice();
        let link = Link::new(transport, config.max_send_retries);
        Self {
            config,
            link,
            delay,
            buffer,
            scratch,
            state: SessionState::Disabled,
            enabled: false,
            user_matched: false,
            idle_ticks: 0,
            login_attempts: 0,
            idle_limit,
        }
    }

    /// Current top-level state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Mark the service enabled; the next step leaves `Disabled`.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Tear down any in-progress connection and park in `Disabled`.
    pub fn disable(&mut self) {
        self.reset();
        self.enabled = false;
        self.state = SessionState::Disabled;
        debug!("service disabled");
    }

    /// Whether the service is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True only once a client is fully logged in.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::LoggedIn
    }

    /// Perform one unit of work.
    ///
    /// Never blocks and never fails: fatal conditions reset the session in
    /// place and the next step starts a fresh listen cycle.
    pub fn step(&mut self) {
        match self.state {
            SessionState::Disabled => self.wait_for_enable(),
            SessionState::Start => self.open_transport(),
            SessionState::Connected(phase) => self.drive_login(phase),
            SessionState::LoggedIn => self.pump_relay(),
        }
        self.supervise_idle();
    }

    /// Raw console transmit over the bounded-retry path.
    ///
    /// Silently dropped when no client is present or the execution context
    /// cannot block.
    pub fn tx(&mut self, data: &[u8]) {
        if data.is_empty() || !self.peer_ready() {
            return;
        }
        let policy = self.config.retry_policy;
        if !self.link.send_with_retries(data, &self.delay, policy) {
            debug!(len = data.len(), "console transmit dropped");
        }
    }

    /// Normalized console transmit: each line feed is sent as a separate
    /// carriage-return/line-feed write.
    ///
    /// `a\nb` becomes exactly three writes: `a`, `\r\n`, `b`. Empty segments
    /// are skipped rather than sent as zero-length datagrams.
    pub fn tx_cooked(&mut self, data: &[u8]) {
        for (index, segment) in data.split(|&b| b == b'\n').enumerate() {
            if index > 0 {
                self.tx(b"\r\n");
            }
            if !segment.is_empty() {
                self.tx(segment);
            }
        }
    }

    /// Whether a relayed byte is available for the console.
    #[must_use]
    pub fn rx_any(&self) -> bool {
        self.is_active() && !self.buffer.is_empty()
    }

    /// Pop one relayed byte; only ever non-empty once the session is active.
    pub fn rx_char(&mut self) -> Option<u8> {
        if self.is_active() { self.buffer.pop() } else { None }
    }

    fn wait_for_enable(&mut self) {
        if self.enabled {
            debug!("service enabled, starting");
            self.state = SessionState::Start;
        }
    }

    fn open_transport(&mut self) {
        match self.link.open(self.config.port) {
            Ok(()) => {
                info!(port = self.config.port, "transport bound, awaiting client");
                self.state = SessionState::Connected(LoginPhase::Welcome);
            }
            Err(err) => {
                debug!(%err, port = self.config.port, "bind failed, retrying next tick");
            }
        }
    }

    fn drive_login(&mut self, phase: LoginPhase) {
        match phase {
            LoginPhase::Welcome => {
                // no client yet: idle here without spending retry budget
                if !self.link.has_peer() {
                    return;
                }
                self.send_then(LoginPhase::SendUserOptions);
            }
            LoginPhase::SendUserOptions => {
                self.send_then(LoginPhase::RequestUser);
            }
            LoginPhase::RequestUser => {
                // catch and discard whatever the client sent in response to
                // the option negotiation before the username line starts
                self.drain_one();
                if matches!(self.state, SessionState::Connected(_))
                    && self.send_then(LoginPhase::CollectUser)
                {
                    self.buffer.clear();
                }
            }
            LoginPhase::CollectUser => self.collect_credential(CredentialRole::Username),
            LoginPhase::RequestPassword => {
                self.send_then(LoginPhase::SendPasswordOptions);
            }
            LoginPhase::SendPasswordOptions => {
                if self.send_then(LoginPhase::CollectPassword) {
                    self.buffer.clear();
                }
            }
            LoginPhase::CollectPassword => self.collect_credential(CredentialRole::Password),
            LoginPhase::InvalidLogin => self.conclude_invalid(),
            LoginPhase::SendReplOptions => {
                self.send_then(LoginPhase::LoginSuccess);
            }
            LoginPhase::LoginSuccess => self.conclude_success(),
        }
    }

    /// Attempt the current phase's send; advance to `next` when it completes.
    ///
    /// Returns true on the tick the transition happens.
    fn send_then(&mut self, next: LoginPhase) -> bool {
        let SessionState::Connected(phase) = self.state else {
            return false;
        };
        match self.link.send(login_payload(&self.config, phase)) {
            SendStatus::Sent => {
                debug!(from = ?phase, to = ?next, "login phase advanced");
                self.state = SessionState::Connected(next);
                true
            }
            SendStatus::Again => false,
            SendStatus::Failed => {
                self.reset();
                false
            }
        }
    }

    fn collect_credential(&mut self, role: CredentialRole) {
        let limit = self.buffer.free().min(self.scratch.len());
        match self.link.recv(&mut self.scratch[..limit]) {
            RecvStatus::Data(len) => {
                self.idle_ticks = 0;
                self.buffer.extend(&self.scratch[..len]);
                let expected = match role {
                    CredentialRole::Username => self.config.username.as_str(),
                    CredentialRole::Password => self.config.password.as_str(),
                };
                let scan = self.buffer.scan_credential(expected, self.config.max_credential_len);
                match (role, scan) {
                    (_, CredentialScan::Pending) => {}
                    (CredentialRole::Username, decided) => {
                        // never reveal the username outcome before the
                        // password round
                        self.user_matched = decided == CredentialScan::Match;
                        self.state = SessionState::Connected(LoginPhase::RequestPassword);
                    }
                    (CredentialRole::Password, CredentialScan::Match) if self.user_matched => {
                        self.state = SessionState::Connected(LoginPhase::SendReplOptions);
                    }
                    (CredentialRole::Password, _) => {
                        self.state = SessionState::Connected(LoginPhase::InvalidLogin);
                    }
                }
            }
            RecvStatus::Idle => {}
            RecvStatus::Failed => self.reset(),
        }
    }

    fn conclude_invalid(&mut self) {
        match self.link.send(prompts::INVALID_LOGIN.as_bytes()) {
            SendStatus::Sent => {
                self.login_attempts += 1;
                if self.login_attempts >= self.config.max_login_attempts {
                    warn!(attempts = self.login_attempts, "login attempts exhausted, resetting");
                    self.reset();
                } else {
                    debug!(attempts = self.login_attempts, "invalid credentials, prompting again");
                    self.buffer.prime_redisplay();
                    self.user_matched = false;
                    self.state = SessionState::Connected(LoginPhase::RequestUser);
                }
            }
            SendStatus::Again => {}
            SendStatus::Failed => self.reset(),
        }
    }

    fn conclude_success(&mut self) {
        match self.link.send(prompts::LOGIN_SUCCESS.as_bytes()) {
            SendStatus::Sent => {
                info!("login succeeded, console relay active");
                // stage a synthetic line erase + enter so the console draws
                // a fresh prompt
                self.buffer.prime_redisplay();
                self.login_attempts = 0;
                self.user_matched = false;
                self.state = SessionState::LoggedIn;
            }
            SendStatus::Again => {}
            SendStatus::Failed => self.reset(),
        }
    }

    /// One discard receive; the bytes never reach the relay buffer.
    fn drain_one(&mut self) {
        match self.link.recv(&mut self.scratch[..]) {
            RecvStatus::Data(_) => self.idle_ticks = 0,
            RecvStatus::Idle => {}
            RecvStatus::Failed => self.reset(),
        }
    }

    /// One staged receive into the relay buffer.
    fn pump_relay(&mut self) {
        let limit = self.buffer.free().min(self.scratch.len());
        if limit == 0 {
            // consumer is behind; leave the datagram queued for a later tick
            return;
        }
        match self.link.recv(&mut self.scratch[..limit]) {
            RecvStatus::Data(len) => {
                self.idle_ticks = 0;
                self.buffer.extend(&self.scratch[..len]);
            }
            RecvStatus::Idle => {}
            RecvStatus::Failed => self.reset(),
        }
    }

    fn supervise_idle(&mut self) {
        if !matches!(self.state, SessionState::Connected(_) | SessionState::LoggedIn) {
            return;
        }
        self.idle_ticks = self.idle_ticks.saturating_add(1);
        if self.idle_ticks > self.idle_limit {
            warn!(ticks = self.idle_ticks, "idle timeout, resetting session");
            self.reset();
        }
    }

    /// Close the transport and start over; the next step begins a fresh
    /// listen cycle.
    fn reset(&mut self) {
        debug!(state = ?self.state, "session reset");
        self.link.close();
        self.buffer.clear();
        self.idle_ticks = 0;
        self.login_attempts = 0;
        self.user_matched = false;
        self.state = SessionState::Start;
    }

    fn peer_ready(&mut self) -> bool {
        matches!(self.state, SessionState::Connected(_) | SessionState::LoggedIn)
            && self.link.has_peer()
    }
}

/// Bytes sent by the phases that go through the common send path.
fn login_payload(config: &SessionConfig, phase: LoginPhase) -> &[u8] {
    match phase {
        LoginPhase::Welcome => config.banner.as_bytes(),
        LoginPhase::SendUserOptions => &options::USER_PHASE,
        LoginPhase::RequestUser => prompts::REQUEST_USER.as_bytes(),
        LoginPhase::RequestPassword => prompts::REQUEST_PASSWORD.as_bytes(),
        LoginPhase::SendPasswordOptions => &options::PASSWORD_PHASE,
        LoginPhase::SendReplOptions => &options::REPL_PHASE,
        // receive phases and the concluding notices do not use this path
        LoginPhase::CollectUser
        | LoginPhase::CollectPassword
        | LoginPhase::InvalidLogin
        | LoginPhase::LoginSuccess => &[],
    }
}
