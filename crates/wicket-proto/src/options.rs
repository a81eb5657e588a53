//! Terminal control-code option sequences for the login dialogue.
//!
//! Each login phase is preceded by a short negotiation telling the client how
//! to treat echo and line buffering: the username is typed with local echo and
//! sent as a whole line, the password is typed blind (the server claims echo
//! and never echoes), and the interactive console after login switches to
//! character-at-a-time input with server-side echo.

/// Interpret-as-command escape byte; prefixes every negotiation verb.
pub const IAC: u8 = 255;

/// Negotiation verb: the sender offers to enable an option on its side.
pub const WILL: u8 = 251;

/// Negotiation verb: the sender refuses to enable an option on its side.
pub const WONT: u8 = 252;

/// Echo option code.
pub const ECHO: u8 = 1;

/// Suppress go-ahead option code.
pub const SUPPRESS_GO_AHEAD: u8 = 3;

/// Linemode option code.
pub const LINEMODE: u8 = 34;

/// Sent before the username prompt.
///
/// The client keeps local echo and line-buffered input, so the username
/// arrives as one carriage-return terminated line.
pub const USER_PHASE: [u8; 9] =
    [IAC, WONT, ECHO, IAC, WONT, SUPPRESS_GO_AHEAD, IAC, WILL, LINEMODE];

/// Sent around the password prompt.
///
/// The server claims echo so the client stops echoing locally; the password
/// is typed blind but still delivered as one line.
pub const PASSWORD_PHASE: [u8; 9] =
    [IAC, WILL, ECHO, IAC, WONT, SUPPRESS_GO_AHEAD, IAC, WILL, LINEMODE];

/// Sent once credentials are accepted.
///
/// Character-at-a-time input with server-side echo, as an interactive console
/// expects.
pub const REPL_PHASE: [u8; 9] =
    [IAC, WILL, ECHO, IAC, WILL, SUPPRESS_GO_AHEAD, IAC, WONT, LINEMODE];
