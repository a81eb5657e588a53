//! Prompt strings for the login dialogue.
//!
//! The welcome banner is not here: it is host-supplied through the session
//! configuration, since version-string construction belongs to the embedding
//! firmware.

/// Username prompt.
pub const REQUEST_USER: &str = "Login as:";

/// Password prompt.
pub const REQUEST_PASSWORD: &str = "Password:";

/// Sent after a failed username/password round.
pub const INVALID_LOGIN: &str = "\r\nInvalid credentials, try again.\r\n";

/// Sent once the password round succeeds.
pub const LOGIN_SUCCESS: &str = "\r\nLogin succeeded!\r\n";
