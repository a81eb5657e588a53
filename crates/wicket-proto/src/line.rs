//! Carriage-return line scanning and credential classification.

use subtle::ConstantTimeEq;

/// Line terminator for credential entry.
pub const TERMINATOR: u8 = b'\r';

/// Outcome of scanning collected bytes for a terminated credential line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineScan {
    /// A terminator was found after `len` line bytes.
    Complete {
        /// Number of bytes before the terminator.
        len: usize,
    },
    /// No terminator within the length bound; the line can never become valid.
    Overflow,
    /// No terminator yet and the bound is not exhausted.
    Pending,
}

/// Scan `collected` for a line terminator, looking at most `max_len` bytes.
///
/// `Overflow` is reported once `max_len` bytes have accumulated without a
/// terminator.
pub fn scan(collected: &[u8], max_len: usize) -> LineScan {
    let window = &collected[..collected.len().min(max_len)];
    match window.iter().position(|&b| b == TERMINATOR) {
        Some(len) => LineScan::Complete { len },
        None if collected.len() >= max_len => LineScan::Overflow,
        None => LineScan::Pending,
    }
}

/// Compare an entered line against the expected credential.
///
/// The comparison is constant-time over the line contents. An empty line
/// never matches, and a length difference is always a mismatch.
pub fn credential_matches(line: &[u8], expected: &str) -> bool {
    !line.is_empty() && bool::from(line.ct_eq(expected.as_bytes()))
}
