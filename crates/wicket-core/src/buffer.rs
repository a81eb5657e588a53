//! Fixed-capacity relay ring buffer and credential line parser.
//!
//! One storage area serves two roles. While the login dialogue runs, it
//! accumulates credential bytes and scans them for a carriage-return
//! terminated line. Once the session is logged in, it stages raw received
//! bytes between the transport and the console consumer.
//!
//! The buffer follows a single-producer/single-consumer discipline across two
//! logical contexts: the scheduler step appends bytes, a polling consumer
//! pops them. [`RelayBuffer::extend`] copies every byte before publishing the
//! new occupancy, and [`RelayBuffer::pop`] consumes a byte before retiring
//! it, so the consumer can never observe unpublished data. Indices advance
//! modulo the capacity and an explicit occupancy count distinguishes a full
//! buffer from an empty one under any wraparound sequence.

use wicket_proto::line::{self, LineScan};

/// Default capacity of the relay buffer in bytes.
pub const DEFAULT_CAPACITY: usize = 256;

/// Outcome of a credential scan over the collected bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScan {
    /// A terminated line arrived and equals the expected credential.
    Match,
    /// A terminated line arrived and differs, or the length bound was hit
    /// without a terminator.
    Mismatch,
    /// No terminator yet; keep collecting.
    Pending,
}

/// Fixed-capacity byte ring shared by receive staging and credential
/// collection.
///
/// Allocated once at session initialization and never resized.
#[derive(Debug)]
pub struct RelayBuffer {
    storage: Box<[u8]>,
    /// Next write position, modulo capacity.
    write: usize,
    /// Next read position, modulo capacity.
    read: usize,
    /// Published occupancy; always `<= capacity`.
    count: usize,
}

impl RelayBuffer {
    /// Allocate a buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self { storage: vec![0u8; capacity].into_boxed_slice(), write: 0, read: 0, count: 0 }
    }

    /// Total capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Published occupancy in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when no published byte remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Remaining free capacity in bytes.
    #[must_use]
    pub fn free(&self) -> usize {
        self.storage.len() - self.count
    }

    /// Append bytes, truncating at the free capacity.
    ///
    /// Every accepted byte is copied into storage before the occupancy is
    /// published. Returns the number of bytes accepted.
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        let accepted = bytes.len().min(self.free());
        for &byte in &bytes[..accepted] {
            self.storage[self.write] = byte;
            self.write = (self.write + 1) % self.storage.len();
        }
        // publish only after the copy completed
        self.count += accepted;
        accepted
    }

    /// Pop one published byte, oldest first.
    pub fn pop(&mut self) -> Option<u8> {
        if self.count == 0 {
            return None;
        }
        let byte = self.storage[self.read];
        self.read = (self.read + 1) % self.storage.len();
        self.count -= 1;
        Some(byte)
    }

    /// Drop all contents and rewind both indices.
    pub fn clear(&mut self) {
        self.write = 0;
        self.read = 0;
        self.count = 0;
    }

    /// Scan the collected bytes for a credential line, bounded by `max_len`.
    ///
    /// Any decision (match, mismatch, or overflow folded into mismatch)
    /// resets the collection so the next prompt starts clean. Collection must
    /// have started from a cleared buffer, which keeps the collected region
    /// contiguous from the start of storage.
    pub fn scan_credential(&mut self, expected: &str, max_len: usize) -> CredentialScan {
        debug_assert_eq!(self.read, 0, "credential collection must start from a cleared buffer");
        let collected = &self.storage[..self.count];
        let outcome = match line::scan(collected, max_len) {
            LineScan::Complete { len } => {
                if line::credential_matches(&collected[..len], expected) {
                    CredentialScan::Match
                } else {
                    CredentialScan::Mismatch
                }
            }
            // the line can never become valid; fold overflow into a mismatch
            LineScan::Overflow => CredentialScan::Mismatch,
            LineScan::Pending => CredentialScan::Pending,
        };
        if outcome != CredentialScan::Pending {
            self.clear();
        }
        outcome
    }

    /// Clear and re-arm the buffer so the console redraws a clean prompt.
    ///
    /// Half the capacity is filled with backspaces followed by a synthetic
    /// carriage return: the consumer erases whatever line it was editing and
    /// acts as if enter was pressed, which makes it print a fresh prompt.
    pub fn prime_redisplay(&mut self) {
        self.clear();
        let half = self.storage.len() / 2;
        for slot in &mut self.storage[..half] {
            *slot = b'\x08';
        }
        self.storage[half] = b'\r';
        self.write = half + 1;
        self.count = half + 1;
    }
}

impl Default for RelayBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use proptest::prelude::*;

    use super::{CredentialScan, RelayBuffer};

    #[test]
    fn bytes_come_back_in_order() {
        let mut buffer = RelayBuffer::new(8);
        assert_eq!(buffer.extend(b"abc"), 3);
        assert_eq!(buffer.pop(), Some(b'a'));
        assert_eq!(buffer.pop(), Some(b'b'));
        assert_eq!(buffer.extend(b"d"), 1);
        assert_eq!(buffer.pop(), Some(b'c'));
        assert_eq!(buffer.pop(), Some(b'd'));
        assert_eq!(buffer.pop(), None);
    }

    #[test]
    fn full_is_distinguishable_from_empty() {
        let mut buffer = RelayBuffer::new(4);
        assert!(buffer.is_empty());
        assert_eq!(buffer.extend(b"wxyz"), 4);
        assert_eq!(buffer.free(), 0);
        assert!(!buffer.is_empty());
        // write and read indices coincide here; only the count tells them apart
        assert_eq!(buffer.len(), 4);
        for expected in *b"wxyz" {
            assert_eq!(buffer.pop(), Some(expected));
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn extend_truncates_at_free_capacity() {
        let mut buffer = RelayBuffer::new(4);
        assert_eq!(buffer.extend(b"abcdef"), 4);
        assert_eq!(buffer.extend(b"g"), 0);
    }

    #[test]
    fn credential_scan_decides_and_resets() {
        let mut buffer = RelayBuffer::new(64);
        buffer.extend(b"gue");
        assert_eq!(buffer.scan_credential("guest", 16), CredentialScan::Pending);
        buffer.extend(b"st\r");
        assert_eq!(buffer.scan_credential("guest", 16), CredentialScan::Match);
        assert!(buffer.is_empty());

        buffer.extend(b"intruder\r");
        assert_eq!(buffer.scan_credential("guest", 16), CredentialScan::Mismatch);
        assert!(buffer.is_empty());
    }

    #[test]
    fn overflow_without_terminator_is_a_mismatch() {
        let mut buffer = RelayBuffer::new(64);
        buffer.extend(&[b'a'; 16]);
        assert_eq!(buffer.scan_credential("guest", 16), CredentialScan::Mismatch);
        assert!(buffer.is_empty());
    }

    #[test]
    fn prime_redisplay_stages_backspaces_and_enter() {
        let mut buffer = RelayBuffer::new(16);
        buffer.extend(b"junk");
        buffer.prime_redisplay();
        assert_eq!(buffer.len(), 9);
        for _ in 0..8 {
            assert_eq!(buffer.pop(), Some(b'\x08'));
        }
        assert_eq!(buffer.pop(), Some(b'\r'));
        assert_eq!(buffer.pop(), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]

        /// The consumer never overtakes the producer and contents always
        /// match a queue model, regardless of how the indices wrap.
        #[test]
        fn behaves_like_a_bounded_queue(ops in prop::collection::vec((any::<Vec<u8>>(), 0usize..12), 1..64)) {
            let mut buffer = RelayBuffer::new(16);
            let mut model: VecDeque<u8> = VecDeque::new();

            for (chunk, pops) in ops {
                let accepted = buffer.extend(&chunk);
                let expected = chunk.len().min(16 - model.len());
                prop_assert_eq!(accepted, expected);
                model.extend(&chunk[..accepted]);

                for _ in 0..pops {
                    prop_assert_eq!(buffer.pop(), model.pop_front());
                }
                prop_assert_eq!(buffer.len(), model.len());
                prop_assert!(buffer.len() <= buffer.capacity());
            }
        }
    }
}
