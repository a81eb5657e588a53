//! Host delay capability.

use std::thread;
use std::time::Duration;

use wicket_core::Delay;

/// [`Delay`] backed by `std::thread::sleep`.
///
/// The tick loop runs on an ordinary thread, which may always pause briefly
/// between send retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn can_block(&self) -> bool {
        true
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
