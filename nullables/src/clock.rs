//! Nullable clock: deterministic time for testing.

use std::sync::atomic::{AtomicU64, Ordering};
use votechain_types::Timestamp;
use votechain_utils::Clock;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to. Shared between the registry (as
/// ledger time) and the client (as local time) so both agree.
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
        }
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        self.current.fetch_add(secs, Ordering::SeqCst);
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: u64) {
        self.current.store(secs, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }
}

impl Default for NullClock {
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_moves_when_told() {
        let clock = NullClock::new(100);
        assert_eq!(clock.now(), Timestamp::new(100));
        clock.advance(50);
        assert_eq!(clock.now(), Timestamp::new(150));
        clock.set(10);
        assert_eq!(clock.now(), Timestamp::new(10));
    }
}
