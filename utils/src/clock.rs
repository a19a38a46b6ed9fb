//! Wall-clock abstraction.
//!
//! Used for local sanity checks that must run before any backend call. The
//! ledger's own clock, reported with each voting-period read, stays
//! authoritative.

use votechain_types::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The host's system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now() > Timestamp::EPOCH);
    }
}
