//! Timestamp type used throughout the client.
//!
//! Timestamps are Unix epoch seconds (UTC). Voting periods are judged against
//! the ledger's clock, which the backend reports alongside each period read.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    ///
    /// A clock set before the epoch reads as [`Timestamp::EPOCH`].
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds from this timestamp until `later`, or zero if `later` is not after it.
    pub fn until(&self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0)
    }

    /// This timestamp shifted forward by `secs`.
    pub fn plus(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// This timestamp shifted backward by `secs`, clamped at the epoch.
    pub fn minus(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}
