//! Voting period snapshot as reported by the registry.

use serde::{Deserialize, Serialize};

use crate::{Timestamp, TypesError};

/// A snapshot of the voting window together with the ledger time it was read at.
///
/// When `is_set`, `start_time < end_time`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingPeriod {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Ledger time at which this snapshot was taken.
    #[serde(rename = "currentTime")]
    pub chain_time: Timestamp,
    pub is_set: bool,
}

impl VotingPeriod {
    /// A configured window, validated so that start precedes end.
    pub fn new(
        start_time: Timestamp,
        end_time: Timestamp,
        chain_time: Timestamp,
    ) -> Result<Self, TypesError> {
        let period = Self {
            start_time,
            end_time,
            chain_time,
            is_set: true,
        };
        period.validate()?;
        Ok(period)
    }

    /// A snapshot with no window configured yet.
    pub fn unset(chain_time: Timestamp) -> Self {
        Self {
            start_time: Timestamp::EPOCH,
            end_time: Timestamp::EPOCH,
            chain_time,
            is_set: false,
        }
    }

    /// Check the start-before-end invariant for a set window.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.is_set && self.start_time >= self.end_time {
            return Err(TypesError::InvalidPeriod {
                start: self.start_time.as_secs(),
                end: self.end_time.as_secs(),
            });
        }
        Ok(())
    }

    /// The same window observed at a different ledger time.
    pub fn at(&self, chain_time: Timestamp) -> Self {
        Self { chain_time, ..*self }
    }

    /// `is_set` and `chain_time` in `[start_time, end_time)`.
    pub fn is_active(&self) -> bool {
        self.is_set && self.chain_time >= self.start_time && self.chain_time < self.end_time
    }

    /// `is_set` and `chain_time >= end_time`.
    pub fn has_ended(&self) -> bool {
        self.is_set && self.chain_time >= self.end_time
    }
}
