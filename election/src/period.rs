//! Voting-period lifecycle.
//!
//! Phases are derived from an explicit [`VotingPeriod`] snapshot by pure
//! functions; nothing here holds state or touches the network.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use votechain_types::{Timestamp, VotingPeriod};
use votechain_utils::split_duration;

/// Where a voting period stands relative to ledger time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No window configured.
    NotSet,
    /// Configured, but ledger time is before the start.
    Pending,
    /// Votes are accepted.
    Active,
    /// Ledger time has reached the end.
    Ended,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSet => "not_set",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one phase holds for every snapshot.
pub fn derive_phase(period: &VotingPeriod) -> Phase {
    if !period.is_set {
        Phase::NotSet
    } else if period.chain_time >= period.end_time {
        Phase::Ended
    } else if period.chain_time >= period.start_time {
        Phase::Active
    } else {
        Phase::Pending
    }
}

/// Time left in an active period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Countdown {
    pub fn from_secs(secs: u64) -> Self {
        let (days, hours, minutes, seconds) = split_duration(secs);
        Self {
            days,
            hours,
            minutes,
            seconds,
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.total_secs() == 0
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Remaining time for an active period, `None` in any other phase.
pub fn remaining(period: &VotingPeriod) -> Option<Countdown> {
    match derive_phase(period) {
        Phase::Active => Some(Countdown::from_secs(period.chain_time.until(period.end_time))),
        _ => None,
    }
}

/// A period snapshot with its derived phase and countdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PeriodView {
    pub period: VotingPeriod,
    pub phase: Phase,
    pub remaining: Option<Countdown>,
}

impl PeriodView {
    pub fn of(period: VotingPeriod) -> Self {
        Self {
            period,
            phase: derive_phase(&period),
            remaining: remaining(&period),
        }
    }
}

/// Why a proposed voting window was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProposalError {
    #[error("start time {start} is not in the future (now {now})")]
    StartNotInFuture { start: Timestamp, now: Timestamp },

    #[error("end time {end} must be after start time {start}")]
    EndNotAfterStart { start: Timestamp, end: Timestamp },
}

/// Check a proposed window: the start strictly after `now`, the end strictly
/// after the start.
pub fn validate_proposal(
    start: Timestamp,
    end: Timestamp,
    now: Timestamp,
) -> Result<(), ProposalError> {
    if start <= now {
        return Err(ProposalError::StartNotInFuture { start, now });
    }
    if end <= start {
        return Err(ProposalError::EndNotAfterStart { start, end });
    }
    Ok(())
}
