//! Election client for the votechain backend.
//!
//! Ties the registry, the transaction orchestrator and the connected
//! identity together into the actions an admin or voter can take:
//! - [`RoleResolver`]: admin / voter / unregistered, fail-closed
//! - [`period`]: pure phase and countdown derivation
//! - [`ElectionClient`]: precondition checks, transaction attempts and
//!   refetch-after-confirm for every action
//! - [`polling`]: period refresh and countdown loops
//! - [`ClientConfig`]: TOML configuration

pub mod config;
pub mod error;
pub mod facade;
pub mod outcome;
pub mod period;
pub mod polling;
pub mod role;
pub mod session;
pub mod tally;

pub use config::ClientConfig;
pub use error::ElectionError;
pub use facade::{
    ActionKey, ElectionClient, ElectionCounts, ElectionSnapshot, VoteState, WinnerOutcome,
};
pub use outcome::{ActionOutcome, Reconciliation};
pub use period::{derive_phase, remaining, validate_proposal, Countdown, PeriodView, Phase, ProposalError};
pub use polling::{CountdownTicker, PeriodPoller, PeriodSnapshot, PeriodWatch, PollerHandle};
pub use role::{RoleResolution, RoleResolver};
pub use session::Session;
pub use tally::{Tally, TallyEntry};
