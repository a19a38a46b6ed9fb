//! Fundamental types for the votechain election client.
//!
//! This crate defines the data model shared across every other crate in the
//! workspace: identities, timestamps, transaction hashes, roles, candidates,
//! voter records, voting periods and the opaque unsigned transaction payload.

pub mod address;
pub mod candidate;
pub mod error;
pub mod hash;
pub mod period;
pub mod role;
pub mod time;
pub mod transaction;
pub mod voter;

pub use address::Address;
pub use candidate::{Candidate, CandidateId};
pub use error::TypesError;
pub use hash::TxHash;
pub use period::VotingPeriod;
pub use role::Role;
pub use time::Timestamp;
pub use transaction::{Receipt, ReceiptStatus, UnsignedTransaction};
pub use voter::VoterRecord;
