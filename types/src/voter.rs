//! Per-identity voter registration record.

use serde::{Deserialize, Serialize};

use crate::{Address, CandidateId};

/// A voter's registration and voting status.
///
/// `has_voted` flips from false to true exactly once and never back;
/// `voted_candidate_id` is set at the same moment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterRecord {
    pub address: Address,
    pub is_registered: bool,
    pub has_voted: bool,
    pub voted_candidate_id: Option<CandidateId>,
}

impl VoterRecord {
    /// Record for an address the registry has never seen.
    pub fn unregistered(address: Address) -> Self {
        Self {
            address,
            is_registered: false,
            has_voted: false,
            voted_candidate_id: None,
        }
    }

    /// Build a record from the registry's raw flags.
    ///
    /// The ledger reports candidate id `0` for voters who have not voted, so
    /// the id is only kept when `has_voted` is set.
    pub fn from_flags(
        address: Address,
        is_registered: bool,
        has_voted: bool,
        raw_candidate_id: Option<CandidateId>,
    ) -> Self {
        Self {
            address,
            is_registered,
            has_voted,
            voted_candidate_id: if has_voted { raw_candidate_id } else { None },
        }
    }

    /// Whether this voter may still cast a vote.
    pub fn can_vote(&self) -> bool {
        self.is_registered && !self.has_voted
    }
}
