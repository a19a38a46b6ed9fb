//! Nullable registry: an in-memory election backend and ledger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use votechain_registry::{BuiltTransaction, Registry, RegistryError, Winner};
use votechain_types::{
    Address, Candidate, CandidateId, Timestamp, UnsignedTransaction, VoterRecord, VotingPeriod,
};
use votechain_utils::Clock;

use crate::NullClock;

const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
const CHAIN_ID: u64 = 31337;

/// The state change a built transaction asks the ledger to make.
///
/// Serialized into the transaction's `data` field so [`NullRegistry::apply`]
/// can replay it once the signer confirms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    RegisterVoter { voter: Address },
    RemoveVoter { voter: Address },
    AddAdmin { admin: Address },
    RemoveAdmin { admin: Address },
    AddCandidate { name: String, image_cid: Option<String> },
    RemoveCandidate { id: CandidateId },
    SetVotingPeriod { start: Timestamp, end: Timestamp },
    StopVotingPeriod,
    Vote { voter: Address, candidate: CandidateId },
}

#[derive(Clone, Debug)]
enum Injected {
    Unavailable(String),
    Rejected { status: u16, detail: String },
}

impl Injected {
    fn to_error(&self) -> RegistryError {
        match self {
            Self::Unavailable(reason) => RegistryError::Unavailable(reason.clone()),
            Self::Rejected { status, detail } => RegistryError::Rejected {
                status: *status,
                detail: detail.clone(),
            },
        }
    }
}

#[derive(Default)]
struct Election {
    owner: Option<Address>,
    admins: HashSet<Address>,
    voters: BTreeMap<Address, VoterRecord>,
    candidates: BTreeMap<CandidateId, Candidate>,
    next_candidate_id: CandidateId,
    period: Option<(Timestamp, Timestamp)>,
    nonce: u64,
}

/// An in-memory backend for testing.
///
/// Thread-safe for use with tokio's multi-threaded runtime. Ledger time comes
/// from a shared [`NullClock`].
pub struct NullRegistry {
    clock: Arc<NullClock>,
    state: Mutex<Election>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, Injected>>,
    frozen: Mutex<bool>,
}

impl NullRegistry {
    pub fn new(clock: Arc<NullClock>) -> Self {
        Self {
            clock,
            state: Mutex::new(Election {
                next_candidate_id: 1,
                ..Election::default()
            }),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            frozen: Mutex::new(false),
        }
    }

    pub fn clock(&self) -> &Arc<NullClock> {
        &self.clock
    }

    // ── Seeding ─────────────────────────────────────────────────────────

    pub fn add_admin(&self, address: &Address) {
        self.state.lock().unwrap().admins.insert(address.clone());
    }

    /// Make `address` the contract owner and an admin. Only the owner's
    /// admin-management transactions land.
    pub fn set_owner(&self, address: &Address) {
        let mut state = self.state.lock().unwrap();
        state.owner = Some(address.clone());
        state.admins.insert(address.clone());
    }

    pub fn add_voter(&self, address: &Address) {
        self.state.lock().unwrap().voters.insert(
            address.clone(),
            VoterRecord::from_flags(address.clone(), true, false, None),
        );
    }

    /// Register a candidate directly, returning its id.
    pub fn add_candidate(&self, name: &str) -> CandidateId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_candidate_id;
        state.next_candidate_id += 1;
        state.candidates.insert(id, Candidate::new(id, name));
        id
    }

    /// Record a vote directly, bypassing period checks.
    pub fn add_vote(&self, voter: &Address, candidate: CandidateId) {
        let mut state = self.state.lock().unwrap();
        if let Some(c) = state.candidates.get_mut(&candidate) {
            c.vote_count += 1;
        }
        state.voters.insert(
            voter.clone(),
            VoterRecord::from_flags(voter.clone(), true, true, Some(candidate)),
        );
    }

    pub fn set_period(&self, start: Timestamp, end: Timestamp) {
        self.state.lock().unwrap().period = Some((start, end));
    }

    // ── Failure injection ───────────────────────────────────────────────

    /// Make `method` fail as if the backend were unreachable.
    pub fn fail(&self, method: &'static str, reason: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(method, Injected::Unavailable(reason.to_string()));
    }

    /// Make `method` answer with an HTTP error and `detail`.
    pub fn reject(&self, method: &'static str, status: u16, detail: &str) {
        self.failures.lock().unwrap().insert(
            method,
            Injected::Rejected {
                status,
                detail: detail.to_string(),
            },
        );
    }

    pub fn heal(&self, method: &'static str) {
        self.failures.lock().unwrap().remove(method);
    }

    /// Accept confirmed transactions without changing state, as if the
    /// ledger silently ignored them or the backend lagged behind it.
    pub fn freeze(&self, frozen: bool) {
        *self.frozen.lock().unwrap() = frozen;
    }

    // ── Assertions ──────────────────────────────────────────────────────

    /// Number of calls made to `method`.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|m| **m == method).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of unsigned transactions built so far.
    pub fn builds(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.starts_with("build_"))
            .count()
    }

    // ── Ledger ──────────────────────────────────────────────────────────

    /// Apply a confirmed transaction. Returns `false` when the ledger would
    /// revert it.
    pub fn apply(&self, tx: &UnsignedTransaction) -> bool {
        let Ok(mutation) = serde_json::from_str::<Mutation>(&tx.data) else {
            return false;
        };
        let now = self.clock.now();
        let sender = tx.from.as_deref().and_then(|from| Address::parse(from).ok());
        let mut state = self.state.lock().unwrap();
        let active = matches!(state.period, Some((s, e)) if now >= s && now < e);
        let from_owner = sender.is_some() && sender == state.owner;
        let accepted = match &mutation {
            Mutation::RegisterVoter { voter } => !state.voters.contains_key(voter),
            Mutation::RemoveVoter { voter } => state.voters.contains_key(voter),
            Mutation::AddAdmin { admin } => from_owner && !state.admins.contains(admin),
            Mutation::RemoveAdmin { admin } => {
                from_owner && state.admins.contains(admin) && state.owner.as_ref() != Some(admin)
            }
            Mutation::AddCandidate { name, .. } => !name.is_empty(),
            Mutation::RemoveCandidate { id } => state.candidates.contains_key(id),
            Mutation::SetVotingPeriod { start, end } => !active && start < end,
            Mutation::StopVotingPeriod => active,
            Mutation::Vote { voter, candidate } => {
                active
                    && state.candidates.contains_key(candidate)
                    && state.voters.get(voter).is_some_and(VoterRecord::can_vote)
            }
        };
        if !accepted || *self.frozen.lock().unwrap() {
            return accepted;
        }

        match mutation {
            Mutation::RegisterVoter { voter } => {
                let record = VoterRecord::from_flags(voter.clone(), true, false, None);
                state.voters.insert(voter, record);
            }
            Mutation::RemoveVoter { voter } => {
                state.voters.remove(&voter);
            }
            Mutation::AddAdmin { admin } => {
                state.admins.insert(admin);
            }
            Mutation::RemoveAdmin { admin } => {
                state.admins.remove(&admin);
            }
            Mutation::AddCandidate { name, image_cid } => {
                let id = state.next_candidate_id;
                state.next_candidate_id += 1;
                let mut candidate = Candidate::new(id, name);
                candidate.image_cid = image_cid;
                state.candidates.insert(id, candidate);
            }
            Mutation::RemoveCandidate { id } => {
                state.candidates.remove(&id);
            }
            Mutation::SetVotingPeriod { start, end } => state.period = Some((start, end)),
            Mutation::StopVotingPeriod => {
                if let Some((start, _)) = state.period {
                    state.period = Some((start, now));
                }
            }
            Mutation::Vote { voter, candidate } => {
                if let Some(c) = state.candidates.get_mut(&candidate) {
                    c.vote_count += 1;
                }
                let record = VoterRecord::from_flags(voter.clone(), true, true, Some(candidate));
                state.voters.insert(voter, record);
            }
        }
        true
    }

    fn enter(&self, method: &'static str) -> Result<(), RegistryError> {
        self.calls.lock().unwrap().push(method);
        match self.failures.lock().unwrap().get(method) {
            Some(injected) => Err(injected.to_error()),
            None => Ok(()),
        }
    }

    fn build(
        &self,
        method: &'static str,
        from: &Address,
        mutation: Mutation,
    ) -> Result<BuiltTransaction, RegistryError> {
        self.enter(method)?;
        let data = serde_json::to_string(&mutation)
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
        let mut state = self.state.lock().unwrap();
        state.nonce += 1;
        Ok(BuiltTransaction {
            message: format!("{method} transaction built"),
            transaction: UnsignedTransaction {
                to: CONTRACT.to_string(),
                data,
                value: 0,
                gas: 200_000,
                max_fee_per_gas: 2_000_000_000,
                max_priority_fee_per_gas: 1_000_000_000,
                nonce: state.nonce,
                chain_id: CHAIN_ID,
                from: Some(from.to_string()),
                tx_type: Some(2),
            },
        })
    }
}

#[async_trait]
impl Registry for NullRegistry {
    async fn is_admin(&self, address: &Address) -> Result<bool, RegistryError> {
        self.enter("is_admin")?;
        Ok(self.state.lock().unwrap().admins.contains(address))
    }

    async fn voter(&self, address: &Address) -> Result<VoterRecord, RegistryError> {
        self.enter("voter")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .voters
            .get(address)
            .cloned()
            .unwrap_or_else(|| VoterRecord::unregistered(address.clone())))
    }

    async fn voters(&self) -> Result<Vec<VoterRecord>, RegistryError> {
        self.enter("voters")?;
        Ok(self.state.lock().unwrap().voters.values().cloned().collect())
    }

    async fn voter_count(&self) -> Result<u64, RegistryError> {
        self.enter("voter_count")?;
        Ok(self.state.lock().unwrap().voters.len() as u64)
    }

    async fn candidates(&self) -> Result<Vec<Candidate>, RegistryError> {
        self.enter("candidates")?;
        Ok(self.state.lock().unwrap().candidates.values().cloned().collect())
    }

    async fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RegistryError> {
        self.enter("candidate")?;
        Ok(self.state.lock().unwrap().candidates.get(&id).cloned())
    }

    async fn candidate_count(&self) -> Result<u64, RegistryError> {
        self.enter("candidate_count")?;
        Ok(self.state.lock().unwrap().candidates.len() as u64)
    }

    async fn voting_period(&self) -> Result<VotingPeriod, RegistryError> {
        self.enter("voting_period")?;
        let now = self.clock.now();
        match self.state.lock().unwrap().period {
            Some((start, end)) => VotingPeriod::new(start, end, now)
                .map_err(|e| RegistryError::InvalidResponse(e.to_string())),
            None => Ok(VotingPeriod::unset(now)),
        }
    }

    async fn build_register_voter(&self, voter: &Address) -> Result<BuiltTransaction, RegistryError> {
        self.build(
            "build_register_voter",
            voter,
            Mutation::RegisterVoter {
                voter: voter.clone(),
            },
        )
    }

    async fn build_remove_voter(
        &self,
        admin: &Address,
        voter: &Address,
    ) -> Result<BuiltTransaction, RegistryError> {
        self.build(
            "build_remove_voter",
            admin,
            Mutation::RemoveVoter {
                voter: voter.clone(),
            },
        )
    }

    async fn build_add_admin(
        &self,
        owner: &Address,
        new_admin: &Address,
    ) -> Result<BuiltTransaction, RegistryError> {
        self.build(
            "build_add_admin",
            owner,
            Mutation::AddAdmin {
                admin: new_admin.clone(),
            },
        )
    }

    async fn build_remove_admin(
        &self,
        owner: &Address,
        admin: &Address,
    ) -> Result<BuiltTransaction, RegistryError> {
        self.build(
            "build_remove_admin",
            owner,
            Mutation::RemoveAdmin {
                admin: admin.clone(),
            },
        )
    }

    async fn build_add_candidate(
        &self,
        admin: &Address,
        name: &str,
        image_cid: Option<&str>,
    ) -> Result<BuiltTransaction, RegistryError> {
        self.build(
            "build_add_candidate",
            admin,
            Mutation::AddCandidate {
                name: name.to_string(),
                image_cid: image_cid.map(str::to_string),
            },
        )
    }

    async fn build_remove_candidate(
        &self,
        admin: &Address,
        id: CandidateId,
    ) -> Result<BuiltTransaction, RegistryError> {
        self.build("build_remove_candidate", admin, Mutation::RemoveCandidate { id })
    }

    async fn build_set_voting_period(
        &self,
        admin: &Address,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<BuiltTransaction, RegistryError> {
        self.build(
            "build_set_voting_period",
            admin,
            Mutation::SetVotingPeriod { start, end },
        )
    }

    async fn build_stop_voting_period(&self, admin: &Address) -> Result<BuiltTransaction, RegistryError> {
        self.build("build_stop_voting_period", admin, Mutation::StopVotingPeriod)
    }

    async fn build_vote(
        &self,
        voter: &Address,
        candidate: CandidateId,
    ) -> Result<BuiltTransaction, RegistryError> {
        self.build(
            "build_vote",
            voter,
            Mutation::Vote {
                voter: voter.clone(),
                candidate,
            },
        )
    }

    async fn winner(&self, admin: &Address) -> Result<Winner, RegistryError> {
        self.enter("winner")?;
        let now = self.clock.now();
        let state = self.state.lock().unwrap();
        if !state.admins.contains(admin) {
            return Err(RegistryError::Rejected {
                status: 403,
                detail: "Only admin can declare the winner".into(),
            });
        }
        if !matches!(state.period, Some((_, end)) if now >= end) {
            return Err(RegistryError::Rejected {
                status: 400,
                detail: "Voting period has not ended".into(),
            });
        }
        // Ties go to the lowest id.
        let leader = state
            .candidates
            .values()
            .fold(None::<&Candidate>, |best, c| match best {
                Some(b) if b.vote_count >= c.vote_count => Some(b),
                _ => Some(c),
            })
            .ok_or_else(|| RegistryError::Rejected {
                status: 404,
                detail: "No candidates".into(),
            })?;
        Ok(Winner {
            name: leader.name.clone(),
            candidate_id: Some(leader.id),
            vote_count: Some(leader.vote_count),
        })
    }
}
