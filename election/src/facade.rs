//! The election action façade.
//!
//! Every mutating action (voter, admin, candidate, period and vote
//! management) runs the same sequence:
//! 1. take the action's in-flight lock,
//! 2. re-check its preconditions against freshly read state,
//! 3. ask the backend for an unsigned transaction,
//! 4. drive it through the [`TransactionOrchestrator`],
//! 5. refetch the affected state and check the expected change landed.
//!
//! Nothing is ever updated optimistically; callers only see state that was
//! read back after a confirmed receipt.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::Instrument;
use votechain_orchestrator::tracing_spans::action_span;
use votechain_orchestrator::{
    AbandonSignal, ActionLocks, AttemptEventBus, Confirmation, InFlightGuard, RpcSigner,
    TransactionOrchestrator,
};
use votechain_registry::{
    BuiltTransaction, ContentStore, HttpContentStore, HttpRegistry, ImageUpload, Registry, Winner,
};
use votechain_types::{Address, Candidate, CandidateId, Role, Timestamp, VoterRecord};
use votechain_utils::{Clock, SystemClock};

use crate::period::{validate_proposal, PeriodView, Phase};
use crate::polling::PeriodWatch;
use crate::role::{RoleResolution, RoleResolver};
use crate::{ActionOutcome, ClientConfig, ElectionError, Reconciliation, Session, Tally};

/// One in-flight slot per action button.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActionKey {
    RegisterVoter,
    /// Each voter's remove button is independent.
    RemoveVoter(Address),
    AddAdmin,
    RemoveAdmin(Address),
    AddCandidate,
    /// Each candidate's remove button is independent.
    RemoveCandidate(CandidateId),
    SetVotingPeriod,
    StopVotingPeriod,
    CastVote,
    DeclareWinner,
}

impl ActionKey {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterVoter => "register_voter",
            Self::RemoveVoter(_) => "remove_voter",
            Self::AddAdmin => "add_admin",
            Self::RemoveAdmin(_) => "remove_admin",
            Self::AddCandidate => "add_candidate",
            Self::RemoveCandidate(_) => "remove_candidate",
            Self::SetVotingPeriod => "set_voting_period",
            Self::StopVotingPeriod => "stop_voting_period",
            Self::CastVote => "cast_vote",
            Self::DeclareWinner => "declare_winner",
        }
    }
}

/// State refetched after a confirmed vote.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VoteState {
    pub voter: VoterRecord,
    pub candidates: Vec<Candidate>,
}

/// Result of declaring the winner.
#[derive(Clone, Debug, PartialEq)]
pub struct WinnerOutcome {
    pub winner: Winner,
    /// The stop attempt that had to run first, if the period was still active.
    pub stopped: Option<ActionOutcome<PeriodView>>,
}

/// Registered voter and candidate totals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ElectionCounts {
    pub candidates: u64,
    pub voters: u64,
}

/// Everything a dashboard shows, read in one go.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElectionSnapshot {
    pub identity: Option<Address>,
    pub role: Option<Role>,
    pub voter: Option<VoterRecord>,
    pub period: PeriodView,
    pub candidates: Vec<Candidate>,
}

/// User-facing election actions for one session.
pub struct ElectionClient {
    registry: Arc<dyn Registry>,
    content: Arc<dyn ContentStore>,
    orchestrator: Arc<TransactionOrchestrator>,
    clock: Arc<dyn Clock>,
    resolver: RoleResolver,
    locks: ActionLocks<ActionKey>,
    session: Mutex<Session>,
}

impl ElectionClient {
    pub fn new(
        registry: Arc<dyn Registry>,
        content: Arc<dyn ContentStore>,
        orchestrator: Arc<TransactionOrchestrator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            resolver: RoleResolver::new(Arc::clone(&registry)),
            registry,
            content,
            orchestrator,
            clock,
            locks: ActionLocks::new(),
            session: Mutex::new(Session::new()),
        }
    }

    /// Wire HTTP collaborators from `config` and connect its identity, if any.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ElectionError> {
        let http = config.http_settings();
        let registry = HttpRegistry::new(&config.backend_url, &http)?;
        let content = HttpContentStore::new(&config.content_store_url, &http)?;
        let signer = RpcSigner::new(
            &config.signer_url,
            config.signer_settings(config.identity.as_deref()),
        )
        .map_err(|e| ElectionError::Config(e.to_string()))?;
        let orchestrator = TransactionOrchestrator::new(Arc::new(signer), config.orchestrator_config());

        let client = Self::new(
            Arc::new(registry),
            Arc::new(content),
            Arc::new(orchestrator),
            Arc::new(SystemClock),
        );
        if let Some(identity) = &config.identity {
            client.connect(identity)?;
        }
        Ok(client)
    }

    // ── Session ─────────────────────────────────────────────────────────

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Connect an identity; switching resets every derived value.
    pub fn connect(&self, address: &str) -> Result<Address, ElectionError> {
        self.session().connect(address)
    }

    pub fn disconnect(&self) {
        self.session().disconnect();
    }

    pub fn identity(&self) -> Option<Address> {
        self.session().identity().cloned()
    }

    /// The last role resolved for the current identity.
    pub fn cached_role(&self) -> Option<Role> {
        self.session().role()
    }

    fn remember(&self, generation: u64, resolution: &RoleResolution) {
        let mut session = self.session();
        session.record_role(generation, resolution.role);
        if let Some(voter) = &resolution.voter {
            session.record_voter(generation, voter.clone());
        }
    }

    // ── Collaborators ───────────────────────────────────────────────────

    /// Attempt progress for every action.
    pub fn events(&self) -> &AttemptEventBus {
        self.orchestrator.events()
    }

    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }

    /// Start the period poller and countdown ticker.
    pub fn watch_period(&self, refresh: Duration, tick: Duration) -> PeriodWatch {
        PeriodWatch::start(Arc::clone(&self.registry), refresh, tick)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Re-resolve the connected identity's role.
    ///
    /// Read failures yield [`Role::Unregistered`], as [`RoleResolver::resolve`] does.
    pub async fn refresh_role(&self) -> Result<Role, ElectionError> {
        let (identity, generation) = self.session().require("refresh_role")?;
        let resolution = self.resolver.resolve_with_record(&identity).await;
        self.remember(generation, &resolution);
        Ok(resolution.role)
    }

    pub async fn voter_record(&self) -> Result<VoterRecord, ElectionError> {
        let (identity, generation) = self.session().require("voter_record")?;
        let record = self.registry.voter(&identity).await?;
        self.session().record_voter(generation, record.clone());
        Ok(record)
    }

    pub async fn voters(&self) -> Result<Vec<VoterRecord>, ElectionError> {
        Ok(self.registry.voters().await?)
    }

    pub async fn candidates(&self) -> Result<Vec<Candidate>, ElectionError> {
        Ok(self.registry.candidates().await?)
    }

    pub async fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, ElectionError> {
        Ok(self.registry.candidate(id).await?)
    }

    pub async fn counts(&self) -> Result<ElectionCounts, ElectionError> {
        let (candidates, voters) =
            tokio::join!(self.registry.candidate_count(), self.registry.voter_count());
        Ok(ElectionCounts {
            candidates: candidates?,
            voters: voters?,
        })
    }

    pub async fn period(&self) -> Result<PeriodView, ElectionError> {
        Ok(PeriodView::of(self.registry.voting_period().await?))
    }

    pub async fn tally(&self) -> Result<Tally, ElectionError> {
        Ok(Tally::from_candidates(self.registry.candidates().await?))
    }

    /// Re-read role, period and candidates together.
    pub async fn snapshot(&self) -> Result<ElectionSnapshot, ElectionError> {
        let connected = {
            let session = self.session();
            session
                .identity()
                .cloned()
                .map(|identity| (identity, session.generation()))
        };
        let resolution = async {
            match &connected {
                Some((identity, _)) => Some(self.resolver.resolve_with_record(identity).await),
                None => None,
            }
        };
        let (period, candidates, resolution) =
            tokio::join!(self.registry.voting_period(), self.registry.candidates(), resolution);

        if let (Some(resolution), Some((_, generation))) = (&resolution, &connected) {
            self.remember(*generation, resolution);
        }

        Ok(ElectionSnapshot {
            identity: connected.map(|(identity, _)| identity),
            role: resolution.as_ref().map(|r| r.role),
            voter: resolution.and_then(|r| r.voter),
            period: PeriodView::of(period?),
            candidates: candidates?,
        })
    }

    // ── Action plumbing ─────────────────────────────────────────────────

    fn acquire(&self, key: &ActionKey) -> Result<InFlightGuard<ActionKey>, ElectionError> {
        self.locks
            .try_acquire(key.clone())
            .ok_or(ElectionError::ActionInFlight(key.name()))
    }

    /// Whether an attempt for `key` is in flight.
    pub fn is_in_flight(&self, key: &ActionKey) -> bool {
        self.locks.is_held(key)
    }

    /// Validate an address the action targets.
    fn target(action: &'static str, raw: &str) -> Result<Address, ElectionError> {
        Address::parse(raw).map_err(|e| ElectionError::precondition(action, e.to_string()))
    }

    async fn require_admin(&self, action: &'static str, identity: &Address) -> Result<(), ElectionError> {
        if !self.registry.is_admin(identity).await? {
            return Err(ElectionError::precondition(action, "admin role required"));
        }
        Ok(())
    }

    async fn submit(
        &self,
        action: &'static str,
        built: BuiltTransaction,
        abandon: AbandonSignal,
    ) -> Result<Confirmation, ElectionError> {
        tracing::debug!(message = %built.message, "backend built transaction");
        Ok(self.orchestrator.execute(action, built.transaction, abandon).await?)
    }

    // ── Actions ─────────────────────────────────────────────────────────

    /// Register the connected identity as a voter.
    pub async fn register_voter(&self, abandon: AbandonSignal) -> Result<ActionOutcome<Role>, ElectionError> {
        let key = ActionKey::RegisterVoter;
        let (identity, generation) = self.session().require(key.name())?;
        let _guard = self.acquire(&key)?;
        self.run_register_voter(&identity, generation, abandon)
            .instrument(action_span(key.name(), identity.as_str()))
            .await
    }

    async fn run_register_voter(
        &self,
        identity: &Address,
        generation: u64,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Role>, ElectionError> {
        let action = ActionKey::RegisterVoter.name();
        let current = self.resolver.try_resolve(identity).await?;
        if !current.role.can_register() {
            return Err(ElectionError::precondition(
                action,
                format!("identity is already registered as {}", current.role),
            ));
        }

        let built = self.registry.build_register_voter(identity).await?;
        let confirmation = self.submit(action, built, abandon).await?;

        let reconciliation = match self.resolver.try_resolve(identity).await {
            Ok(resolution) => {
                self.remember(generation, &resolution);
                let role = resolution.role;
                Reconciliation::check(role, role == Role::Voter, "voter registration")
            }
            Err(e) => Reconciliation::failed(e),
        };
        Ok(ActionOutcome {
            confirmation,
            reconciliation,
        })
    }

    /// Remove `voter` from the voter roll.
    pub async fn remove_voter(
        &self,
        voter: &str,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Vec<VoterRecord>>, ElectionError> {
        let voter = Self::target("remove_voter", voter)?;
        let key = ActionKey::RemoveVoter(voter.clone());
        let (identity, _) = self.session().require(key.name())?;
        let _guard = self.acquire(&key)?;
        self.run_remove_voter(&identity, &voter, abandon)
            .instrument(action_span(key.name(), identity.as_str()))
            .await
    }

    async fn run_remove_voter(
        &self,
        identity: &Address,
        voter: &Address,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Vec<VoterRecord>>, ElectionError> {
        let action = "remove_voter";
        self.require_admin(action, identity).await?;
        if !self.registry.voter(voter).await?.is_registered {
            return Err(ElectionError::precondition(
                action,
                format!("{voter} is not a registered voter"),
            ));
        }

        let built = self.registry.build_remove_voter(identity, voter).await?;
        let confirmation = self.submit(action, built, abandon).await?;

        let reconciliation = match self.registry.voters().await {
            Ok(voters) => {
                let gone = !voters.iter().any(|v| &v.address == voter && v.is_registered);
                Reconciliation::check(voters, gone, format!("removal of voter {voter}"))
            }
            Err(e) => Reconciliation::failed(e),
        };
        Ok(ActionOutcome {
            confirmation,
            reconciliation,
        })
    }

    /// Grant the admin role to `new_admin`.
    ///
    /// Any admin may request the transaction; the contract only lets the
    /// owner's land.
    pub async fn add_admin(
        &self,
        new_admin: &str,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Role>, ElectionError> {
        let key = ActionKey::AddAdmin;
        let new_admin = Self::target(key.name(), new_admin)?;
        let (identity, _) = self.session().require(key.name())?;
        let _guard = self.acquire(&key)?;
        self.run_add_admin(&identity, &new_admin, abandon)
            .instrument(action_span(key.name(), identity.as_str()))
            .await
    }

    async fn run_add_admin(
        &self,
        identity: &Address,
        new_admin: &Address,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Role>, ElectionError> {
        let action = ActionKey::AddAdmin.name();
        self.require_admin(action, identity).await?;
        if self.registry.is_admin(new_admin).await? {
            return Err(ElectionError::precondition(action, format!("{new_admin} is already an admin")));
        }

        let built = self.registry.build_add_admin(identity, new_admin).await?;
        let confirmation = self.submit(action, built, abandon).await?;

        let reconciliation = match self.resolver.try_resolve(new_admin).await {
            Ok(resolution) => {
                let role = resolution.role;
                Reconciliation::check(role, role == Role::Admin, format!("admin role for {new_admin}"))
            }
            Err(e) => Reconciliation::failed(e),
        };
        Ok(ActionOutcome {
            confirmation,
            reconciliation,
        })
    }

    /// Revoke `admin`'s admin role. An identity cannot revoke its own.
    pub async fn remove_admin(
        &self,
        admin: &str,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Role>, ElectionError> {
        let admin = Self::target("remove_admin", admin)?;
        let key = ActionKey::RemoveAdmin(admin.clone());
        let (identity, _) = self.session().require(key.name())?;
        if identity == admin {
            return Err(ElectionError::precondition(key.name(), "cannot remove your own admin role"));
        }
        let _guard = self.acquire(&key)?;
        self.run_remove_admin(&identity, &admin, abandon)
            .instrument(action_span(key.name(), identity.as_str()))
            .await
    }

    async fn run_remove_admin(
        &self,
        identity: &Address,
        admin: &Address,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Role>, ElectionError> {
        let action = "remove_admin";
        self.require_admin(action, identity).await?;
        if !self.registry.is_admin(admin).await? {
            return Err(ElectionError::precondition(action, format!("{admin} is not an admin")));
        }

        let built = self.registry.build_remove_admin(identity, admin).await?;
        let confirmation = self.submit(action, built, abandon).await?;

        let reconciliation = match self.resolver.try_resolve(admin).await {
            Ok(resolution) => {
                let role = resolution.role;
                Reconciliation::check(role, role != Role::Admin, format!("revoked admin role for {admin}"))
            }
            Err(e) => Reconciliation::failed(e),
        };
        Ok(ActionOutcome {
            confirmation,
            reconciliation,
        })
    }

    /// Add a candidate, uploading `image` first if given.
    pub async fn add_candidate(
        &self,
        name: &str,
        image: Option<ImageUpload>,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Vec<Candidate>>, ElectionError> {
        let key = ActionKey::AddCandidate;
        let (identity, _) = self.session().require(key.name())?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ElectionError::precondition(key.name(), "candidate name must not be empty"));
        }
        let _guard = self.acquire(&key)?;
        self.run_add_candidate(&identity, name, image, abandon)
            .instrument(action_span(key.name(), identity.as_str()))
            .await
    }

    async fn run_add_candidate(
        &self,
        identity: &Address,
        name: &str,
        image: Option<ImageUpload>,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Vec<Candidate>>, ElectionError> {
        let action = ActionKey::AddCandidate.name();
        self.require_admin(action, identity).await?;
        let before = self.registry.candidates().await?.len();

        let image_cid = match image {
            Some(file) => {
                let cid = self
                    .content
                    .upload(&file)
                    .await
                    .map_err(ElectionError::UploadFailed)?;
                tracing::info!(%cid, file = %file.file_name, "candidate image uploaded");
                Some(cid)
            }
            None => None,
        };

        let built = self
            .registry
            .build_add_candidate(identity, name, image_cid.as_deref())
            .await?;
        let confirmation = self.submit(action, built, abandon).await?;

        let reconciliation = match self.registry.candidates().await {
            Ok(candidates) => {
                let added = candidates.len() > before && candidates.iter().any(|c| c.name == name);
                Reconciliation::check(candidates, added, format!("candidate {name:?}"))
            }
            Err(e) => Reconciliation::failed(e),
        };
        Ok(ActionOutcome {
            confirmation,
            reconciliation,
        })
    }

    pub async fn remove_candidate(
        &self,
        id: CandidateId,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Vec<Candidate>>, ElectionError> {
        let key = ActionKey::RemoveCandidate(id);
        let (identity, _) = self.session().require(key.name())?;
        let _guard = self.acquire(&key)?;
        self.run_remove_candidate(&identity, id, abandon)
            .instrument(action_span(key.name(), identity.as_str()))
            .await
    }

    async fn run_remove_candidate(
        &self,
        identity: &Address,
        id: CandidateId,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<Vec<Candidate>>, ElectionError> {
        let action = ActionKey::RemoveCandidate(id).name();
        self.require_admin(action, identity).await?;
        if self.registry.candidate(id).await?.is_none() {
            return Err(ElectionError::precondition(action, format!("candidate {id} does not exist")));
        }

        let built = self.registry.build_remove_candidate(identity, id).await?;
        let confirmation = self.submit(action, built, abandon).await?;

        let reconciliation = match self.registry.candidates().await {
            Ok(candidates) => {
                let gone = candidates.iter().all(|c| c.id != id);
                Reconciliation::check(candidates, gone, format!("removal of candidate {id}"))
            }
            Err(e) => Reconciliation::failed(e),
        };
        Ok(ActionOutcome {
            confirmation,
            reconciliation,
        })
    }

    /// Schedule the voting window.
    ///
    /// The window is checked against the local clock before anything is
    /// sent, then again against ledger time.
    pub async fn set_voting_period(
        &self,
        start: Timestamp,
        end: Timestamp,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<PeriodView>, ElectionError> {
        let key = ActionKey::SetVotingPeriod;
        let (identity, _) = self.session().require(key.name())?;
        validate_proposal(start, end, self.clock.now())
            .map_err(|e| ElectionError::precondition(key.name(), e.to_string()))?;
        let _guard = self.acquire(&key)?;
        self.run_set_voting_period(&identity, start, end, abandon)
            .instrument(action_span(key.name(), identity.as_str()))
            .await
    }

    async fn run_set_voting_period(
        &self,
        identity: &Address,
        start: Timestamp,
        end: Timestamp,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<PeriodView>, ElectionError> {
        let action = ActionKey::SetVotingPeriod.name();
        self.require_admin(action, identity).await?;
        let current = self.period().await?;
        if current.phase == Phase::Active {
            return Err(ElectionError::precondition(action, "voting period is active"));
        }
        validate_proposal(start, end, current.period.chain_time)
            .map_err(|e| ElectionError::precondition(action, e.to_string()))?;

        let built = self.registry.build_set_voting_period(identity, start, end).await?;
        let confirmation = self.submit(action, built, abandon).await?;

        let reconciliation = match self.period().await {
            Ok(view) => {
                let p = view.period;
                let applied = p.is_set && p.start_time == start && p.end_time == end;
                Reconciliation::check(view, applied, format!("voting period {start}..{end}"))
            }
            Err(e) => Reconciliation::failed(e),
        };
        Ok(ActionOutcome {
            confirmation,
            reconciliation,
        })
    }

    /// End an active voting period at the current ledger time.
    pub async fn stop_voting_period(
        &self,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<PeriodView>, ElectionError> {
        let key = ActionKey::StopVotingPeriod;
        let (identity, _) = self.session().require(key.name())?;
        self.stop_period(&identity, abandon)
            .instrument(action_span(key.name(), identity.as_str()))
            .await
    }

    async fn stop_period(
        &self,
        identity: &Address,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<PeriodView>, ElectionError> {
        let key = ActionKey::StopVotingPeriod;
        let action = key.name();
        let _guard = self.acquire(&key)?;
        self.require_admin(action, identity).await?;
        let current = self.period().await?;
        if current.phase != Phase::Active {
            return Err(ElectionError::precondition(
                action,
                format!("voting period is {}, not active", current.phase),
            ));
        }

        let built = self.registry.build_stop_voting_period(identity).await?;
        let confirmation = self.submit(action, built, abandon).await?;

        let reconciliation = match self.period().await {
            Ok(view) => {
                let ended = view.phase == Phase::Ended;
                Reconciliation::check(view, ended, "ended voting period")
            }
            Err(e) => Reconciliation::failed(e),
        };
        Ok(ActionOutcome {
            confirmation,
            reconciliation,
        })
    }

    /// Cast the connected voter's single vote.
    pub async fn cast_vote(
        &self,
        candidate: CandidateId,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<VoteState>, ElectionError> {
        let key = ActionKey::CastVote;
        let (identity, generation) = self.session().require(key.name())?;
        let _guard = self.acquire(&key)?;
        self.run_cast_vote(&identity, generation, candidate, abandon)
            .instrument(action_span(key.name(), identity.as_str()))
            .await
    }

    async fn run_cast_vote(
        &self,
        identity: &Address,
        generation: u64,
        candidate: CandidateId,
        abandon: AbandonSignal,
    ) -> Result<ActionOutcome<VoteState>, ElectionError> {
        let action = ActionKey::CastVote.name();
        let resolution = self.resolver.try_resolve(identity).await?;
        self.remember(generation, &resolution);
        let voter = match (resolution.role, resolution.voter) {
            (Role::Voter, Some(voter)) => voter,
            (role, _) => {
                return Err(ElectionError::precondition(
                    action,
                    format!("only registered voters can vote (identity is {role})"),
                ))
            }
        };
        if voter.has_voted {
            let choice = voter
                .voted_candidate_id
                .map(|id| format!(" for candidate {id}"))
                .unwrap_or_default();
            return Err(ElectionError::precondition(action, format!("already voted{choice}")));
        }
        let period = self.period().await?;
        if period.phase != Phase::Active {
            return Err(ElectionError::precondition(
                action,
                format!("voting period is {}, not active", period.phase),
            ));
        }
        if self.registry.candidate(candidate).await?.is_none() {
            return Err(ElectionError::precondition(
                action,
                format!("candidate {candidate} does not exist"),
            ));
        }

        let built = self.registry.build_vote(identity, candidate).await?;
        let confirmation = self.submit(action, built, abandon).await?;

        let (voter, candidates) =
            tokio::join!(self.registry.voter(identity), self.registry.candidates());
        let reconciliation = match (voter, candidates) {
            (Ok(voter), Ok(candidates)) => {
                self.session().record_voter(generation, voter.clone());
                let recorded = voter.has_voted && voter.voted_candidate_id == Some(candidate);
                Reconciliation::check(
                    VoteState { voter, candidates },
                    recorded,
                    format!("vote for candidate {candidate}"),
                )
            }
            (Err(e), _) | (_, Err(e)) => Reconciliation::failed(e),
        };
        Ok(ActionOutcome {
            confirmation,
            reconciliation,
        })
    }

    /// Ask the backend for the winner, stopping an active period first.
    pub async fn declare_winner(&self, abandon: AbandonSignal) -> Result<WinnerOutcome, ElectionError> {
        let key = ActionKey::DeclareWinner;
        let (identity, _) = self.session().require(key.name())?;
        let _guard = self.acquire(&key)?;
        self.run_declare_winner(&identity, abandon)
            .instrument(action_span(key.name(), identity.as_str()))
            .await
    }

    async fn run_declare_winner(
        &self,
        identity: &Address,
        abandon: AbandonSignal,
    ) -> Result<WinnerOutcome, ElectionError> {
        let action = ActionKey::DeclareWinner.name();
        self.require_admin(action, identity).await?;
        let current = self.period().await?;

        let stopped = match current.phase {
            Phase::Ended => None,
            Phase::Active => {
                tracing::info!("voting period still active on-chain, stopping it first");
                let outcome = self.stop_period(identity, abandon).await.map_err(|e| {
                    ElectionError::PrerequisiteFailed {
                        prerequisite: ActionKey::StopVotingPeriod.name(),
                        source: Box::new(e),
                    }
                })?;
                Some(outcome)
            }
            phase => {
                return Err(ElectionError::precondition(
                    action,
                    format!("voting period is {phase}, nothing to declare"),
                ))
            }
        };

        let winner = self.registry.winner(identity).await?;
        tracing::info!(winner = %winner.name, "winner declared");
        Ok(WinnerOutcome { winner, stopped })
    }
}
