//! Registry client for the election backend.
//!
//! The backend owns candidate and voter data, reports the voting period
//! together with the ledger's current time, and builds unsigned transactions
//! for every mutating action. This crate provides:
//! - The [`Registry`] and [`ContentStore`] collaborator traits
//! - Wire types for the backend's JSON payloads
//! - [`HttpRegistry`] and [`HttpContentStore`], `reqwest`-backed implementations

pub mod content;
pub mod error;
pub mod http;
pub mod wire;

use async_trait::async_trait;
use votechain_types::{
    Address, Candidate, CandidateId, Timestamp, VoterRecord, VotingPeriod,
};

pub use content::{HttpContentStore, ImageUpload};
pub use error::RegistryError;
pub use http::{HttpRegistry, HttpSettings};
pub use wire::{BuiltTransaction, Winner};

/// Read and transaction-building access to the election backend.
///
/// Read methods never mutate anything. `build_*` methods return a payload for
/// the signer; nothing changes on the ledger until that payload is signed,
/// broadcast and confirmed.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Whether `address` holds the admin role.
    async fn is_admin(&self, address: &Address) -> Result<bool, RegistryError>;

    /// Registration and voting status for `address`.
    async fn voter(&self, address: &Address) -> Result<VoterRecord, RegistryError>;

    /// Every registered voter.
    async fn voters(&self) -> Result<Vec<VoterRecord>, RegistryError>;

    async fn voter_count(&self) -> Result<u64, RegistryError>;

    async fn candidates(&self) -> Result<Vec<Candidate>, RegistryError>;

    /// A single candidate, or `None` if the id is unknown.
    async fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RegistryError>;

    async fn candidate_count(&self) -> Result<u64, RegistryError>;

    /// The voting window together with the ledger's current time.
    async fn voting_period(&self) -> Result<VotingPeriod, RegistryError>;

    async fn build_register_voter(&self, voter: &Address) -> Result<BuiltTransaction, RegistryError>;

    /// Remove `voter` from the voter roll. Built on behalf of an admin.
    async fn build_remove_voter(
        &self,
        admin: &Address,
        voter: &Address,
    ) -> Result<BuiltTransaction, RegistryError>;

    /// Grant the admin role. Only the contract owner's transaction lands.
    async fn build_add_admin(
        &self,
        owner: &Address,
        new_admin: &Address,
    ) -> Result<BuiltTransaction, RegistryError>;

    /// Revoke the admin role. Only the contract owner's transaction lands.
    async fn build_remove_admin(
        &self,
        owner: &Address,
        admin: &Address,
    ) -> Result<BuiltTransaction, RegistryError>;

    async fn build_add_candidate(
        &self,
        admin: &Address,
        name: &str,
        image_cid: Option<&str>,
    ) -> Result<BuiltTransaction, RegistryError>;

    async fn build_remove_candidate(
        &self,
        admin: &Address,
        id: CandidateId,
    ) -> Result<BuiltTransaction, RegistryError>;

    async fn build_set_voting_period(
        &self,
        admin: &Address,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<BuiltTransaction, RegistryError>;

    async fn build_stop_voting_period(&self, admin: &Address) -> Result<BuiltTransaction, RegistryError>;

    async fn build_vote(
        &self,
        voter: &Address,
        candidate: CandidateId,
    ) -> Result<BuiltTransaction, RegistryError>;

    /// Ask the backend to compute the winner of an ended election.
    async fn winner(&self, admin: &Address) -> Result<Winner, RegistryError>;
}

/// Upload target for candidate images.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store the file and return its content identifier.
    async fn upload(&self, file: &ImageUpload) -> Result<String, RegistryError>;
}
