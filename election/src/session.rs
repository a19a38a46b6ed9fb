//! The connected identity and the state derived from it.

use votechain_types::{Address, Role, VoterRecord};

use crate::ElectionError;

/// Identity session.
///
/// Holds at most one connected address. Connecting, switching or
/// disconnecting bumps the generation and clears every derived value, so a
/// lookup that finishes after a switch cannot attach to the new identity.
#[derive(Debug, Default)]
pub struct Session {
    identity: Option<Address>,
    generation: u64,
    role: Option<Role>,
    voter: Option<VoterRecord>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect `raw`, replacing any previous identity.
    ///
    /// Reconnecting the same address keeps the derived state.
    pub fn connect(&mut self, raw: &str) -> Result<Address, ElectionError> {
        let address = Address::parse(raw)
            .map_err(|e| ElectionError::precondition("connect", e.to_string()))?;
        if self.identity.as_ref() != Some(&address) {
            tracing::info!(identity = %address, "identity connected");
            self.reset();
            self.identity = Some(address.clone());
        }
        Ok(address)
    }

    pub fn disconnect(&mut self) {
        if let Some(identity) = self.identity.take() {
            tracing::info!(%identity, "identity disconnected");
        }
        self.reset();
    }

    pub fn identity(&self) -> Option<&Address> {
        self.identity.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The connected identity and current generation, or `PreconditionFailed`.
    pub fn require(&self, action: &'static str) -> Result<(Address, u64), ElectionError> {
        self.identity
            .clone()
            .map(|identity| (identity, self.generation))
            .ok_or_else(|| ElectionError::precondition(action, "no identity connected"))
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn voter(&self) -> Option<&VoterRecord> {
        self.voter.as_ref()
    }

    /// Store a role read during `generation`. Stale reads are dropped.
    pub fn record_role(&mut self, generation: u64, role: Role) -> bool {
        if generation != self.generation {
            return false;
        }
        self.role = Some(role);
        true
    }

    /// Store a voter record read during `generation`. Stale reads are dropped.
    pub fn record_voter(&mut self, generation: u64, voter: VoterRecord) -> bool {
        if generation != self.generation || self.identity.as_ref() != Some(&voter.address) {
            return false;
        }
        self.voter = Some(voter);
        true
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.role = None;
        self.voter = None;
    }
}
