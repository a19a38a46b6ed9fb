//! The transaction attempt state machine.
//!
//! ```text
//! Built → AwaitingSignature → Broadcast → Confirmed
//!   │            │               │
//!   └────────────┴───────────────┴──────→ Failed
//! ```
//!
//! Transitions only move forward; terminal states accept nothing.

use std::fmt;
use votechain_types::{TxHash, UnsignedTransaction};

use crate::TxError;

/// Process-unique identifier of an attempt, for correlating events and logs.
pub type AttemptId = u64;

/// Lifecycle status of a [`TransactionAttempt`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttemptStatus {
    /// Unsigned transaction received from the backend; nothing mutated.
    Built,
    /// Submitted to the signer, waiting on human approval.
    AwaitingSignature,
    /// Broadcast with a known hash; waiting for a receipt.
    Broadcast,
    /// Receipt reported success.
    Confirmed,
    /// Terminated without a successful receipt.
    Failed,
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    /// Whether an attempt in this status blocks re-invocation of its action.
    pub fn is_in_flight(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: AttemptStatus) -> bool {
        use AttemptStatus::*;
        matches!(
            (self, next),
            (Built, AwaitingSignature)
                | (Built, Failed)
                | (AwaitingSignature, Broadcast)
                | (AwaitingSignature, Failed)
                | (Broadcast, Confirmed)
                | (Broadcast, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Built => "built",
            Self::AwaitingSignature => "awaiting_signature",
            Self::Broadcast => "broadcast",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pass of one unsigned transaction through signing and confirmation.
///
/// Owned by the orchestrator for the duration of a single user action and
/// dropped once terminal; a retry always starts a new attempt with a freshly
/// built transaction.
#[derive(Debug)]
pub struct TransactionAttempt {
    id: AttemptId,
    action: String,
    unsigned: UnsignedTransaction,
    hash: Option<TxHash>,
    status: AttemptStatus,
}

impl TransactionAttempt {
    pub fn new(id: AttemptId, action: impl Into<String>, unsigned: UnsignedTransaction) -> Self {
        Self {
            id,
            action: action.into(),
            unsigned,
            hash: None,
            status: AttemptStatus::Built,
        }
    }

    pub fn id(&self) -> AttemptId {
        self.id
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    pub fn hash(&self) -> Option<TxHash> {
        self.hash
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    /// Move to `next`, rejecting skips, reversals and exits from terminal states.
    pub fn advance(&mut self, next: AttemptStatus) -> Result<(), TxError> {
        if !self.status.can_advance_to(next) {
            return Err(TxError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Record the signer's hash and enter `Broadcast`.
    pub fn mark_broadcast(&mut self, hash: TxHash) -> Result<(), TxError> {
        self.advance(AttemptStatus::Broadcast)?;
        self.hash = Some(hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsigned() -> UnsignedTransaction {
        UnsignedTransaction {
            to: "0x2222222222222222222222222222222222222222".into(),
            data: "0x".into(),
            value: 0,
            gas: 21_000,
            max_fee_per_gas: 10,
            max_priority_fee_per_gas: 1,
            nonce: 0,
            chain_id: 31337,
            from: None,
            tx_type: Some(2),
        }
    }

    #[test]
    fn happy_path_in_order() {
        let mut attempt = TransactionAttempt::new(1, "cast_vote", unsigned());
        assert_eq!(attempt.status(), AttemptStatus::Built);
        attempt.advance(AttemptStatus::AwaitingSignature).unwrap();
        attempt.mark_broadcast(TxHash::new([9; 32])).unwrap();
        attempt.advance(AttemptStatus::Confirmed).unwrap();
        assert_eq!(attempt.hash(), Some(TxHash::new([9; 32])));
        assert!(attempt.status().is_terminal());
    }

    #[test]
    fn cannot_skip_signature() {
        let mut attempt = TransactionAttempt::new(1, "cast_vote", unsigned());
        let err = attempt.mark_broadcast(TxHash::new([9; 32])).unwrap_err();
        assert!(matches!(err, TxError::InvalidTransition { .. }));
        assert_eq!(attempt.hash(), None);
    }

    #[test]
    fn cannot_confirm_before_broadcast() {
        let mut attempt = TransactionAttempt::new(1, "cast_vote", unsigned());
        attempt.advance(AttemptStatus::AwaitingSignature).unwrap();
        assert!(attempt.advance(AttemptStatus::Confirmed).is_err());
    }

    #[test]
    fn terminal_states_are_final() {
        let mut attempt = TransactionAttempt::new(1, "cast_vote", unsigned());
        attempt.advance(AttemptStatus::Failed).unwrap();
        assert!(attempt.advance(AttemptStatus::AwaitingSignature).is_err());
        assert!(attempt.advance(AttemptStatus::Failed).is_err());
    }

    #[test]
    fn no_going_backward() {
        let mut attempt = TransactionAttempt::new(1, "cast_vote", unsigned());
        attempt.advance(AttemptStatus::AwaitingSignature).unwrap();
        assert!(attempt.advance(AttemptStatus::Built).is_err());
    }

    #[test]
    fn in_flight_covers_non_terminal_states() {
        assert!(AttemptStatus::Built.is_in_flight());
        assert!(AttemptStatus::AwaitingSignature.is_in_flight());
        assert!(AttemptStatus::Broadcast.is_in_flight());
        assert!(!AttemptStatus::Confirmed.is_in_flight());
        assert!(!AttemptStatus::Failed.is_in_flight());
    }
}
