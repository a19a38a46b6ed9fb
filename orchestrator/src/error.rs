//! Signer and transaction-stage errors.

use std::time::Duration;
use thiserror::Error;
use votechain_types::TxHash;

use crate::attempt::AttemptStatus;

/// Failures reported by the wallet/ledger collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// The human declined to sign.
    #[error("signature rejected: {0}")]
    Rejected(String),

    /// No wallet connection, or the wallet endpoint could not be reached.
    #[error("wallet unavailable: {0}")]
    Unavailable(String),

    /// The wallet signed but the ledger refused the submission.
    #[error("broadcast failed: {0}")]
    Broadcast(String),

    /// Receipt lookup failed.
    #[error("receipt lookup failed: {0}")]
    Receipt(String),
}

/// Stage at which a transaction attempt terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxStage {
    /// Nothing reached the ledger.
    Signing,
    /// The ledger refused the signed transaction.
    Broadcast,
    /// The transaction was broadcast; its outcome is unknown or failed on-chain.
    Confirmation,
}

impl TxStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signing => "signing",
            Self::Broadcast => "broadcast",
            Self::Confirmation => "confirmation",
        }
    }
}

/// Why a transaction attempt ended in `Failed`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("signing rejected: {reason}")]
    SigningRejected { reason: String },

    #[error("wallet unavailable: {reason}")]
    WalletUnavailable { reason: String },

    #[error("broadcast failed: {reason}")]
    BroadcastFailed { reason: String },

    #[error("no receipt for {hash} within {waited:?}")]
    ConfirmationTimeout { hash: TxHash, waited: Duration },

    #[error("receipt for {hash} unavailable: {reason}")]
    ReceiptUnavailable { hash: TxHash, reason: String },

    #[error("transaction {hash} failed on-chain in block {block_number}")]
    OnChainFailure { hash: TxHash, block_number: u64 },

    #[error("invalid attempt transition {from:?} -> {to:?}")]
    InvalidTransition { from: AttemptStatus, to: AttemptStatus },
}

impl TxError {
    /// Map a failure of the sign-and-broadcast call.
    pub fn from_submission(err: SignerError) -> Self {
        match err {
            SignerError::Rejected(reason) => Self::SigningRejected { reason },
            SignerError::Unavailable(reason) => Self::WalletUnavailable { reason },
            SignerError::Broadcast(reason) | SignerError::Receipt(reason) => {
                Self::BroadcastFailed { reason }
            }
        }
    }

    pub fn stage(&self) -> TxStage {
        match self {
            Self::SigningRejected { .. }
            | Self::WalletUnavailable { .. }
            | Self::InvalidTransition { .. } => TxStage::Signing,
            Self::BroadcastFailed { .. } => TxStage::Broadcast,
            Self::ConfirmationTimeout { .. }
            | Self::ReceiptUnavailable { .. }
            | Self::OnChainFailure { .. } => TxStage::Confirmation,
        }
    }

    /// Whether the mutation might still take effect on the ledger.
    ///
    /// True only when a transaction was broadcast and its outcome is unknown.
    pub fn may_have_landed(&self) -> bool {
        matches!(
            self,
            Self::ConfirmationTimeout { .. } | Self::ReceiptUnavailable { .. }
        )
    }

    /// The broadcast hash, if the attempt got that far.
    pub fn hash(&self) -> Option<TxHash> {
        match self {
            Self::ConfirmationTimeout { hash, .. }
            | Self::ReceiptUnavailable { hash, .. }
            | Self::OnChainFailure { hash, .. } => Some(*hash),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_errors_map_to_signing_and_broadcast_stages() {
        let rejected = TxError::from_submission(SignerError::Rejected("user denied".into()));
        assert_eq!(rejected.stage(), TxStage::Signing);
        assert!(!rejected.may_have_landed());

        let refused = TxError::from_submission(SignerError::Broadcast("nonce too low".into()));
        assert_eq!(refused.stage(), TxStage::Broadcast);
        assert!(!refused.may_have_landed());
    }

    #[test]
    fn timeout_may_have_landed() {
        let err = TxError::ConfirmationTimeout {
            hash: TxHash::new([1; 32]),
            waited: Duration::from_secs(120),
        };
        assert_eq!(err.stage(), TxStage::Confirmation);
        assert!(err.may_have_landed());
        assert_eq!(err.hash(), Some(TxHash::new([1; 32])));
    }

    #[test]
    fn on_chain_failure_did_not_land() {
        let err = TxError::OnChainFailure {
            hash: TxHash::new([2; 32]),
            block_number: 7,
        };
        assert!(!err.may_have_landed());
    }
}
