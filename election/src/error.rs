//! Election action errors.

use thiserror::Error;
use votechain_orchestrator::TxError;
use votechain_registry::RegistryError;

/// Why an election action did not complete.
///
/// `PreconditionFailed`, `BackendUnavailable`, `ActionInFlight` and
/// `UploadFailed` are raised before any transaction attempt exists.
/// `Transaction` names the stage at which an attempt failed.
#[derive(Debug, Error)]
pub enum ElectionError {
    #[error("{action}: {reason}")]
    PreconditionFailed { action: &'static str, reason: String },

    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] RegistryError),

    /// Another attempt for the same action is still in flight.
    #[error("{0} is already in progress")]
    ActionInFlight(&'static str),

    #[error("image upload failed: {0}")]
    UploadFailed(#[source] RegistryError),

    #[error(transparent)]
    Transaction(#[from] TxError),

    /// A transaction this action depends on did not complete.
    #[error("{prerequisite} did not complete: {source}")]
    PrerequisiteFailed {
        prerequisite: &'static str,
        #[source]
        source: Box<ElectionError>,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl ElectionError {
    pub(crate) fn precondition(action: &'static str, reason: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            action,
            reason: reason.into(),
        }
    }

    /// Whether a transaction may have been broadcast and still land.
    pub fn may_have_landed(&self) -> bool {
        match self {
            Self::Transaction(tx) => tx.may_have_landed(),
            Self::PrerequisiteFailed { source, .. } => source.may_have_landed(),
            _ => false,
        }
    }

    /// Whether no transaction attempt was ever started.
    pub fn is_pre_attempt(&self) -> bool {
        matches!(
            self,
            Self::PreconditionFailed { .. }
                | Self::BackendUnavailable(_)
                | Self::ActionInFlight(_)
                | Self::UploadFailed(_)
                | Self::Config(_)
        )
    }
}
