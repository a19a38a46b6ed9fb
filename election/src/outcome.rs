//! Results of confirmed election actions.

use votechain_orchestrator::Confirmation;

/// How local state was brought up to date after a confirmed transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum Reconciliation<T> {
    /// Refetched, and the expected change is visible.
    Fresh(T),
    /// Refetched, but the expected change is not visible yet. The backend may
    /// lag the ledger, or the contract accepted the call without effect.
    Unverified { state: T, expected: String },
    /// The refetch itself failed. The transaction is still confirmed; the
    /// caller should offer a manual refresh.
    Failed { reason: String },
}

impl<T> Reconciliation<T> {
    /// Classify refetched state by whether `expected` holds.
    pub(crate) fn check(state: T, holds: bool, expected: impl Into<String>) -> Self {
        if holds {
            Self::Fresh(state)
        } else {
            let expected = expected.into();
            tracing::warn!(%expected, "confirmed change not visible after refetch");
            Self::Unverified { state, expected }
        }
    }

    pub(crate) fn failed(reason: impl ToString) -> Self {
        let reason = reason.to_string();
        tracing::warn!(%reason, "reconciliation refetch failed");
        Self::Failed { reason }
    }

    pub fn state(&self) -> Option<&T> {
        match self {
            Self::Fresh(state) | Self::Unverified { state, .. } => Some(state),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    /// A non-fatal warning to show next to the success message.
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Fresh(_) => None,
            Self::Unverified { expected, .. } => {
                Some(format!("confirmed, but {expected} is not visible yet; refresh later"))
            }
            Self::Failed { reason } => Some(format!("confirmed, but refresh failed: {reason}")),
        }
    }
}

/// A confirmed action together with the refetched state it affected.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionOutcome<T> {
    pub confirmation: Confirmation,
    pub reconciliation: Reconciliation<T>,
}

impl<T> ActionOutcome<T> {
    pub fn state(&self) -> Option<&T> {
        self.reconciliation.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_classifies_by_postcondition() {
        assert!(Reconciliation::check(1, true, "x").is_fresh());
        let unverified = Reconciliation::check(1, false, "vote recorded");
        assert_eq!(unverified.state(), Some(&1));
        assert!(unverified.warning().unwrap().contains("vote recorded"));
    }

    #[test]
    fn failed_has_no_state() {
        let failed: Reconciliation<u8> = Reconciliation::failed("timeout");
        assert_eq!(failed.state(), None);
        assert!(failed.warning().is_some());
    }
}
