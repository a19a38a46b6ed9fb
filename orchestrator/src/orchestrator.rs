//! Drives transaction attempts through the signer and the ledger.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use votechain_types::{TxHash, UnsignedTransaction};

use crate::tracing_spans::attempt_span;
use crate::{
    AbandonSignal, AttemptEvent, AttemptEventBus, AttemptId, AttemptStatus, Signer, TransactionAttempt,
    TxError,
};

/// Orchestrator tuning.
#[derive(Clone, Copy, Debug)]
pub struct OrchestratorConfig {
    /// Upper bound on the wait for a receipt after broadcast.
    pub confirmation_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(120),
        }
    }
}

/// Successful outcome of an attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub attempt: AttemptId,
    pub hash: TxHash,
    pub block_number: u64,
}

/// Coordinates unsigned transactions through signing, broadcast and
/// confirmation.
///
/// The orchestrator never touches election state. It reports `Confirmed` or
/// a stage-specific [`TxError`]; reconciling local views is the caller's job.
pub struct TransactionOrchestrator {
    signer: Arc<dyn Signer>,
    config: OrchestratorConfig,
    events: AttemptEventBus,
    next_id: AtomicU64,
}

impl TransactionOrchestrator {
    pub fn new(signer: Arc<dyn Signer>, config: OrchestratorConfig) -> Self {
        Self {
            signer,
            config,
            events: AttemptEventBus::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to progress events of every attempt.
    pub fn events(&self) -> &AttemptEventBus {
        &self.events
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one attempt for `unsigned` to a terminal state.
    ///
    /// `abandon` is only honoured while awaiting the signature.
    pub async fn execute(
        &self,
        action: &str,
        unsigned: UnsignedTransaction,
        abandon: AbandonSignal,
    ) -> Result<Confirmation, TxError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let attempt = TransactionAttempt::new(id, action, unsigned);
        self.drive(attempt, abandon)
            .instrument(attempt_span(id, action))
            .await
    }

    async fn drive(
        &self,
        mut attempt: TransactionAttempt,
        mut abandon: AbandonSignal,
    ) -> Result<Confirmation, TxError> {
        self.events.emit(&AttemptEvent::Built {
            id: attempt.id(),
            action: attempt.action().to_string(),
        });

        attempt.advance(AttemptStatus::AwaitingSignature)?;
        self.events.emit(&AttemptEvent::AwaitingSignature {
            id: attempt.id(),
            action: attempt.action().to_string(),
        });
        tracing::info!(nonce = attempt.unsigned().nonce, "awaiting signature");

        let submitted = tokio::select! {
            biased;
            _ = abandon.abandoned() => Err(TxError::SigningRejected {
                reason: "signature request abandoned".into(),
            }),
            result = self.signer.sign_and_broadcast(attempt.unsigned()) => {
                result.map_err(TxError::from_submission)
            }
        };
        let hash = match submitted {
            Ok(hash) => hash,
            Err(err) => return Err(self.fail(&mut attempt, err)),
        };

        attempt.mark_broadcast(hash)?;
        self.events.emit(&AttemptEvent::Broadcast {
            id: attempt.id(),
            action: attempt.action().to_string(),
            hash,
        });
        tracing::info!(%hash, "broadcast, waiting for receipt");

        let waited = self.config.confirmation_timeout;
        let receipt = match tokio::time::timeout(waited, self.signer.wait_for_receipt(&hash)).await {
            Err(_) => Err(TxError::ConfirmationTimeout { hash, waited }),
            Ok(Err(e)) => Err(TxError::ReceiptUnavailable {
                hash,
                reason: e.to_string(),
            }),
            Ok(Ok(receipt)) if !receipt.is_success() => Err(TxError::OnChainFailure {
                hash,
                block_number: receipt.block_number,
            }),
            Ok(Ok(receipt)) => Ok(receipt),
        };
        let receipt = match receipt {
            Ok(receipt) => receipt,
            Err(err) => return Err(self.fail(&mut attempt, err)),
        };

        attempt.advance(AttemptStatus::Confirmed)?;
        self.events.emit(&AttemptEvent::Confirmed {
            id: attempt.id(),
            action: attempt.action().to_string(),
            hash,
            block_number: receipt.block_number,
        });
        tracing::info!(%hash, block = receipt.block_number, "confirmed");

        Ok(Confirmation {
            attempt: attempt.id(),
            hash,
            block_number: receipt.block_number,
        })
    }

    /// Terminate `attempt` as `Failed`, announce it, and hand back the error.
    fn fail(&self, attempt: &mut TransactionAttempt, err: TxError) -> TxError {
        if let Err(transition) = attempt.advance(AttemptStatus::Failed) {
            tracing::error!(%transition, "attempt already terminal");
            return transition;
        }
        tracing::warn!(stage = err.stage().as_str(), error = %err, "attempt failed");
        self.events.emit(&AttemptEvent::Failed {
            id: attempt.id(),
            action: attempt.action().to_string(),
            stage: err.stage(),
            reason: err.to_string(),
        });
        err
    }
}
