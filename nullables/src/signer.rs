//! Nullable signer: a scripted wallet and ledger for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;
use votechain_orchestrator::{Signer, SignerError};
use votechain_types::{Receipt, ReceiptStatus, TxHash, UnsignedTransaction};

/// How the signer handles the next submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignerBehavior {
    /// Sign, broadcast, and confirm (subject to the confirm hook).
    Approve,
    /// The user declines to sign.
    Reject,
    /// No wallet is connected.
    Unavailable,
    /// Signed, but the ledger refuses the broadcast.
    RefuseBroadcast,
    /// Broadcast, then the receipt reports failure.
    Revert,
    /// Broadcast, but no receipt ever arrives.
    NeverConfirm,
    /// Wait at the signature prompt until [`NullSigner::release`].
    HoldSignature,
    /// Broadcast, then wait for the receipt until [`NullSigner::release`].
    HoldReceipt,
}

type ConfirmHook = Box<dyn Fn(&UnsignedTransaction) -> bool + Send + Sync>;

/// A deterministic signer.
///
/// Behaviours are consumed one per submission; once the script runs out
/// every submission is approved. Hashes and block numbers count up from 1.
pub struct NullSigner {
    script: Mutex<VecDeque<SignerBehavior>>,
    submitted: Mutex<Vec<UnsignedTransaction>>,
    pending: Mutex<Vec<(TxHash, UnsignedTransaction, SignerBehavior)>>,
    on_confirm: Mutex<Option<ConfirmHook>>,
    release: Notify,
    prompted: Notify,
    block: Mutex<u64>,
}

impl NullSigner {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            on_confirm: Mutex::new(None),
            release: Notify::new(),
            prompted: Notify::new(),
            block: Mutex::new(0),
        }
    }

    /// Queue the behaviour for the next unscripted submission.
    pub fn push(&self, behavior: SignerBehavior) {
        self.script.lock().unwrap().push_back(behavior);
    }

    /// Called with each transaction whose receipt is about to succeed. Return
    /// `false` to turn the receipt into a failure.
    pub fn on_confirm(&self, hook: impl Fn(&UnsignedTransaction) -> bool + Send + Sync + 'static) {
        *self.on_confirm.lock().unwrap() = Some(Box::new(hook));
    }

    /// Let one held signature or receipt proceed.
    pub fn release(&self) {
        self.release.notify_one();
    }

    /// Resolve once a submission has reached the signer.
    pub async fn prompted(&self) {
        self.prompted.notified().await;
    }

    /// Every transaction handed to the signer, in order.
    pub fn submitted(&self) -> Vec<UnsignedTransaction> {
        self.submitted.lock().unwrap().clone()
    }

    fn next_behavior(&self) -> SignerBehavior {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SignerBehavior::Approve)
    }
}

impl Default for NullSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Signer for NullSigner {
    async fn sign_and_broadcast(&self, tx: &UnsignedTransaction) -> Result<TxHash, SignerError> {
        let behavior = self.next_behavior();
        let index = {
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(tx.clone());
            submitted.len()
        };
        self.prompted.notify_one();

        match behavior {
            SignerBehavior::Reject => return Err(SignerError::Rejected("user denied".into())),
            SignerBehavior::Unavailable => {
                return Err(SignerError::Unavailable("no wallet connected".into()))
            }
            SignerBehavior::RefuseBroadcast => {
                return Err(SignerError::Broadcast("nonce too low".into()))
            }
            SignerBehavior::HoldSignature => self.release.notified().await,
            _ => {}
        }

        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&(index as u64).to_be_bytes());
        let hash = TxHash::new(bytes);
        self.pending.lock().unwrap().push((hash, tx.clone(), behavior));
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<Receipt, SignerError> {
        let found = self
            .pending
            .lock()
            .unwrap()
            .iter()
            .find(|(h, _, _)| h == hash)
            .cloned();
        let Some((_, tx, behavior)) = found else {
            return Err(SignerError::Receipt(format!("unknown transaction {hash}")));
        };

        match behavior {
            SignerBehavior::NeverConfirm => std::future::pending::<()>().await,
            SignerBehavior::HoldReceipt => self.release.notified().await,
            _ => {}
        }

        let block_number = {
            let mut block = self.block.lock().unwrap();
            *block += 1;
            *block
        };
        let landed = behavior != SignerBehavior::Revert
            && self
                .on_confirm
                .lock()
                .unwrap()
                .as_ref()
                .map_or(true, |hook| hook(&tx));
        let status = if landed {
            ReceiptStatus::Success
        } else {
            ReceiptStatus::Failure
        };
        Ok(Receipt { status, block_number })
    }
}
