//! Transaction orchestrator for the votechain election client.
//!
//! Every state-changing election action follows the same protocol:
//! the backend builds an unsigned transaction, the wallet signs and
//! broadcasts it, the ledger confirms it, and only then is local state
//! re-read. This crate owns the middle of that protocol:
//! - [`TransactionAttempt`]: the strictly ordered attempt state machine
//! - [`TransactionOrchestrator`]: drives an attempt through the [`Signer`]
//! - [`AttemptEventBus`]: fan-out of attempt progress to any UI layer
//! - [`ActionLocks`]: at most one attempt in flight per action
//! - [`AbandonHandle`]: user cancellation while awaiting a signature
//! - [`RpcSigner`]: JSON-RPC wallet signer

pub mod attempt;
pub mod cancel;
pub mod error;
pub mod events;
pub mod lock;
pub mod orchestrator;
pub mod rpc_signer;
pub mod signer;
pub mod tracing_spans;

pub use attempt::{AttemptId, AttemptStatus, TransactionAttempt};
pub use cancel::{abandon_pair, AbandonHandle, AbandonSignal};
pub use error::{SignerError, TxError, TxStage};
pub use events::{AttemptEvent, AttemptEventBus};
pub use lock::{ActionLocks, InFlightGuard};
pub use orchestrator::{Confirmation, OrchestratorConfig, TransactionOrchestrator};
pub use rpc_signer::{RpcSigner, RpcSignerSettings};
pub use signer::Signer;
