//! The wallet/ledger collaborator seam.

use async_trait::async_trait;
use votechain_types::{Receipt, TxHash, UnsignedTransaction};

use crate::SignerError;

/// Turns unsigned transactions into broadcast ones and reports their receipts.
///
/// A single signer is shared process-wide; implementations must tolerate
/// concurrent calls from independent actions.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Ask the wallet to sign and broadcast `tx`.
    ///
    /// May suspend indefinitely while a human reviews the request.
    async fn sign_and_broadcast(&self, tx: &UnsignedTransaction) -> Result<TxHash, SignerError>;

    /// Wait until the ledger reports a terminal receipt for `hash`.
    ///
    /// May suspend arbitrarily long; callers bound it with a timeout.
    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<Receipt, SignerError>;
}
