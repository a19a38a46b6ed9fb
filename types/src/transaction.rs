//! Backend-built unsigned transactions and the ledger's terminal receipts.

use serde::{Deserialize, Serialize};

/// A ledger mutation prepared by the backend but not yet authorised by the
/// user's key.
///
/// The client never interprets these fields; they are handed to the signer
/// unchanged. Fee values are in the ledger's smallest unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    pub to: String,
    pub data: String,
    #[serde(default)]
    pub value: u128,
    pub gas: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub nonce: u64,
    pub chain_id: u64,
    /// Sender account, when the backend includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Envelope type (2 for EIP-1559 style fee markets).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<u8>,
}

/// Terminal status reported by the ledger for a broadcast transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Failure,
}

/// The ledger's terminal report for a broadcast transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub status: ReceiptStatus,
    pub block_number: u64,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}
