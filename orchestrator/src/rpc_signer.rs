//! JSON-RPC wallet signer.
//!
//! Talks to a wallet endpoint that holds the user's key (a browser-wallet
//! bridge or a development node with unlocked accounts). `eth_sendTransaction`
//! asks the wallet to sign and broadcast; the receipt is then polled with
//! `eth_getTransactionReceipt` until the ledger reports one.
//!
//! `eth_sendTransaction` carries no total timeout: the wallet holds the
//! request open while the user decides, and only abandonment ends that wait.
//! Receipt polls use `request_timeout` and a failed poll is retried; the
//! overall bound is the caller's.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::Instrument;
use votechain_types::{Receipt, ReceiptStatus, TxHash, UnsignedTransaction};

use crate::tracing_spans::poll_span;
use crate::{Signer, SignerError};

/// JSON-RPC error code wallets use for "user rejected the request".
const USER_REJECTED: i64 = 4001;

/// Connection and polling settings for [`RpcSigner`].
#[derive(Clone, Debug)]
pub struct RpcSignerSettings {
    /// Account to sign with. Falls back to the transaction's `from`.
    pub from: Option<String>,
    /// Delay between receipt lookups.
    pub poll_interval: Duration,
    /// Per-request bound for receipt lookups. Not applied to signing.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for RpcSignerSettings {
    fn default() -> Self {
        Self {
            from: None,
            poll_interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// [`Signer`] backed by a JSON-RPC wallet endpoint.
#[derive(Clone)]
pub struct RpcSigner {
    http: reqwest::Client,
    url: String,
    settings: RpcSignerSettings,
}

impl RpcSigner {
    pub fn new(url: impl Into<String>, settings: RpcSignerSettings) -> Result<Self, SignerError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| SignerError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            settings,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a JSON-RPC request and return the `result` field.
    ///
    /// `timeout` bounds the whole round trip; `None` waits as long as the
    /// wallet keeps the connection open.
    async fn rpc_call(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcFailure> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let mut request = self.http.post(&self.url).json(&body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RpcFailure::Transport(format!(
                "wallet returned HTTP {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| RpcFailure::Transport(format!("invalid JSON response: {e}")))?;

        split_response(json)
    }
}

#[async_trait]
impl Signer for RpcSigner {
    async fn sign_and_broadcast(&self, tx: &UnsignedTransaction) -> Result<TxHash, SignerError> {
        let request = transaction_request(tx, self.settings.from.as_deref());
        let result = self
            .rpc_call("eth_sendTransaction", json!([request]), None)
            .await
            .map_err(RpcFailure::into_submission_error)?;
        let raw = result
            .as_str()
            .ok_or_else(|| SignerError::Broadcast(format!("unexpected hash value: {result}")))?;
        TxHash::parse(raw).map_err(|e| SignerError::Broadcast(e.to_string()))
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<Receipt, SignerError> {
        let mut polls: u64 = 0;
        loop {
            polls += 1;
            let lookup = self
                .rpc_call(
                    "eth_getTransactionReceipt",
                    json!([hash.to_string()]),
                    Some(self.settings.request_timeout),
                )
                .instrument(poll_span("receipt"))
                .await;
            match lookup {
                Ok(result) => {
                    if let Some(receipt) = parse_receipt(&result)? {
                        tracing::debug!(%hash, polls, "receipt found");
                        return Ok(receipt);
                    }
                }
                Err(e) => tracing::warn!(%hash, polls, error = %e, "receipt lookup failed, retrying"),
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

/// Failure of a single JSON-RPC round trip.
#[derive(Debug)]
enum RpcFailure {
    Transport(String),
    Rpc { code: i64, message: String },
}

impl RpcFailure {
    fn into_submission_error(self) -> SignerError {
        match self {
            Self::Transport(msg) => SignerError::Unavailable(msg),
            Self::Rpc { code, message } if code == USER_REJECTED => SignerError::Rejected(message),
            Self::Rpc { code, message } => SignerError::Broadcast(format!("{message} (code {code})")),
        }
    }
}

impl std::fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => f.write_str(msg),
            Self::Rpc { code, message } => write!(f, "{message} (code {code})"),
        }
    }
}

fn split_response(json: Value) -> Result<Value, RpcFailure> {
    if let Some(err) = json.get("error") {
        let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown wallet error")
            .to_string();
        return Err(RpcFailure::Rpc { code, message });
    }
    Ok(json.get("result").cloned().unwrap_or(Value::Null))
}

fn quantity(value: u128) -> String {
    format!("0x{value:x}")
}

fn parse_quantity(raw: &str) -> Option<u64> {
    u64::from_str_radix(raw.strip_prefix("0x")?, 16).ok()
}

/// Render an unsigned transaction as an `eth_sendTransaction` request object.
fn transaction_request(tx: &UnsignedTransaction, from: Option<&str>) -> Value {
    let mut request = json!({
        "to": tx.to,
        "data": tx.data,
        "value": quantity(tx.value),
        "gas": quantity(tx.gas.into()),
        "maxFeePerGas": quantity(tx.max_fee_per_gas),
        "maxPriorityFeePerGas": quantity(tx.max_priority_fee_per_gas),
        "nonce": quantity(tx.nonce.into()),
        "chainId": quantity(tx.chain_id.into()),
    });
    if let Some(from) = from.or(tx.from.as_deref()) {
        request["from"] = json!(from);
    }
    if let Some(kind) = tx.tx_type {
        request["type"] = json!(quantity(kind.into()));
    }
    request
}

/// `Ok(None)` while the transaction is still pending.
fn parse_receipt(result: &Value) -> Result<Option<Receipt>, SignerError> {
    if result.is_null() {
        return Ok(None);
    }
    let block_number = result
        .get("blockNumber")
        .and_then(Value::as_str)
        .and_then(parse_quantity)
        .ok_or_else(|| SignerError::Receipt(format!("receipt without block number: {result}")))?;
    let status = match result.get("status").and_then(Value::as_str) {
        Some("0x1") => ReceiptStatus::Success,
        Some(_) => ReceiptStatus::Failure,
        None => return Err(SignerError::Receipt("receipt without status".into())),
    };
    Ok(Some(Receipt { status, block_number }))
}
