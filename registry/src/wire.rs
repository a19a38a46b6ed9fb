//! JSON payloads exchanged with the election backend.

use serde::{Deserialize, Serialize};
use votechain_types::{Address, CandidateId, Timestamp, UnsignedTransaction, VoterRecord};

use crate::RegistryError;

/// Response of the admin check endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminResponse {
    pub is_admin: bool,
}

/// Response of the voter check endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VoterStatusResponse {
    pub is_registered: bool,
    pub has_voted: bool,
    #[serde(default)]
    pub vote_candidate_id: Option<CandidateId>,
}

impl VoterStatusResponse {
    pub fn into_record(self, address: Address) -> VoterRecord {
        VoterRecord::from_flags(
            address,
            self.is_registered,
            self.has_voted,
            self.vote_candidate_id,
        )
    }
}

/// One entry of the voter listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterEntry {
    pub address: String,
    #[serde(default = "default_true")]
    pub is_registered: bool,
    #[serde(default)]
    pub has_voted: bool,
    #[serde(default)]
    pub vote_candidate_id: Option<CandidateId>,
}

fn default_true() -> bool {
    true
}

impl TryFrom<VoterEntry> for VoterRecord {
    type Error = RegistryError;

    fn try_from(entry: VoterEntry) -> Result<Self, Self::Error> {
        let address = Address::parse(&entry.address)
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
        Ok(VoterRecord::from_flags(
            address,
            entry.is_registered,
            entry.has_voted,
            entry.vote_candidate_id,
        ))
    }
}

/// A backend-built transaction together with the backend's status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltTransaction {
    pub message: String,
    #[serde(rename = "tx_hash", alias = "unsignedTransaction")]
    pub transaction: UnsignedTransaction,
}

/// The backend's answer to a winner request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Winner {
    pub name: String,
    pub candidate_id: Option<CandidateId>,
    pub vote_count: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WinnerWire {
    Name(String),
    Detailed {
        #[serde(default)]
        id: Option<CandidateId>,
        name: String,
        #[serde(default, rename = "voteCount")]
        vote_count: Option<u64>,
    },
}

/// Envelope of the winner endpoint: `{"winner": ...}`.
#[derive(Deserialize)]
pub(crate) struct WinnerResponse {
    winner: WinnerWire,
}

impl From<WinnerResponse> for Winner {
    fn from(resp: WinnerResponse) -> Self {
        match resp.winner {
            WinnerWire::Name(name) => Winner {
                name,
                candidate_id: None,
                vote_count: None,
            },
            WinnerWire::Detailed {
                id,
                name,
                vote_count,
            } => Winner {
                name,
                candidate_id: id,
                vote_count,
            },
        }
    }
}

/// Error body returned by the backend: `{"detail": ...}`.
///
/// `detail` is usually a string but some endpoints nest an object with a
/// `message` field.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    detail: serde_json::Value,
}

impl ErrorBody {
    pub(crate) fn render(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(map) => map
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| self.detail.to_string()),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct AddCandidateRequest<'a> {
    pub name: &'a str,
    pub address: &'a str,
    #[serde(rename = "imageCID")]
    pub image_cid: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemoveCandidateRequest<'a> {
    pub address: &'a str,
    pub candidate_id: CandidateId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetVotingPeriodRequest<'a> {
    pub address: &'a str,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemoveVoterRequest<'a> {
    pub address: &'a str,
    pub voter_address: &'a str,
}

#[derive(Serialize)]
pub(crate) struct AddressRequest<'a> {
    pub address: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoteRequest<'a> {
    pub address: &'a str,
    pub candidate_id: CandidateId,
}
