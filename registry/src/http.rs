//! `reqwest`-backed registry client for the election backend's REST API.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use votechain_types::{
    Address, Candidate, CandidateId, Timestamp, VoterRecord, VotingPeriod,
};

use crate::wire::{
    AddCandidateRequest, AddressRequest, AdminResponse, ErrorBody, RemoveCandidateRequest,
    RemoveVoterRequest, SetVotingPeriodRequest, VoteRequest, VoterEntry, VoterStatusResponse, WinnerResponse,
};
use crate::{BuiltTransaction, Registry, RegistryError, Winner};

/// Timeouts applied to every backend request.
#[derive(Clone, Copy, Debug)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the election backend.
///
/// Wraps `reqwest::Client` with the backend's base URL and provides typed
/// methods for each endpoint the client needs.
#[derive(Clone)]
pub struct HttpRegistry {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRegistry {
    /// Create a client targeting the given base URL (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>, settings: &HttpSettings) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| RegistryError::Client(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The configured backend URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RegistryError> {
        tracing::debug!(path, "registry GET");
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| RegistryError::Unavailable(format!("GET {path}: {e}")))?;
        decode(response).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, RegistryError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(%method, path, "registry request");
        let response = self
            .http
            .request(method.clone(), self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| RegistryError::Unavailable(format!("{method} {path}: {e}")))?;
        decode(response).await
    }

    /// Request whose parameters travel in the query string.
    async fn send_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RegistryError> {
        tracing::debug!(%method, path, "registry request");
        let response = self
            .http
            .request(method.clone(), self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| RegistryError::Unavailable(format!("{method} {path}: {e}")))?;
        decode(response).await
    }
}

/// Map a backend response to either the decoded payload or a structured error.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RegistryError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.render(),
            Err(_) if text.is_empty() => status.to_string(),
            Err(_) => text,
        };
        return Err(RegistryError::Rejected {
            status: status.as_u16(),
            detail,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| RegistryError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn is_admin(&self, address: &Address) -> Result<bool, RegistryError> {
        let resp: AdminResponse = self.get(&format!("/admins/check/{address}")).await?;
        Ok(resp.is_admin)
    }

    async fn voter(&self, address: &Address) -> Result<VoterRecord, RegistryError> {
        let resp: VoterStatusResponse = self.get(&format!("/voters/check/{address}")).await?;
        Ok(resp.into_record(address.clone()))
    }

    async fn voters(&self) -> Result<Vec<VoterRecord>, RegistryError> {
        let entries: Vec<VoterEntry> = self.get("/voters").await?;
        entries.into_iter().map(VoterRecord::try_from).collect()
    }

    async fn voter_count(&self) -> Result<u64, RegistryError> {
        self.get("/voters_count").await
    }

    async fn candidates(&self) -> Result<Vec<Candidate>, RegistryError> {
        self.get("/candidates").await
    }

    async fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RegistryError> {
        match self.get::<Candidate>(&format!("/candidates/{id}")).await {
            Ok(candidate) => Ok(Some(candidate)),
            Err(RegistryError::Rejected { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn candidate_count(&self) -> Result<u64, RegistryError> {
        self.get("/candidates_count").await
    }

    async fn voting_period(&self) -> Result<VotingPeriod, RegistryError> {
        let period: VotingPeriod = self.get("/voting-period").await?;
        period
            .validate()
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
        Ok(period)
    }

    async fn build_register_voter(&self, voter: &Address) -> Result<BuiltTransaction, RegistryError> {
        self.send_query(Method::POST, "/voters/register", &[("address", voter.as_str())])
            .await
    }

    async fn build_remove_voter(
        &self,
        admin: &Address,
        voter: &Address,
    ) -> Result<BuiltTransaction, RegistryError> {
        let body = RemoveVoterRequest {
            address: admin.as_str(),
            voter_address: voter.as_str(),
        };
        self.send(Method::DELETE, &format!("/voters/{voter}"), &body)
            .await
    }

    async fn build_add_admin(
        &self,
        owner: &Address,
        new_admin: &Address,
    ) -> Result<BuiltTransaction, RegistryError> {
        let query = [
            ("owner_address", owner.as_str()),
            ("new_admin_address", new_admin.as_str()),
        ];
        self.send_query(Method::POST, "/admins", &query).await
    }

    async fn build_remove_admin(
        &self,
        owner: &Address,
        admin: &Address,
    ) -> Result<BuiltTransaction, RegistryError> {
        self.send_query(
            Method::DELETE,
            &format!("/admins/{admin}"),
            &[("owner_address", owner.as_str())],
        )
        .await
    }

    async fn build_add_candidate(
        &self,
        admin: &Address,
        name: &str,
        image_cid: Option<&str>,
    ) -> Result<BuiltTransaction, RegistryError> {
        let body = AddCandidateRequest {
            name,
            address: admin.as_str(),
            image_cid: image_cid.unwrap_or_default(),
        };
        self.send(Method::POST, "/candidates", &body).await
    }

    async fn build_remove_candidate(
        &self,
        admin: &Address,
        id: CandidateId,
    ) -> Result<BuiltTransaction, RegistryError> {
        let body = RemoveCandidateRequest {
            address: admin.as_str(),
            candidate_id: id,
        };
        self.send(Method::DELETE, &format!("/candidates/{id}"), &body)
            .await
    }

    async fn build_set_voting_period(
        &self,
        admin: &Address,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<BuiltTransaction, RegistryError> {
        let body = SetVotingPeriodRequest {
            address: admin.as_str(),
            start_time: start,
            end_time: end,
        };
        self.send(Method::POST, "/voters/set-voting-period", &body)
            .await
    }

    async fn build_stop_voting_period(&self, admin: &Address) -> Result<BuiltTransaction, RegistryError> {
        let body = AddressRequest {
            address: admin.as_str(),
        };
        self.send(Method::POST, "/admins/stop-voting-period", &body)
            .await
    }

    async fn build_vote(
        &self,
        voter: &Address,
        candidate: CandidateId,
    ) -> Result<BuiltTransaction, RegistryError> {
        let body = VoteRequest {
            address: voter.as_str(),
            candidate_id: candidate,
        };
        self.send(Method::POST, "/voters/vote", &body).await
    }

    async fn winner(&self, admin: &Address) -> Result<Winner, RegistryError> {
        let body = AddressRequest {
            address: admin.as_str(),
        };
        let resp: WinnerResponse = self.send(Method::POST, "/admins/winner", &body).await?;
        Ok(resp.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let registry = HttpRegistry::new("http://localhost:8000/", &HttpSettings::default()).unwrap();
        assert_eq!(registry.base_url(), "http://localhost:8000");
        assert_eq!(registry.url("/candidates"), "http://localhost:8000/candidates");
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        let settings = HttpSettings {
            request_timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_millis(200),
        };
        let registry = HttpRegistry::new("http://127.0.0.1:1", &settings).unwrap();
        let err = registry.candidates().await.unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable(_)));
        assert!(err.is_transient());
    }
}
