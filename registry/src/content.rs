//! Candidate image upload to the content store.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::http::HttpSettings;
use crate::{ContentStore, RegistryError};

/// An image selected for a new candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(alias = "IpfsHash")]
    cid: String,
}

/// Uploads files as `multipart/form-data` to an `/upload` endpoint that
/// answers with `{"cid": ...}`.
#[derive(Clone)]
pub struct HttpContentStore {
    http: reqwest::Client,
    upload_url: String,
}

impl HttpContentStore {
    pub fn new(base_url: &str, settings: &HttpSettings) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| RegistryError::Client(e.to_string()))?;
        Ok(Self {
            http,
            upload_url: format!("{}/upload", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn upload(&self, file: &ImageUpload) -> Result<String, RegistryError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| RegistryError::Client(format!("invalid content type: {e}")))?;
        let form = Form::new().part("file", part);

        tracing::debug!(file = %file.file_name, size = file.bytes.len(), "uploading image");
        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RegistryError::Unavailable(format!("upload: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RegistryError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(format!("upload response: {e}")))?;
        if body.cid.trim().is_empty() {
            return Err(RegistryError::InvalidResponse("empty content id".into()));
        }
        Ok(body.cid)
    }
}
