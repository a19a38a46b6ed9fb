//! Registry client errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The backend could not be reached or the request timed out.
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with an error status and a human-readable detail.
    #[error("registry rejected request (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The backend answered but the payload did not match the expected shape.
    #[error("invalid registry response: {0}")]
    InvalidResponse(String),

    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl RegistryError {
    /// The backend's own explanation, when it gave one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// Whether the failure is on the transport side rather than a refusal.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
            || matches!(self, Self::Rejected { status, .. } if *status >= 500)
    }
}
