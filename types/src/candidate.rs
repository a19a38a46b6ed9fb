//! Election candidates as reported by the registry.

use serde::{Deserialize, Deserializer, Serialize};

/// Backend-assigned candidate identifier.
pub type CandidateId = u64;

/// A candidate standing in the election.
///
/// `vote_count` only ever grows, and only through confirmed vote transactions;
/// the client never adjusts it locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    #[serde(default)]
    pub vote_count: u64,
    /// Content-store identifier of the candidate's image, if one was uploaded.
    #[serde(
        rename = "imageCID",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_cid: Option<String>,
}

impl Candidate {
    pub fn new(id: CandidateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            vote_count: 0,
            image_cid: None,
        }
    }

    pub fn with_image(mut self, cid: impl Into<String>) -> Self {
        self.image_cid = Some(cid.into());
        self
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_shape() {
        let json = r#"{"id":2,"name":"Alice","voteCount":7,"imageCID":"bafy123"}"#;
        let c: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(c.id, 2);
        assert_eq!(c.vote_count, 7);
        assert_eq!(c.image_cid.as_deref(), Some("bafy123"));
    }

    #[test]
    fn empty_image_is_none() {
        let json = r#"{"id":0,"name":"Bob","voteCount":0,"imageCID":""}"#;
        let c: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(c.image_cid, None);
    }

    #[test]
    fn missing_image_is_none() {
        let json = r#"{"id":0,"name":"Bob","voteCount":3}"#;
        let c: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(c.image_cid, None);
    }
}
