//! Nullable content store: records uploads, hands out predictable ids.

use async_trait::async_trait;
use std::sync::Mutex;
use votechain_registry::{ContentStore, ImageUpload, RegistryError};

/// An in-memory content store.
pub struct NullContentStore {
    uploads: Mutex<Vec<ImageUpload>>,
    fail_with: Mutex<Option<String>>,
}

impl NullContentStore {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        }
    }

    /// Make every following upload fail with `reason`.
    pub fn fail_uploads(&self, reason: impl Into<String>) {
        *self.fail_with.lock().unwrap() = Some(reason.into());
    }

    /// All files stored so far.
    pub fn uploads(&self) -> Vec<ImageUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

impl Default for NullContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for NullContentStore {
    async fn upload(&self, file: &ImageUpload) -> Result<String, RegistryError> {
        if let Some(reason) = self.fail_with.lock().unwrap().clone() {
            return Err(RegistryError::Unavailable(reason));
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(file.clone());
        Ok(format!("bafynull{}", uploads.len()))
    }
}
