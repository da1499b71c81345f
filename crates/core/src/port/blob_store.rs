// Blob Store Port (Interface)

use async_trait::async_trait;
use thiserror::Error;

/// Blob retrieval failures
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob store unreachable: {0}")]
    Unreachable(String),
}

/// Read access to stored document bytes
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch raw document bytes for a storage URI
    ///
    /// # Errors
    /// - `BlobError::NotFound` if no blob exists at the URI
    /// - `BlobError::Unreachable` if the store cannot be reached
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, BlobError>;
}

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory blob store for tests
    pub struct InMemoryBlobStore {
        blobs: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl InMemoryBlobStore {
        pub fn new() -> Self {
            Self {
                blobs: Mutex::new(HashMap::new()),
            }
        }

        pub fn insert(&self, uri: impl Into<String>, bytes: Vec<u8>) {
            self.blobs.lock().unwrap().insert(uri.into(), bytes);
        }
    }

    impl Default for InMemoryBlobStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl BlobStore for InMemoryBlobStore {
        async fn fetch(&self, uri: &str) -> Result<Vec<u8>, BlobError> {
            self.blobs
                .lock()
                .unwrap()
                .get(uri)
                .cloned()
                .ok_or_else(|| BlobError::NotFound(uri.to_string()))
        }
    }
}
