// HTTP Blob Store
// Resolves document URIs against an HTTP-fronted object store (a presigned
// gateway or any plain HTTP file server).

use async_trait::async_trait;
use carelens_core::port::{BlobError, BlobStore};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpBlobStore {
    client: Client,
}

impl HttpBlobStore {
    pub fn new() -> Result<Self, BlobError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| BlobError::Unreachable(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, BlobError> {
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| BlobError::Unreachable(format!("{uri}: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BlobError::NotFound(uri.to_string()));
        }
        if !response.status().is_success() {
            return Err(BlobError::Unreachable(format!(
                "{uri}: status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BlobError::Unreachable(format!("{uri}: {e}")))?;

        debug!(uri = %uri, size = bytes.len(), "Fetched blob");
        Ok(bytes.to_vec())
    }
}
