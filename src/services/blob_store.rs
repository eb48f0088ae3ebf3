//! Read access to the external blob store that holds uploaded bytes.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("upstream responded with status {0}")]
    Status(u16),
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream body exceeds {0} bytes")]
    TooLarge(u64),
}

/// Fetches the full content behind a blob URL. Each call is attempted once.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, BlobError>;
}

/// `BlobStore` over plain HTTP(S) GETs.
///
/// The client carries a whole-request timeout so a stalled upstream cannot
/// hold a download open forever, and bodies larger than `max_body_bytes`
/// are refused instead of buffered.
#[derive(Clone)]
pub struct HttpBlobStore {
    client: Client,
    max_body_bytes: u64,
}

impl HttpBlobStore {
    pub fn new(timeout: Duration, max_body_bytes: u64) -> Result<Self, BlobError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BlobError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            max_body_bytes,
        })
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn fetch(&self, url: &str) -> Result<Bytes, BlobError> {
        debug!("fetching blob {}", url);
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BlobError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlobError::Status(status.as_u16()));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes)
        {
            return Err(BlobError::TooLarge(self.max_body_bytes));
        }

        // Content-Length may be absent; enforce the cap while reading too.
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| BlobError::Transport(e.to_string()))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                return Err(BlobError::TooLarge(self.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }
}
