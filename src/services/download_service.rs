//! Download relay: counts a download, then pulls the bytes from the blob
//! store so they can be served as an attachment.

use super::{
    blob_store::BlobStore,
    file_service::{FileError, FileResult, FileService},
};
use crate::models::file::File;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Relayed content plus the headers needed for a forced download.
#[derive(Debug)]
pub struct DownloadedFile {
    pub body: Bytes,
    pub content_type: String,
    pub filename: String,
    pub content_length: usize,
    /// Hex MD5 of `body`.
    pub etag: String,
}

#[derive(Clone)]
pub struct DownloadService {
    files: FileService,
    blobs: Arc<dyn BlobStore>,
}

impl DownloadService {
    pub fn new(files: FileService, blobs: Arc<dyn BlobStore>) -> Self {
        Self { files, blobs }
    }

    /// Count a download and relay the file's bytes.
    ///
    /// The counter is incremented before the fetch and stays incremented
    /// when the fetch fails.
    pub async fn download(&self, id: Uuid) -> FileResult<DownloadedFile> {
        let file = self.files.increment_downloads(id).await?;

        let body = self.blobs.fetch(&file.url).await.map_err(|err| {
            warn!("download of file {} failed upstream: {}", file.id, err);
            FileError::UpstreamUnavailable {
                url: file.url.clone(),
                reason: err.to_string(),
            }
        })?;

        debug!("relaying {} bytes for file {}", body.len(), file.id);
        Ok(attachment(&file, body))
    }

    /// Count a download whose transfer happens elsewhere.
    pub async fn record_download(&self, id: Uuid) -> FileResult<File> {
        self.files.increment_downloads(id).await
    }
}

fn attachment(file: &File, body: Bytes) -> DownloadedFile {
    let content_type = if file.content_type.trim().is_empty() {
        FALLBACK_CONTENT_TYPE.to_string()
    } else {
        file.content_type.clone()
    };

    DownloadedFile {
        content_length: body.len(),
        etag: format!("{:x}", md5::compute(&body)),
        content_type,
        filename: file.name.clone(),
        body,
    }
}
