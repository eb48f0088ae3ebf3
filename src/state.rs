//! Shared state handed to every handler.

use crate::{
    models::upload::UploadPolicy,
    services::{
        blob_store::BlobStore, download_service::DownloadService, file_service::FileService,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub files: FileService,
    pub downloads: DownloadService,
    pub upload_policy: Arc<UploadPolicy>,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, blobs: Arc<dyn BlobStore>, upload_policy: UploadPolicy) -> Self {
        let files = FileService::new(db);
        let downloads = DownloadService::new(files.clone(), blobs);
        Self {
            files,
            downloads,
            upload_policy: Arc::new(upload_policy),
        }
    }
}
