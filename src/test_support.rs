//! Shared fixtures for unit and router tests.

use crate::{
    db,
    models::file::FileDescriptor,
    services::blob_store::{BlobError, BlobStore},
};
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::SqlitePool;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use uuid::Uuid;

/// Fresh in-memory database with the schema applied.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn memory_pool() -> Arc<SqlitePool> {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    Arc::new(pool)
}

/// Database file under the temp dir, shared by `max_connections`
/// connections so concurrent statements really interleave.
pub async fn file_pool(max_connections: u32) -> (Arc<SqlitePool>, PathBuf) {
    let path = std::env::temp_dir().join(format!("file-share-test-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    let pool = db::connect(&url, max_connections).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    (Arc::new(pool), path)
}

/// Best-effort removal of a test database and its WAL side files.
pub fn remove_db_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

pub fn descriptor(name: &str, slug: &str) -> FileDescriptor {
    FileDescriptor {
        name: name.into(),
        content_type: "application/pdf".into(),
        url: format!("https://blobs.example/{}", slug),
        size: 2048,
        slug: Some(slug.into()),
        is_public: true,
    }
}

/// In-process blob store serving fixed bodies by URL; unknown URLs behave
/// like an upstream 404.
#[derive(Default)]
pub struct FakeBlobStore {
    bodies: HashMap<String, Bytes>,
    pub fetches: AtomicUsize,
}

impl FakeBlobStore {
    pub fn with_body(mut self, url: &str, body: &'static [u8]) -> Self {
        self.bodies.insert(url.to_string(), Bytes::from_static(body));
        self
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn fetch(&self, url: &str) -> Result<Bytes, BlobError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.bodies.get(url).cloned().ok_or(BlobError::Status(404))
    }
}
