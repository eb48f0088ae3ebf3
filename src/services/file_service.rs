//! src/services/file_service.rs
//!
//! FileService — metadata lifecycle for shared files backed by SQLite.
//! Owns creation, listing, rename/visibility edits, deletion, the public
//! slug lookup and the two access counters. File bytes never pass through
//! here; they stay in the external blob store referenced by `File::url`.

use crate::models::{
    file::{ANONYMOUS_OWNER, File, FileDescriptor, FilePatch},
    principal::{Principal, is_owner, principal_id},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Columns selected for every `File` row, in `FromRow` order.
const FILE_COLUMNS: &str = "id, owner_id, user_id, user_email, name, type, url, size, \
     is_public, slug, downloads, visitors, created_at";

const SLUG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file `{0}` not found")]
    NotFound(String),
    #[error("not allowed to modify file `{0}`")]
    Forbidden(Uuid),
    #[error("no files provided")]
    EmptyInput,
    #[error("file name must not be blank")]
    InvalidName,
    #[error("invalid file descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("file not found or not public")]
    NotFoundOrPrivate,
    #[error("slug `{0}` is already in use")]
    SlugTaken(String),
    #[error("blob store unavailable for `{url}`: {reason}")]
    UpstreamUnavailable { url: String, reason: String },
    #[error("upload rejected: {0}")]
    UploadRejected(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type FileResult<T> = Result<T, FileError>;

/// Parse a path id. Anything that is not a UUID cannot name a file.
pub fn parse_file_id(raw: &str) -> FileResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| FileError::NotFound(raw.to_string()))
}

/// Opaque URL-safe public identifier.
pub fn generate_slug() -> String {
    let mut slug = URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes());
    slug.truncate(SLUG_LEN);
    slug
}

/// FileService provides the metadata operations:
/// - List/get/create/update/delete file records
/// - Resolve a public slug (counting a visit)
/// - Count a download
///
/// Every counter change is a single `UPDATE ... RETURNING` statement so
/// concurrent requests never lose increments.
#[derive(Clone)]
pub struct FileService {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,
}

impl FileService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Files visible to the caller, newest first.
    ///
    /// Matches records whose `owner_id` equals a non-blank `owner_override`,
    /// else the caller's id, else `"anonymous"`, plus records whose
    /// `user_id` is the caller's id.
    pub async fn list_files(
        &self,
        principal: Option<&Principal>,
        owner_override: Option<&str>,
    ) -> FileResult<Vec<File>> {
        let owner = owner_override
            .filter(|o| !o.trim().is_empty())
            .unwrap_or_else(|| principal_id(principal));
        let user_id = principal.map(|p| p.id.as_str());

        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE owner_id = ? OR user_id = ?
             ORDER BY created_at DESC, rowid DESC"
        );
        let files = sqlx::query_as::<_, File>(&sql)
            .bind(owner)
            .bind(user_id)
            .fetch_all(&*self.db)
            .await?;

        debug!("listed {} files for owner {}", files.len(), owner);
        Ok(files)
    }

    /// Fetch a single file by id.
    pub async fn get_file(&self, id: Uuid) -> FileResult<File> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?");
        sqlx::query_as::<_, File>(&sql)
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or_else(|| FileError::NotFound(id.to_string()))
    }

    /// Persist one record per descriptor, stamped with the caller's identity.
    ///
    /// Not transactional: when item `k` fails, items before it stay
    /// persisted and the error of item `k` is returned.
    pub async fn create_files(
        &self,
        principal: Option<&Principal>,
        descriptors: Vec<FileDescriptor>,
    ) -> FileResult<Vec<File>> {
        if descriptors.is_empty() {
            return Err(FileError::EmptyInput);
        }

        let requested = descriptors.len();
        let mut created = Vec::with_capacity(requested);
        for descriptor in descriptors {
            match self.insert_file(principal, descriptor).await {
                Ok(file) => created.push(file),
                Err(err) => {
                    warn!(
                        "batch create stopped after {} of {} files: {}",
                        created.len(),
                        requested,
                        err
                    );
                    return Err(err);
                }
            }
        }

        Ok(created)
    }

    async fn insert_file(
        &self,
        principal: Option<&Principal>,
        descriptor: FileDescriptor,
    ) -> FileResult<File> {
        validate_descriptor(&descriptor)?;
        let slug = descriptor
            .slug
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(generate_slug);
        let owner_id = principal
            .map(|p| p.id.clone())
            .unwrap_or_else(|| ANONYMOUS_OWNER.to_string());

        let sql = format!(
            "INSERT INTO files (
                id, owner_id, user_id, user_email, name, type, url, size,
                is_public, slug, downloads, visitors, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?)
             RETURNING {FILE_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, File>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(principal.map(|p| p.id.clone()))
            .bind(principal.and_then(|p| p.email.clone()))
            .bind(&descriptor.name)
            .bind(&descriptor.content_type)
            .bind(&descriptor.url)
            .bind(descriptor.size)
            .bind(descriptor.is_public)
            .bind(&slug)
            .bind(Utc::now())
            .fetch_one(&*self.db)
            .await;

        match inserted {
            Ok(file) => {
                info!(
                    "created file id={} slug={} owner={} size={}",
                    file.id, file.slug, file.owner_id, file.size
                );
                Ok(file)
            }
            Err(err) if is_unique_violation(&err) => Err(FileError::SlugTaken(slug)),
            Err(err) => Err(FileError::Sqlx(err)),
        }
    }

    /// Apply an owner's rename and/or visibility change.
    pub async fn update_file(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
        patch: FilePatch,
    ) -> FileResult<File> {
        let file = self.owned_file(principal, id).await?;

        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(FileError::InvalidName);
            }
        }
        if patch.is_empty() {
            return Ok(file);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE files SET ");
        let mut assignments = builder.separated(", ");
        if let Some(name) = patch.name {
            assignments.push("name = ");
            assignments.push_bind_unseparated(name);
        }
        if let Some(is_public) = patch.is_public {
            assignments.push("is_public = ");
            assignments.push_bind_unseparated(is_public);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING ");
        builder.push(FILE_COLUMNS);

        let updated = builder
            .build_query_as::<File>()
            .fetch_optional(&*self.db)
            .await?
            .ok_or_else(|| FileError::NotFound(id.to_string()))?;

        info!(
            "updated file id={} name={} public={}",
            updated.id, updated.name, updated.is_public
        );
        Ok(updated)
    }

    /// Remove an owner's file record. The blob itself is left untouched.
    pub async fn delete_file(&self, principal: Option<&Principal>, id: Uuid) -> FileResult<()> {
        self.owned_file(principal, id).await?;

        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(FileError::NotFound(id.to_string()));
        }

        info!("deleted file id={}", id);
        Ok(())
    }

    /// Atomically count one download and return the updated record.
    pub async fn increment_downloads(&self, id: Uuid) -> FileResult<File> {
        let sql = format!(
            "UPDATE files SET downloads = downloads + 1 WHERE id = ? RETURNING {FILE_COLUMNS}"
        );
        let file = sqlx::query_as::<_, File>(&sql)
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or_else(|| FileError::NotFound(id.to_string()))?;

        debug!("file {} downloads={}", file.id, file.downloads);
        Ok(file)
    }

    /// Resolve a public slug, counting one visit.
    ///
    /// Missing and private files both yield `NotFoundOrPrivate`.
    pub async fn resolve_slug(&self, slug: &str) -> FileResult<File> {
        let sql = format!(
            "UPDATE files SET visitors = visitors + 1
             WHERE slug = ? AND is_public = 1
             RETURNING {FILE_COLUMNS}"
        );
        let file = sqlx::query_as::<_, File>(&sql)
            .bind(slug)
            .fetch_optional(&*self.db)
            .await?
            .ok_or(FileError::NotFoundOrPrivate)?;

        debug!("slug {} visitors={}", slug, file.visitors);
        Ok(file)
    }

    async fn owned_file(&self, principal: Option<&Principal>, id: Uuid) -> FileResult<File> {
        let file = self.get_file(id).await?;
        if !is_owner(principal, &file) {
            return Err(FileError::Forbidden(id));
        }
        Ok(file)
    }
}

/// Required fields must be present and non-blank; sizes are never negative.
fn validate_descriptor(descriptor: &FileDescriptor) -> FileResult<()> {
    let required = [
        ("name", &descriptor.name),
        ("type", &descriptor.content_type),
        ("url", &descriptor.url),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(FileError::InvalidDescriptor(format!("`{}` is required", field)));
    }
    if descriptor.size < 0 {
        return Err(FileError::InvalidDescriptor(format!(
            "size {} is negative",
            descriptor.size
        )));
    }
    Ok(())
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}
