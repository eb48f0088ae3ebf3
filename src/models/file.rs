//! Represents a shared file and the payloads used to create and edit it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Owner id stamped on files uploaded without an authenticated principal.
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// Metadata for a single uploaded file.
///
/// The bytes themselves live in the external blob store under `url`; this
/// record only tracks naming, visibility and access counters.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Internal UUID, never exposed through the public slug path.
    pub id: Uuid,

    /// Uploading principal, or `"anonymous"`.
    pub owner_id: String,

    /// Authenticated uploader, if any.
    pub user_id: Option<String>,

    pub user_email: Option<String>,

    /// Display name, editable by the owner.
    pub name: String,

    /// MIME type reported by the upload provider.
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub content_type: String,

    /// Blob-store fetch URL.
    pub url: String,

    /// Size in bytes.
    pub size: i64,

    /// Whether the file can be resolved through its slug.
    pub is_public: bool,

    /// Opaque public identifier, unique across all files.
    pub slug: String,

    pub downloads: i64,

    pub visitors: i64,

    pub created_at: DateTime<Utc>,
}

/// One entry of a batch-create request, as echoed back by the upload provider.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub url: String,
    pub size: i64,
    /// Generated server-side when the client does not supply one.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

/// The only fields an owner may change after upload.
///
/// Anything else in the request body is rejected during deserialization.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilePatch {
    pub name: Option<String>,
    pub is_public: Option<bool>,
}

impl FilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.is_public.is_none()
    }
}
