//! Upload-provider payloads and the per-category upload policy.

use serde::{Deserialize, Serialize};

const MIB: i64 = 1024 * 1024;

/// Broad file category used to pick upload limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Pdf,
    Text,
    Blob,
}

impl FileCategory {
    /// Classify a MIME type. Unknown or malformed types fall back to `Blob`.
    pub fn from_mime(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.split_once('/') {
            Some(("image", _)) => Self::Image,
            Some(("video", _)) => Self::Video,
            Some(("audio", _)) => Self::Audio,
            Some(("text", _)) => Self::Text,
            Some(("application", "pdf")) => Self::Pdf,
            _ => Self::Blob,
        }
    }
}

/// Limits applied to one category within a single upload.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLimit {
    pub category: FileCategory,
    pub max_file_size: i64,
    pub max_file_count: usize,
}

/// Per-category limits the upload provider is configured with.
#[derive(Debug, Clone, Serialize)]
pub struct UploadPolicy {
    pub limits: Vec<CategoryLimit>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        let limit = |category, max_file_count| CategoryLimit {
            category,
            max_file_size: 16 * MIB,
            max_file_count,
        };
        Self {
            limits: vec![
                limit(FileCategory::Image, 10),
                limit(FileCategory::Video, 5),
                limit(FileCategory::Audio, 10),
                limit(FileCategory::Pdf, 10),
                limit(FileCategory::Text, 10),
                limit(FileCategory::Blob, 10),
            ],
        }
    }
}

impl UploadPolicy {
    pub fn limit_for(&self, category: FileCategory) -> Option<&CategoryLimit> {
        self.limits.iter().find(|l| l.category == category)
    }

    /// Largest per-file size any category allows.
    pub fn max_file_size(&self) -> u64 {
        self.limits
            .iter()
            .map(|l| l.max_file_size.max(0) as u64)
            .max()
            .unwrap_or(0)
    }
}

/// A file as reported by the upload provider once the bytes are stored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadedFile {
    pub url: String,
    pub name: String,
    pub size: i64,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// Callback response: the uploaded file plus the uploader's identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub url: String,
    pub name: String,
    pub size: i64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub user_id: String,
    pub user_email: String,
}
