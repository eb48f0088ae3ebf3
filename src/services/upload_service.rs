//! Upload-completion handling: enforce the per-category policy on files the
//! upload provider reports, and echo them back with the uploader's identity.

use super::file_service::{FileError, FileResult};
use crate::models::{
    principal::{Principal, principal_id},
    upload::{FileCategory, UploadPolicy, UploadReceipt, UploadedFile},
};
use std::collections::BTreeMap;
use tracing::info;

/// Reject the batch when a file is too large for its category or a
/// category holds more files than allowed.
pub fn check_upload(policy: &UploadPolicy, files: &[UploadedFile]) -> FileResult<()> {
    if files.is_empty() {
        return Err(FileError::EmptyInput);
    }

    let mut counts: BTreeMap<FileCategory, usize> = BTreeMap::new();
    for file in files {
        let category = FileCategory::from_mime(&file.content_type);
        let limit = policy.limit_for(category).ok_or_else(|| {
            FileError::UploadRejected(format!("{:?} files are not accepted", category))
        })?;

        if file.size < 0 || file.size > limit.max_file_size {
            return Err(FileError::UploadRejected(format!(
                "`{}` is {} bytes, limit for {:?} is {} bytes",
                file.name, file.size, category, limit.max_file_size
            )));
        }

        let count = counts.entry(category).or_default();
        *count += 1;
        if *count > limit.max_file_count {
            return Err(FileError::UploadRejected(format!(
                "at most {} {:?} files per upload",
                limit.max_file_count, category
            )));
        }
    }

    Ok(())
}

/// Validate a completed upload and attach the uploader's identity.
pub fn complete_upload(
    policy: &UploadPolicy,
    principal: Option<&Principal>,
    files: Vec<UploadedFile>,
) -> FileResult<Vec<UploadReceipt>> {
    check_upload(policy, &files)?;

    let user_id = principal_id(principal).to_string();
    let user_email = principal
        .and_then(|p| p.email.clone())
        .unwrap_or_default();

    let receipts = files
        .into_iter()
        .map(|file| {
            info!("Upload complete for userId: {} url: {}", user_id, file.url);
            UploadReceipt {
                url: file.url,
                name: file.name,
                size: file.size,
                content_type: file.content_type,
                user_id: user_id.clone(),
                user_email: user_email.clone(),
            }
        })
        .collect();

    Ok(receipts)
}
