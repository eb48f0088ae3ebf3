//! HTTP handlers for file metadata, public slug lookups and downloads.
//! The caller's identity comes from `CurrentPrincipal`; every handler
//! delegates the actual work to `FileService` or `DownloadService`.

use crate::{
    errors::AppError,
    extractors::{AppJson, CurrentPrincipal},
    models::file::{FileDescriptor, FilePatch},
    services::{download_service::DownloadedFile, file_service::parse_file_id},
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

/// Query params accepted by `GET /files`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesQuery {
    pub owner_id: Option<String>,
}

/// Body of `POST /files`.
#[derive(Debug, Deserialize)]
pub struct CreateFilesReq {
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

/// GET `/files` — files owned by the caller (or `?ownerId=`), newest first.
pub async fn list_files(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Query(q): Query<ListFilesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let files = state
        .files
        .list_files(principal.principal(), q.owner_id.as_deref())
        .await?;
    Ok(Json(json!({ "files": files })))
}

/// POST `/files` — persist metadata for freshly uploaded files.
pub async fn create_files(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    AppJson(req): AppJson<CreateFilesReq>,
) -> Result<impl IntoResponse, AppError> {
    let files = state
        .files
        .create_files(principal.principal(), req.files)
        .await?;
    Ok(Json(json!({
        "files": files,
        "message": "Files uploaded successfully"
    })))
}

/// GET `/files/{id}`
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let file = state.files.get_file(parse_file_id(&id)?).await?;
    Ok(Json(json!({ "file": file })))
}

/// PATCH `/files/{id}` — rename and/or toggle visibility.
pub async fn update_file(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(id): Path<String>,
    AppJson(patch): AppJson<FilePatch>,
) -> Result<impl IntoResponse, AppError> {
    let file = state
        .files
        .update_file(principal.principal(), parse_file_id(&id)?, patch)
        .await?;
    Ok(Json(json!({ "file": file })))
}

/// DELETE `/files/{id}` — remove the record; the blob is not touched.
pub async fn delete_file(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .files
        .delete_file(principal.principal(), parse_file_id(&id)?)
        .await?;
    Ok(Json(json!({ "message": "File deleted successfully" })))
}

/// GET `/files/{id}/download` — count the download and relay the bytes as
/// an attachment.
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let download = state.downloads.download(parse_file_id(&id)?).await?;

    let mut headers = HeaderMap::new();
    set_attachment_headers(&mut headers, &download);

    let mut response = Response::new(Body::from(download.body));
    *response.status_mut() = StatusCode::OK;
    *response.headers_mut() = headers;
    Ok(response)
}

/// POST `/files/{id}/download` — count only; the client fetches the bytes
/// itself.
pub async fn record_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .downloads
        .record_download(parse_file_id(&id)?)
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// GET `/files/slug/{slug}` — public lookup, counts one visit.
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let file = state.files.resolve_slug(&slug).await?;
    Ok(Json(json!({ "file": file })))
}

fn set_attachment_headers(headers: &mut HeaderMap, download: &DownloadedFile) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&download.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(&download.filename))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from(download.content_length),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", download.etag)) {
        headers.insert(header::ETAG, value);
    }
}

/// `attachment` disposition with an ASCII `filename` and, when the name is
/// not plain ASCII, an RFC 5987 `filename*`.
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    if ascii == filename {
        format!("attachment; filename=\"{}\"", ascii)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii,
            urlencoding::encode(filename)
        )
    }
}
