//! Upload-provider integration: the policy the provider is configured with
//! and the completion callback it invokes once bytes are stored.

use crate::{
    errors::AppError,
    extractors::{AppJson, CurrentPrincipal},
    models::upload::UploadedFile,
    services::upload_service::complete_upload,
    state::AppState,
};
use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

/// Body of `POST /uploads/complete`.
#[derive(Debug, Deserialize)]
pub struct UploadCompleteReq {
    #[serde(default)]
    pub files: Vec<UploadedFile>,
}

/// GET `/uploads/policy`
pub async fn upload_policy(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.upload_policy.as_ref().clone())
}

/// POST `/uploads/complete` — validate the reported files and echo them
/// back with the uploader's identity.
pub async fn upload_complete(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    AppJson(req): AppJson<UploadCompleteReq>,
) -> Result<impl IntoResponse, AppError> {
    let receipts = complete_upload(&state.upload_policy, principal.principal(), req.files)?;
    Ok(Json(json!({ "files": receipts })))
}
