//! Defines routes for file metadata, public sharing and downloads.
//!
//! ## Structure
//! - **File endpoints**
//!   - `GET    /files` — list the caller's files (optional `?ownerId=`)
//!   - `POST   /files` — batch-create metadata for uploaded files
//!   - `GET    /files/{id}` — fetch one file
//!   - `PATCH  /files/{id}` — rename / toggle visibility (owner only)
//!   - `DELETE /files/{id}` — delete metadata (owner only)
//!   - `GET    /files/{id}/download` — count + relay bytes as attachment
//!   - `POST   /files/{id}/download` — count only
//!
//! - **Public sharing**
//!   - `GET    /files/slug/{slug}` — resolve a public slug, counting a visit
//!
//! - **Upload provider**
//!   - `GET    /uploads/policy` — per-category upload limits
//!   - `POST   /uploads/complete` — upload-completion callback

use crate::{
    handlers::{
        file_handlers::{
            create_files, delete_file, download_file, get_by_slug, get_file, list_files,
            record_download, update_file,
        },
        health_handlers::{healthz, readyz},
        upload_handlers::{upload_complete, upload_policy},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for all service routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // File routes
        .route("/files", get(list_files).post(create_files))
        .route("/files/slug/{slug}", get(get_by_slug))
        .route(
            "/files/{id}",
            get(get_file).patch(update_file).delete(delete_file),
        )
        .route(
            "/files/{id}/download",
            get(download_file).post(record_download),
        )
        // Upload provider routes
        .route("/uploads/policy", get(upload_policy))
        .route("/uploads/complete", post(upload_complete))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extractors::{USER_EMAIL_HEADER, USER_ID_HEADER},
        models::upload::UploadPolicy,
        test_support::{FakeBlobStore, memory_pool},
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> Router {
        let blobs = FakeBlobStore::default().with_body("https://blobs.example/abc123", b"hello");
        let state = AppState::new(memory_pool().await, Arc::new(blobs), UploadPolicy::default());
        routes().with_state(state)
    }

    fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder
                .header(USER_ID_HEADER, user)
                .header(USER_EMAIL_HEADER, format!("{}@example.com", user));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn upload(app: &Router, user: Option<&str>, slug: &str) -> Value {
        let (status, body) = send(
            app,
            request(
                "POST",
                "/files",
                user,
                Some(json!({ "files": [{
                    "name": "report.pdf",
                    "type": "application/pdf",
                    "url": format!("https://blobs.example/{}", slug),
                    "size": 2048,
                    "slug": slug,
                    "isPublic": true
                }]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["files"][0].clone()
    }

    #[tokio::test]
    async fn create_rejects_empty_batch() {
        let app = app().await;
        let (status, body) =
            send(&app, request("POST", "/files", None, Some(json!({ "files": [] })))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No files provided");
    }

    #[tokio::test]
    async fn create_then_list_and_get() {
        let app = app().await;
        let file = upload(&app, Some("alice"), "abc123").await;
        assert_eq!(file["userEmail"], "alice@example.com");
        assert_eq!(file["downloads"], 0);

        let (status, body) = send(&app, request("GET", "/files", Some("alice"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["files"].as_array().unwrap().len(), 1);

        let (_, body) = send(&app, request("GET", "/files", Some("bob"), None)).await;
        assert!(body["files"].as_array().unwrap().is_empty());

        let uri = format!("/files/{}", file["id"].as_str().unwrap());
        let (status, body) = send(&app, request("GET", &uri, None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["file"]["slug"], "abc123");
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let app = app().await;
        let (status, _) = send(&app, request("GET", "/files/not-a-uuid", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let uri = format!("/files/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&app, request("DELETE", &uri, None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_is_owner_only_and_allow_listed() {
        let app = app().await;
        let file = upload(&app, Some("alice"), "abc123").await;
        let uri = format!("/files/{}", file["id"].as_str().unwrap());

        let (status, _) = send(
            &app,
            request("PATCH", &uri, Some("bob"), Some(json!({ "name": "x" }))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            request("PATCH", &uri, Some("alice"), Some(json!({ "downloads": 999 }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            request("PATCH", &uri, Some("alice"), Some(json!({ "name": "q3.pdf" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["file"]["name"], "q3.pdf");
        assert_eq!(body["file"]["downloads"], 0);
    }

    #[tokio::test]
    async fn slug_resolution_counts_visits_until_made_private() {
        let app = app().await;
        let file = upload(&app, Some("alice"), "abc123").await;

        let (_, body) = send(&app, request("GET", "/files/slug/abc123", None, None)).await;
        assert_eq!(body["file"]["visitors"], 1);
        let (_, body) = send(&app, request("GET", "/files/slug/abc123", None, None)).await;
        assert_eq!(body["file"]["visitors"], 2);

        let uri = format!("/files/{}", file["id"].as_str().unwrap());
        send(
            &app,
            request("PATCH", &uri, Some("alice"), Some(json!({ "isPublic": false }))),
        )
        .await;

        let (private_status, private_body) =
            send(&app, request("GET", "/files/slug/abc123", None, None)).await;
        let (missing_status, missing_body) =
            send(&app, request("GET", "/files/slug/missing", None, None)).await;
        assert_eq!(private_status, StatusCode::NOT_FOUND);
        assert_eq!(private_status, missing_status);
        assert_eq!(private_body, missing_body);
    }

    #[tokio::test]
    async fn download_relays_attachment_and_counts() {
        let app = app().await;
        let file = upload(&app, None, "abc123").await;
        let uri = format!("/files/{}/download", file["id"].as_str().unwrap());

        let response = app
            .clone()
            .oneshot(request("GET", &uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(headers[header::CONTENT_LENGTH], "5");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello");

        let (status, body) = send(&app, request("POST", &uri, None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (_, body) = send(
            &app,
            request("GET", &format!("/files/{}", file["id"].as_str().unwrap()), None, None),
        )
        .await;
        assert_eq!(body["file"]["downloads"], 2);
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway_but_counted() {
        let app = app().await;
        let file = upload(&app, None, "gone").await;
        let id = file["id"].as_str().unwrap();

        let (status, _) = send(
            &app,
            request("GET", &format!("/files/{}/download", id), None, None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (_, body) = send(&app, request("GET", &format!("/files/{}", id), None, None)).await;
        assert_eq!(body["file"]["downloads"], 1);
    }

    #[tokio::test]
    async fn delete_is_owner_only() {
        let app = app().await;
        let file = upload(&app, Some("alice"), "abc123").await;
        let uri = format!("/files/{}", file["id"].as_str().unwrap());

        let (status, _) = send(&app, request("DELETE", &uri, None, None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, request("DELETE", &uri, Some("alice"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "File deleted successfully");

        let (status, _) = send(&app, request("GET", &uri, None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_rejects_blank_required_fields() {
        let app = app().await;
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/files",
                Some("alice"),
                Some(json!({ "files": [{
                    "name": "report.pdf",
                    "type": "application/pdf",
                    "url": "  ",
                    "size": 2048
                }]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("`url` is required"));

        let (_, body) = send(&app, request("GET", "/files", Some("alice"), None)).await;
        assert!(body["files"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn anonymous_uploads_are_editable_by_signed_in_users() {
        let app = app().await;
        let file = upload(&app, None, "abc123").await;
        let uri = format!("/files/{}", file["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            request("PATCH", &uri, Some("bob"), Some(json!({ "name": "renamed.pdf" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["file"]["name"], "renamed.pdf");

        let (status, _) = send(&app, request("DELETE", &uri, Some("bob"), None)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, request("GET", &uri, None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_callback_enforces_policy() {
        let app = app().await;

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/uploads/complete",
                Some("alice"),
                Some(json!({ "files": [{
                    "url": "https://blobs.example/a.png",
                    "name": "a.png",
                    "size": 1024,
                    "type": "image/png"
                }]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["files"][0]["userId"], "alice");

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/uploads/complete",
                None,
                Some(json!({ "files": [{
                    "url": "https://blobs.example/huge.bin",
                    "name": "huge.bin",
                    "size": 17 * 1024 * 1024,
                    "type": "application/octet-stream"
                }]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, request("GET", "/uploads/policy", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["limits"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn health_endpoints_report_ok() {
        let app = app().await;
        let (status, _) = send(&app, request("GET", "/healthz", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, request("GET", "/readyz", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["sqlite"]["ok"], true);
    }
}
