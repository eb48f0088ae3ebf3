//! Request extractors.

use crate::{errors::AppError, models::principal::Principal};
use axum::{
    Json,
    body::Body,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use std::convert::Infallible;

/// Header carrying the authenticated user's id, set by the identity proxy.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's email, if known.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The caller as reported by the identity provider; `None` when anonymous.
///
/// Never rejects: a missing or blank id header simply means anonymous.
pub struct CurrentPrincipal(pub Option<Principal>);

impl CurrentPrincipal {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let principal =
            header(USER_ID_HEADER).map(|id| Principal::new(id, header(USER_EMAIL_HEADER)));
        Ok(CurrentPrincipal(principal))
    }
}

/// JSON body extractor whose rejections use the service's error format.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::bad_request(match rejection {
                JsonRejection::JsonDataError(err) => {
                    format!("Invalid JSON data: {}", err.body_text())
                }
                JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
                JsonRejection::MissingJsonContentType(err) => {
                    format!("Missing JSON content type: {}", err)
                }
                _ => "Failed to parse JSON body".to_string(),
            })),
        }
    }
}
