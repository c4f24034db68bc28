//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! This is where the engine's outcome taxonomy becomes HTTP status codes:
//! validation → 400 with the field→reason map, not found → 404, not owner →
//! 403, stale token → 409, storage failure → 500. Nothing is swallowed.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use leadbook_core::validate::ValidationErrors;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("validation failed")]
  Validation(ValidationErrors),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("rate limit exceeded, retry in {retry_after}s")]
  RateLimited { retry_after: u64 },

  #[error(transparent)]
  Core(#[from] leadbook_core::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use leadbook_core::Error as Core;

    match self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthorized" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"leadbook\""),
        );
        res
      }

      ApiError::Validation(fields) => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "validation failed", "fields": fields })),
      )
        .into_response(),

      ApiError::BadRequest(msg) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
          .into_response()
      }

      ApiError::RateLimited { retry_after } => {
        let mut res = (
          StatusCode::TOO_MANY_REQUESTS,
          Json(json!({ "error": "rate limit exceeded" })),
        )
          .into_response();
        if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
          res.headers_mut().insert(header::RETRY_AFTER, v);
        }
        res
      }

      ApiError::Core(core) => match core {
        Core::LeadNotFound(id) => (
          StatusCode::NOT_FOUND,
          Json(json!({ "error": format!("lead {id} not found") })),
        )
          .into_response(),

        Core::NotOwner { .. } => (
          StatusCode::FORBIDDEN,
          Json(json!({ "error": "you do not own this lead" })),
        )
          .into_response(),

        Core::VersionConflict { stored, .. } => (
          StatusCode::CONFLICT,
          Json(json!({
            "error": "record changed, please refresh",
            "storedVersion": stored,
          })),
        )
          .into_response(),

        other => (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": other.to_string() })),
        )
          .into_response(),
      },
    }
  }
}
