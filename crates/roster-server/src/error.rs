//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use roster_api::ApiError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or wrong credentials on an API request.
  #[error("unauthorized")]
  Unauthorized,

  /// An unauthenticated page request; answered with a redirect to the login
  /// page that returns to `next` afterwards.
  #[error("login required")]
  LoginRequired { next: String },

  #[error("invalid username or password")]
  InvalidCredentials,

  #[error(transparent)]
  Api(#[from] ApiError),

  #[error("session error: {0}")]
  Session(#[from] tower_sessions::session::Error),
}

impl From<roster_core::Error> for Error {
  fn from(e: roster_core::Error) -> Self { Error::Api(e.into()) }
}

/// Percent-encode `target` for use as the `next` query parameter.
fn encode_next(target: &str) -> String {
  let mut out = String::with_capacity(target.len());
  for b in target.bytes() {
    match b {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
        out.push(b as char)
      }
      _ => out.push_str(&format!("%{b:02X}")),
    }
  }
  out
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" })))
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"roster\""),
        );
        res
      }
      Error::LoginRequired { next } => {
        let location = format!("/login/?next={}", encode_next(&next));
        (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
      }
      Error::InvalidCredentials => (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Please enter a correct username and password." })),
      )
        .into_response(),
      Error::Api(e) => e.into_response(),
      Error::Session(e) => {
        error!(error = %e, "session store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
          .into_response()
      }
    }
  }
}
