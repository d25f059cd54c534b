//! QR scan entry page and the lookup endpoint it posts to.
//!
//! `/process_qr/` always answers 200; the outcome is in the `status` field.

use axum::{
  Json,
  extract::State,
  http::Method,
  response::Html,
};
use bytes::Bytes;
use roster_core::store::RecordStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::AppState;

const IDENTIFY_PAGE: &str = include_str!("../assets/identify.html");

pub const NOT_FOUND: &str = "Student not found";
pub const INVALID_METHOD: &str = "Invalid request method";

#[derive(Debug, Deserialize)]
struct ScanRequest {
  qr_data: Option<String>,
}

fn scan_error(message: &str) -> Json<Value> {
  Json(json!({ "status": "error", "message": message }))
}

/// `GET /auth/`
pub async fn identify() -> Html<&'static str> { Html(IDENTIFY_PAGE) }

/// `/process_qr/`: body `{"qr_data": "<roll number>"}`.
pub async fn process_qr<S>(
  State(state): State<AppState<S>>,
  method: Method,
  body: Bytes,
) -> Json<Value>
where
  S: RecordStore + 'static,
{
  if method != Method::POST {
    return scan_error(INVALID_METHOD);
  }

  let request: ScanRequest = match serde_json::from_slice(&body) {
    Ok(r) => r,
    Err(e) => {
      warn!(error = %e, "malformed scan payload");
      return scan_error(&e.to_string());
    }
  };
  let Some(qr_data) = request.qr_data else {
    return scan_error(NOT_FOUND);
  };

  match state.registry.verify(&qr_data).await {
    Ok(student) => Json(json!({ "status": "success", "student": student })),
    Err(roster_core::Error::RollNumberNotFound(_)) => scan_error(NOT_FOUND),
    Err(e) => {
      error!(error = %e, "scan lookup failed");
      scan_error(&e.to_string())
    }
  }
}
