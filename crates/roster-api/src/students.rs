//! Handlers for `/students` endpoints.
//!
//! | Method   | Path              | Notes |
//! |----------|-------------------|-------|
//! | `GET`    | `/students/`      | Optional `?department=…&role=…`; newest first |
//! | `POST`   | `/students/`      | Multipart form with a `photo` file; 201 |
//! | `GET`    | `/students/{id}/` | 404 if not found |
//! | `PUT`    | `/students/{id}/` | Multipart full replace; `photo` optional |
//! | `DELETE` | `/students/{id}/` | 204; 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Multipart, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  artifact::ArtifactRenderer,
  blob::BlobStore,
  record::{Choice, Record},
  registry::Registry,
  store::{RecordFilter, RecordStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{Path, Query},
  form::Submission,
};

type Shared<S, B, R> = State<Arc<Registry<S, B, R>>>;

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub department: Option<String>,
  pub role:       Option<String>,
}

/// Parse an optional query value into a vocabulary member. A blank value
/// means "no filter".
pub fn parse_choice<C: Choice>(field: &str, raw: Option<&str>) -> Result<Option<C>, ApiError> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(code) => code
      .parse::<C>()
      .map(Some)
      .map_err(|_| ApiError::BadRequest(format!("unknown {field} {code:?}"))),
  }
}

/// `GET /students/[?department=<code>][&role=<code>]`
pub async fn list<S, B, R>(
  State(registry): Shared<S, B, R>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Record>>, ApiError>
where
  S: RecordStore,
  B: BlobStore,
  R: ArtifactRenderer,
{
  let filter = RecordFilter {
    department: parse_choice("department", params.department.as_deref())?,
    role: parse_choice("role", params.role.as_deref())?,
    search: None,
  };
  Ok(Json(registry.list_all(&filter).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /students/`: multipart body.
pub async fn create<S, B, R>(
  State(registry): Shared<S, B, R>,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
  B: BlobStore,
  R: ArtifactRenderer,
{
  let (fields, photo) = Submission::read(multipart)
    .await?
    .into_parts()
    .map_err(ApiError::Invalid)?;
  let record = registry.create(fields, photo).await?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /students/{id}/`
pub async fn get_one<S, B, R>(
  State(registry): Shared<S, B, R>,
  Path(id): Path<Uuid>,
) -> Result<Json<Record>, ApiError>
where
  S: RecordStore,
  B: BlobStore,
  R: ArtifactRenderer,
{
  Ok(Json(registry.get(id).await?))
}

// ─── Replace ─────────────────────────────────────────────────────────────────

/// `PUT /students/{id}/`: every editable field is replaced; omitting
/// `photo` keeps the current one.
pub async fn replace<S, B, R>(
  State(registry): Shared<S, B, R>,
  Path(id): Path<Uuid>,
  multipart: Multipart,
) -> Result<Json<Record>, ApiError>
where
  S: RecordStore,
  B: BlobStore,
  R: ArtifactRenderer,
{
  let (fields, photo) = Submission::read(multipart)
    .await?
    .into_parts()
    .map_err(ApiError::Invalid)?;
  Ok(Json(registry.update(id, fields, photo).await?))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /students/{id}/`
pub async fn delete<S, B, R>(
  State(registry): Shared<S, B, R>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore,
  B: BlobStore,
  R: ArtifactRenderer,
{
  registry.delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
