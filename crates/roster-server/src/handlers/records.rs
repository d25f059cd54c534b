//! Record pages: listing, details, card, and the add/update/delete forms.

use axum::{
  Json,
  extract::{Multipart, State},
  response::Redirect,
};
use roster_api::{
  ApiError,
  extract::{Path, Query},
  form::Submission,
};
use roster_core::{
  page::{HOME_PAGE_SIZE, Page},
  record::Record,
  store::{RecordFilter, RecordStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::media_url;
use crate::{AppState, Error};

// ─── Listing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HomeParams {
  pub search: Option<String>,
  /// Kept raw: a malformed value must not reject the request.
  pub page:   Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HomeView {
  pub students: Page<Record>,
  pub search:   Option<String>,
}

/// `GET /home/[?search=…][&page=…]`
pub async fn home<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<HomeParams>,
) -> Result<Json<HomeView>, Error>
where
  S: RecordStore + 'static,
{
  let search = params
    .search
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty());
  let filter = RecordFilter { search: search.clone(), ..RecordFilter::default() };

  let students = state
    .registry
    .list_page(&filter, params.page.as_deref(), HOME_PAGE_SIZE)
    .await?;
  Ok(Json(HomeView { students, search }))
}

// ─── Single record ───────────────────────────────────────────────────────────

/// `GET /full-details/{id}/`
pub async fn full_details<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Record>, Error>
where
  S: RecordStore + 'static,
{
  Ok(Json(state.registry.get(id).await?))
}

#[derive(Debug, Serialize)]
pub struct CardView {
  pub student:     Record,
  pub photo_url:   String,
  pub qr_code_url: String,
}

/// `GET /generate-card/{id}/`: everything an identity card shows.
pub async fn generate_card<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CardView>, Error>
where
  S: RecordStore + 'static,
{
  let student = state.registry.get(id).await?;
  Ok(Json(CardView {
    photo_url: media_url(&student.photo),
    qr_code_url: media_url(&student.qr_code),
    student,
  }))
}

// ─── Forms ───────────────────────────────────────────────────────────────────

/// `POST /add-user/`
pub async fn add_user<S>(
  State(state): State<AppState<S>>,
  multipart: Multipart,
) -> Result<Redirect, Error>
where
  S: RecordStore + 'static,
{
  let (fields, photo) = Submission::read(multipart)
    .await?
    .into_parts()
    .map_err(ApiError::Invalid)?;
  state.registry.create(fields, photo).await?;
  Ok(Redirect::to("/home/"))
}

/// `POST /update-student/{id}/`
pub async fn update_student<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  multipart: Multipart,
) -> Result<Redirect, Error>
where
  S: RecordStore + 'static,
{
  // 404 before reading the body.
  state.registry.get(id).await?;
  let (fields, photo) = Submission::read(multipart)
    .await?
    .into_parts()
    .map_err(ApiError::Invalid)?;
  state.registry.update(id, fields, photo).await?;
  Ok(Redirect::to("/home/"))
}

#[derive(Debug, Serialize)]
pub struct DeleteView {
  pub student: Record,
}

/// `GET /delete-student/{id}/`: the record to confirm.
pub async fn confirm_delete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DeleteView>, Error>
where
  S: RecordStore + 'static,
{
  Ok(Json(DeleteView { student: state.registry.get(id).await? }))
}

/// `POST /delete-student/{id}/`
pub async fn delete_student<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Redirect, Error>
where
  S: RecordStore + 'static,
{
  state.registry.delete(id).await?;
  Ok(Redirect::to("/home/"))
}
