//! CSV export, the statistics dashboard and the per-department listing.

use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use roster_api::{
  extract::{Path, Query},
  stats::stats_body,
};
use roster_core::{
  export::CSV_FILE_NAME,
  page::{DEPARTMENT_PAGE_SIZE, Page},
  record::{Choice, Department, Record},
  store::{RecordFilter, RecordStore},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppState, Error};

/// `GET /export-csv/`
pub async fn export_csv<S>(State(state): State<AppState<S>>) -> Result<impl IntoResponse, Error>
where
  S: RecordStore + 'static,
{
  let csv = state.registry.export_csv().await?;
  Ok((
    [
      (header::CONTENT_TYPE, "text/csv".to_owned()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{CSV_FILE_NAME}\""),
      ),
    ],
    csv,
  ))
}

/// `GET /dashboard/`
pub async fn dashboard<S>(State(state): State<AppState<S>>) -> Result<Json<Value>, Error>
where
  S: RecordStore + 'static,
{
  let stats = state.registry.stats().await?;
  Ok(Json(stats_body(&stats)))
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
  pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentView {
  pub students:         Page<Record>,
  pub department:       Department,
  pub department_label: &'static str,
  pub total_count:      u64,
}

/// `GET /department/{department}/[?page=…]`
pub async fn department<S>(
  State(state): State<AppState<S>>,
  Path(department): Path<Department>,
  Query(params): Query<PageParams>,
) -> Result<Json<DepartmentView>, Error>
where
  S: RecordStore + 'static,
{
  let students = state
    .registry
    .list_page(
      &RecordFilter::department(department),
      params.page.as_deref(),
      DEPARTMENT_PAGE_SIZE,
    )
    .await?;

  Ok(Json(DepartmentView {
    total_count: students.total_items,
    department_label: department.label(),
    department,
    students,
  }))
}
