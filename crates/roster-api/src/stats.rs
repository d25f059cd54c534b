//! Handler for `GET /students/stats/`.

use std::sync::Arc;

use axum::{Json, extract::State};
use roster_core::{
  artifact::ArtifactRenderer,
  blob::BlobStore,
  registry::{Registry, Stats},
  store::{GroupCount, RecordStore},
};
use serde_json::{Value, json};

use crate::error::ApiError;

/// Render group counts as `[{"<key>": value, "count": n}, …]`.
fn groups(key: &str, counts: &[GroupCount]) -> Value {
  counts
    .iter()
    .map(|g| json!({ key: g.value, "count": g.count }))
    .collect()
}

/// JSON shape of [`Stats`], shared with the dashboard page.
pub fn stats_body(stats: &Stats) -> Value {
  json!({
    "total_students": stats.total_students,
    "by_department":  groups("department", &stats.by_department),
    "by_role":        groups("role", &stats.by_role),
    "by_grade":       groups("student_grade", &stats.by_grade),
  })
}

/// `GET /students/stats/`
pub async fn handler<S, B, R>(
  State(registry): State<Arc<Registry<S, B, R>>>,
) -> Result<Json<Value>, ApiError>
where
  S: RecordStore,
  B: BlobStore,
  R: ArtifactRenderer,
{
  let stats = registry.stats().await?;
  Ok(Json(stats_body(&stats)))
}
