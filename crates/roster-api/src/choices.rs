//! Handler for `GET /choices/`: the closed vocabularies with their labels.

use axum::Json;
use roster_core::record::{ChoiceEntry, Department, Grade, Role, choices};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Choices {
  pub role:          Vec<ChoiceEntry>,
  pub department:    Vec<ChoiceEntry>,
  pub student_grade: Vec<ChoiceEntry>,
}

/// `GET /choices/`
pub async fn handler() -> Json<Choices> {
  Json(Choices {
    role:          choices::<Role>(),
    department:    choices::<Department>(),
    student_grade: choices::<Grade>(),
  })
}
