//! Error types for `roster-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::form::FieldErrors;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("record not found: {0}")]
  RecordNotFound(Uuid),

  #[error("no record with roll number {0:?}")]
  RollNumberNotFound(String),

  #[error("invalid submission: {0}")]
  Validation(FieldErrors),

  /// The QR artifact could not be produced; nothing was persisted.
  #[error("artifact generation failed: {0}")]
  Artifact(#[source] BoxError),

  #[error("blob storage error: {0}")]
  Blob(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
