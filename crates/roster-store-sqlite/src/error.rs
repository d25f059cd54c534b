//! Error type for `roster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored classification code is not part of its vocabulary.
  #[error("unknown {field} code {code:?}")]
  UnknownCode { field: &'static str, code: String },

  /// The unique index on `roll_no` rejected a write.
  #[error("roll number {0:?} is already taken")]
  DuplicateRollNo(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
