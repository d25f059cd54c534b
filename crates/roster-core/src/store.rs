//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! It is a plain repository: artifact generation and blob cleanup are the
//! registry's job, not the store's.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{Department, NewRecord, Record, Role};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Which records a listing or count covers. All set conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
  pub department: Option<Department>,
  pub role:       Option<Role>,
  /// Case-insensitive substring over name, department code and roll number.
  pub search:     Option<String>,
}

impl RecordFilter {
  pub fn department(department: Department) -> Self {
    Self { department: Some(department), ..Self::default() }
  }
}

/// Parameters for [`RecordStore::list`]. Results are always newest first.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
  pub filter: RecordFilter,
  pub limit:  Option<usize>,
  pub offset: usize,
}

/// A classification column records can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
  Department,
  Role,
  Grade,
}

/// Number of records sharing one value of a [`GroupField`]. `value` is the
/// stored code, or `None` for records without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
  pub value: Option<String>,
  pub count: u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Roster record store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new record. The store assigns the id, `created_at`,
  /// `updated_at` and `card_issue_date`.
  fn insert(
    &self,
    input: NewRecord,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + '_;

  /// Exact-match lookup on the roll number.
  fn find_by_roll_no<'a>(
    &'a self,
    roll_no: &'a str,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a;

  /// Replace the editable fields and artifact references of a record and
  /// refresh `updated_at`. `created_at` and `card_issue_date` are untouched.
  /// Returns `None` if the record does not exist.
  fn update(
    &self,
    id: Uuid,
    replacement: NewRecord,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + '_;

  /// Delete a record and return the removed row, or `None` if it did not
  /// exist.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + '_;

  /// Records matching `query.filter`, newest first, windowed by
  /// `limit`/`offset`.
  fn list<'a>(
    &'a self,
    query: &'a RecordQuery,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;

  /// Number of records matching `filter`.
  fn count<'a>(
    &'a self,
    filter: &'a RecordFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Record counts grouped by `field`, largest group first.
  fn count_by(
    &self,
    field: GroupField,
  ) -> impl Future<Output = Result<Vec<GroupCount>, Self::Error>> + Send + '_;
}
