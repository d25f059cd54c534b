//! Record types: the single entity of the Roster store.
//!
//! A record is a student, teacher or staff profile. Its editable content lives
//! in [`RecordFields`]; identity, audit timestamps and the two binary
//! artifacts are owned by the store and the registry.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumMessage, EnumString, IntoEnumIterator, IntoStaticStr};
use uuid::Uuid;

use crate::blob::BlobRef;

// ─── Closed vocabularies ─────────────────────────────────────────────────────

/// A closed-vocabulary classification field.
///
/// The code (`"college_staff"`) is what gets stored and serialised; the label
/// (`"College Staff"`) is for display.
pub trait Choice:
  Copy + Into<&'static str> + FromStr + IntoEnumIterator + EnumMessage
{
  fn code(self) -> &'static str { self.into() }

  fn label(self) -> &'static str {
    self.get_message().unwrap_or_else(|| self.code())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  EnumIter,
  EnumMessage,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  #[strum(message = "Student")]
  Student,
  #[strum(message = "Teacher")]
  Teacher,
  #[strum(message = "College Staff")]
  CollegeStaff,
}

impl Choice for Role {}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  EnumIter,
  EnumMessage,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Department {
  #[strum(message = "Computer")]
  Computer,
  #[strum(message = "Economics")]
  Economics,
  #[strum(message = "English")]
  English,
  #[strum(message = "Mathematics")]
  Mathematics,
  #[strum(message = "Chemistry")]
  Chemistry,
}

impl Choice for Department {}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  EnumIter,
  EnumMessage,
  IntoStaticStr,
)]
pub enum Grade {
  #[serde(rename = "fsc 1st year")]
  #[strum(serialize = "fsc 1st year", message = "Fsc 1st year")]
  FscFirstYear,
  #[serde(rename = "fsc 2nd year")]
  #[strum(serialize = "fsc 2nd year", message = "Fsc 2nd year")]
  FscSecondYear,
  #[serde(rename = "bachelor")]
  #[strum(serialize = "bachelor", message = "Bachelor")]
  Bachelor,
}

impl Choice for Grade {}

/// One `{value, label}` pair, as offered to a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceEntry {
  pub value: &'static str,
  pub label: &'static str,
}

/// Every variant of `C`, in declaration order.
pub fn choices<C: Choice>() -> Vec<ChoiceEntry> {
  C::iter()
    .map(|c| ChoiceEntry { value: c.code(), label: c.label() })
    .collect()
}

// ─── Editable content ────────────────────────────────────────────────────────

/// Every field a client may set. Updates replace all of them at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
  pub role:              Option<Role>,
  pub department:        Option<Department>,
  pub student_grade:     Option<Grade>,
  /// Display name; also names the QR artifact file.
  pub student_name:      String,
  pub father_name:       String,
  pub dob:               Option<NaiveDate>,
  pub contact:           Option<String>,
  /// External natural key, encoded into the QR artifact.
  pub roll_no:           String,
  pub session:           String,
  pub email:             Option<String>,
  pub address:           String,
  pub gender:            String,
  pub emergency_contact: String,
  pub blood_group:       String,
  pub expiry_date:       Option<NaiveDate>,
  pub id_card_number:    String,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  pub id:              Uuid,
  #[serde(flatten)]
  pub fields:          RecordFields,
  pub photo:           BlobRef,
  /// Rendering of `fields.roll_no`; never written by clients.
  pub qr_code:         BlobRef,
  /// Fixed at creation.
  pub card_issue_date: NaiveDate,
  /// Server-assigned; never changes after creation.
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Record {
  pub fn projection(&self) -> RecordProjection {
    RecordProjection {
      name:       self.fields.student_name.clone(),
      department: self.fields.department,
      roll_no:    self.fields.roll_no.clone(),
    }
  }
}

/// The minimal view returned by a QR scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordProjection {
  pub name:       String,
  pub department: Option<Department>,
  pub roll_no:    String,
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::insert`] and the replacement content
/// for [`crate::store::RecordStore::update`]. Identity and timestamps are
/// always set by the store.
#[derive(Debug, Clone)]
pub struct NewRecord {
  pub fields:  RecordFields,
  pub photo:   BlobRef,
  pub qr_code: BlobRef,
}
