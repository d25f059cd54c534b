//! Encoding and decoding helpers between Roster domain types and the plain
//! text stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with a fixed six-digit fraction and a `Z` suffix,
//! so lexicographic order equals chronological order. Dates are `YYYY-MM-DD`.
//! Classification fields are stored as their codes. UUIDs are hyphenated
//! lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use roster_core::{
  blob::BlobRef,
  record::{Choice, Record, RecordFields},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Choices ─────────────────────────────────────────────────────────────────

pub fn encode_choice<C: Choice>(c: Option<C>) -> Option<String> {
  c.map(|c| c.code().to_owned())
}

pub fn decode_choice<C: Choice>(field: &'static str, s: Option<String>) -> Result<Option<C>> {
  s.map(|code| {
    code
      .parse::<C>()
      .map_err(|_| Error::UnknownCode { field, code: code.clone() })
  })
  .transpose()
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` against `records`, in [`RawRecord`]
/// field order.
pub const COLUMNS: &str = "id, role, department, student_grade, student_name, father_name, \
   dob, contact, roll_no, session, email, address, gender, emergency_contact, blood_group, \
   expiry_date, id_card_number, photo_path, photo_hash, photo_type, qr_path, qr_hash, \
   qr_type, card_issue_date, created_at, updated_at";

/// Raw strings of one `records` row.
pub struct RawRecord {
  pub id:                String,
  pub role:              Option<String>,
  pub department:        Option<String>,
  pub student_grade:     Option<String>,
  pub student_name:      String,
  pub father_name:       String,
  pub dob:               Option<String>,
  pub contact:           Option<String>,
  pub roll_no:           String,
  pub session:           String,
  pub email:             Option<String>,
  pub address:           String,
  pub gender:            String,
  pub emergency_contact: String,
  pub blood_group:       String,
  pub expiry_date:       Option<String>,
  pub id_card_number:    String,
  pub photo_path:        String,
  pub photo_hash:        String,
  pub photo_type:        String,
  pub qr_path:           String,
  pub qr_hash:           String,
  pub qr_type:           String,
  pub card_issue_date:   String,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawRecord {
  /// Read a row selected with [`COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      role:              row.get(1)?,
      department:        row.get(2)?,
      student_grade:     row.get(3)?,
      student_name:      row.get(4)?,
      father_name:       row.get(5)?,
      dob:               row.get(6)?,
      contact:           row.get(7)?,
      roll_no:           row.get(8)?,
      session:           row.get(9)?,
      email:             row.get(10)?,
      address:           row.get(11)?,
      gender:            row.get(12)?,
      emergency_contact: row.get(13)?,
      blood_group:       row.get(14)?,
      expiry_date:       row.get(15)?,
      id_card_number:    row.get(16)?,
      photo_path:        row.get(17)?,
      photo_hash:        row.get(18)?,
      photo_type:        row.get(19)?,
      qr_path:           row.get(20)?,
      qr_hash:           row.get(21)?,
      qr_type:           row.get(22)?,
      card_issue_date:   row.get(23)?,
      created_at:        row.get(24)?,
      updated_at:        row.get(25)?,
    })
  }

  pub fn from_record(record: &Record) -> Self {
    let f = &record.fields;
    Self {
      id:                encode_uuid(record.id),
      role:              encode_choice(f.role),
      department:        encode_choice(f.department),
      student_grade:     encode_choice(f.student_grade),
      student_name:      f.student_name.clone(),
      father_name:       f.father_name.clone(),
      dob:               f.dob.map(encode_date),
      contact:           f.contact.clone(),
      roll_no:           f.roll_no.clone(),
      session:           f.session.clone(),
      email:             f.email.clone(),
      address:           f.address.clone(),
      gender:            f.gender.clone(),
      emergency_contact: f.emergency_contact.clone(),
      blood_group:       f.blood_group.clone(),
      expiry_date:       f.expiry_date.map(encode_date),
      id_card_number:    f.id_card_number.clone(),
      photo_path:        record.photo.path.clone(),
      photo_hash:        record.photo.content_hash.clone(),
      photo_type:        record.photo.media_type.clone(),
      qr_path:           record.qr_code.path.clone(),
      qr_hash:           record.qr_code.content_hash.clone(),
      qr_type:           record.qr_code.media_type.clone(),
      card_issue_date:   encode_date(record.card_issue_date),
      created_at:        encode_dt(record.created_at),
      updated_at:        encode_dt(record.updated_at),
    }
  }

  pub fn into_record(self) -> Result<Record> {
    let fields = RecordFields {
      role:              decode_choice("role", self.role)?,
      department:        decode_choice("department", self.department)?,
      student_grade:     decode_choice("student_grade", self.student_grade)?,
      student_name:      self.student_name,
      father_name:       self.father_name,
      dob:               self.dob.as_deref().map(decode_date).transpose()?,
      contact:           self.contact,
      roll_no:           self.roll_no,
      session:           self.session,
      email:             self.email,
      address:           self.address,
      gender:            self.gender,
      emergency_contact: self.emergency_contact,
      blood_group:       self.blood_group,
      expiry_date:       self.expiry_date.as_deref().map(decode_date).transpose()?,
      id_card_number:    self.id_card_number,
    };

    Ok(Record {
      id: decode_uuid(&self.id)?,
      fields,
      photo: BlobRef {
        path:         self.photo_path,
        content_hash: self.photo_hash,
        media_type:   self.photo_type,
      },
      qr_code: BlobRef {
        path:         self.qr_path,
        content_hash: self.qr_hash,
        media_type:   self.qr_type,
      },
      card_issue_date: decode_date(&self.card_issue_date)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
