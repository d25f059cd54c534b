//! Form decoding and field validation for [`RecordFields`].
//!
//! Submissions arrive as flat string maps (multipart or urlencoded). Decoding
//! and validation both report per-field messages so a client can show them
//! next to the offending input; nothing is persisted while any remain.

use std::{
  collections::{BTreeMap, HashMap},
  fmt,
};

use chrono::NaiveDate;
use serde::Serialize;

use crate::record::{Choice, Department, Grade, RecordFields, Role};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";
pub const DUPLICATE_ROLL_NO: &str = "A record with this roll number already exists.";

/// Raw submitted form values, keyed by field name.
pub type FormData = HashMap<String, String>;

// ─── FieldErrors ─────────────────────────────────────────────────────────────

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn new() -> Self { Self::default() }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_owned()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// Messages recorded for `field`, empty if none.
  pub fn get(&self, field: &str) -> &[String] {
    self.0.get(field).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn merge(&mut self, other: FieldErrors) {
    for (field, messages) in other.0 {
      self.0.entry(field).or_default().extend(messages);
    }
  }

  pub fn into_result(self) -> Result<(), FieldErrors> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl From<Result<(), FieldErrors>> for FieldErrors {
  fn from(result: Result<(), FieldErrors>) -> Self {
    result.err().unwrap_or_default()
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field}: {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

// ─── Decoding ────────────────────────────────────────────────────────────────

fn text(form: &FormData, key: &str) -> String {
  form.get(key).map(|v| v.trim().to_owned()).unwrap_or_default()
}

fn optional_text(form: &FormData, key: &str) -> Option<String> {
  Some(text(form, key)).filter(|v| !v.is_empty())
}

fn choice<C: Choice>(form: &FormData, key: &str, errors: &mut FieldErrors) -> Option<C> {
  let raw = optional_text(form, key)?;
  match raw.parse::<C>() {
    Ok(value) => Some(value),
    Err(_) => {
      errors.add(
        key,
        format!("Select a valid choice. {raw} is not one of the available choices."),
      );
      None
    }
  }
}

fn date(form: &FormData, key: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
  let raw = optional_text(form, key)?;
  match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
    Ok(d) => Some(d),
    Err(_) => {
      errors.add(key, INVALID_DATE);
      None
    }
  }
}

impl RecordFields {
  /// Decode and validate a submitted form.
  ///
  /// Values are trimmed; blank optional values become `None`. A form that
  /// omits `role` entirely gets [`Role::Student`]; a blank `role` is `None`.
  pub fn from_form(form: &FormData) -> Result<Self, FieldErrors> {
    let mut errors = FieldErrors::new();

    let role = if form.contains_key("role") {
      choice::<Role>(form, "role", &mut errors)
    } else {
      Some(Role::Student)
    };

    let fields = RecordFields {
      role,
      department: choice::<Department>(form, "department", &mut errors),
      student_grade: choice::<Grade>(form, "student_grade", &mut errors),
      student_name: text(form, "student_name"),
      father_name: text(form, "father_name"),
      dob: date(form, "dob", &mut errors),
      contact: optional_text(form, "contact"),
      roll_no: text(form, "roll_no"),
      session: text(form, "session"),
      email: optional_text(form, "email"),
      address: text(form, "address"),
      gender: text(form, "gender"),
      emergency_contact: text(form, "emergency_contact"),
      blood_group: text(form, "blood_group"),
      expiry_date: date(form, "expiry_date", &mut errors),
      id_card_number: text(form, "id_card_number"),
    };

    errors.merge(fields.validate().into());
    errors.into_result().map(|()| fields)
  }

  /// Check required fields, length limits and the email format. Contact is
  /// required on submission even though stored rows may lack it.
  pub fn validate(&self) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let required: [(&str, &str, usize); 9] = [
      ("student_name", &self.student_name, 50),
      ("father_name", &self.father_name, 50),
      ("roll_no", &self.roll_no, 20),
      ("session", &self.session, 20),
      ("address", &self.address, 150),
      ("gender", &self.gender, 10),
      ("emergency_contact", &self.emergency_contact, 15),
      ("blood_group", &self.blood_group, 5),
      ("id_card_number", &self.id_card_number, 20),
    ];
    for (field, value, max) in required {
      if value.trim().is_empty() {
        errors.add(field, REQUIRED);
      } else {
        check_length(&mut errors, field, value, max);
      }
    }

    match &self.contact {
      None => errors.add("contact", REQUIRED),
      Some(contact) => check_length(&mut errors, "contact", contact, 20),
    }
    if let Some(email) = &self.email {
      if !looks_like_email(email) {
        errors.add("email", INVALID_EMAIL);
      }
      check_length(&mut errors, "email", email, 254);
    }

    errors.into_result()
  }
}

fn check_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
  let len = value.chars().count();
  if len > max {
    errors.add(
      field,
      format!("Ensure this value has at most {max} characters (it has {len})."),
    );
  }
}

fn looks_like_email(s: &str) -> bool {
  let Some((local, domain)) = s.rsplit_once('@') else {
    return false;
  };
  !local.is_empty()
    && !local.contains('@')
    && !s.chars().any(char::is_whitespace)
    && domain.contains('.')
    && domain.split('.').all(|label| !label.is_empty())
}
