//! In-memory trait implementations for unit tests.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  artifact::ArtifactRenderer,
  blob::{BlobKind, BlobRef, BlobStore, Upload},
  record::{Choice, Department, Grade, NewRecord, Record, RecordFields, Role},
  store::{GroupCount, GroupField, RecordFilter, RecordQuery, RecordStore},
};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub String);

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub fn sample_fields(name: &str, roll_no: &str) -> RecordFields {
  RecordFields {
    role:              Some(Role::Student),
    department:        Some(Department::Computer),
    student_grade:     Some(Grade::FscFirstYear),
    student_name:      name.into(),
    father_name:       "Father".into(),
    dob:               NaiveDate::from_ymd_opt(2001, 2, 3),
    contact:           Some("0300".into()),
    roll_no:           roll_no.into(),
    session:           "2024-2025".into(),
    email:             Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
    address:           "Somewhere".into(),
    gender:            "Female".into(),
    emergency_contact: "0311".into(),
    blood_group:       "O+".into(),
    expiry_date:       None,
    id_card_number:    "ID-1".into(),
  }
}

pub fn sample_record(name: &str, roll_no: &str) -> Record {
  let now = Utc::now();
  let blob = |path: &str| BlobRef {
    path:         path.into(),
    content_hash: String::new(),
    media_type:   "image/png".into(),
  };
  Record {
    id:              Uuid::new_v4(),
    fields:          sample_fields(name, roll_no),
    photo:           blob("images/photo.png"),
    qr_code:         blob("qrcodes/qr.png"),
    card_issue_date: now.date_naive(),
    created_at:      now,
    updated_at:      now,
  }
}

pub fn upload() -> Upload {
  Upload {
    file_name:  "photo.png".into(),
    media_type: "image/png".into(),
    bytes:      b"not really a png".to_vec(),
  }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Renders `payload` as `QR:<payload>`; refuses [`Self::UNRENDERABLE`].
pub struct TextRenderer;

impl TextRenderer {
  pub const UNRENDERABLE: &'static str = "UNRENDERABLE";
}

impl ArtifactRenderer for TextRenderer {
  type Error = FakeError;

  fn render(&self, payload: &str) -> Result<Vec<u8>, FakeError> {
    if payload == Self::UNRENDERABLE {
      return Err(FakeError("payload cannot be encoded".into()));
    }
    Ok(format!("QR:{payload}").into_bytes())
  }

  fn media_type(&self) -> &'static str { "image/png" }
}

// ─── Blobs ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBlobs {
  files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobs {
  pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
    self.files.lock().unwrap().get(path).cloned()
  }

  pub fn len(&self) -> usize { self.files.lock().unwrap().len() }
}

impl BlobStore for MemoryBlobs {
  type Error = FakeError;

  async fn put(
    &self,
    kind: BlobKind,
    file_name: &str,
    media_type: &str,
    bytes: &[u8],
  ) -> Result<BlobRef, FakeError> {
    let mut files = self.files.lock().unwrap();
    let mut path = format!("{}/{file_name}", kind.dir());
    while files.contains_key(&path) {
      path = format!("{}/{}_{file_name}", kind.dir(), &Uuid::new_v4().simple().to_string()[..7]);
    }
    files.insert(path.clone(), bytes.to_vec());
    Ok(BlobRef {
      path,
      content_hash: format!("{:x}", bytes.len()),
      media_type: media_type.into(),
    })
  }

  async fn remove(&self, blob: &BlobRef) -> Result<(), FakeError> {
    self.files.lock().unwrap().remove(&blob.path);
    Ok(())
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Records in insertion order; listings reverse it.
#[derive(Default)]
pub struct MemoryStore {
  records:     Mutex<Vec<Record>>,
  fail_writes: AtomicBool,
}

impl MemoryStore {
  pub fn fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }

  fn check_writable(&self) -> Result<(), FakeError> {
    if self.fail_writes.load(Ordering::SeqCst) {
      Err(FakeError("store is read-only".into()))
    } else {
      Ok(())
    }
  }
}

fn matches(filter: &RecordFilter, record: &Record) -> bool {
  let f = &record.fields;
  if filter.department.is_some() && filter.department != f.department {
    return false;
  }
  if filter.role.is_some() && filter.role != f.role {
    return false;
  }
  if let Some(text) = &filter.search {
    let needle = text.to_lowercase();
    let department = f.department.map(Choice::code).unwrap_or_default();
    return [f.student_name.as_str(), department, f.roll_no.as_str()]
      .iter()
      .any(|hay| hay.to_lowercase().contains(&needle));
  }
  true
}

impl RecordStore for MemoryStore {
  type Error = FakeError;

  async fn insert(&self, input: NewRecord) -> Result<Record, FakeError> {
    self.check_writable()?;
    let now = Utc::now();
    let record = Record {
      id:              Uuid::new_v4(),
      fields:          input.fields,
      photo:           input.photo,
      qr_code:         input.qr_code,
      card_issue_date: now.date_naive(),
      created_at:      now,
      updated_at:      now,
    };
    self.records.lock().unwrap().push(record.clone());
    Ok(record)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Record>, FakeError> {
    Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).cloned())
  }

  async fn find_by_roll_no(&self, roll_no: &str) -> Result<Option<Record>, FakeError> {
    Ok(
      self
        .records
        .lock()
        .unwrap()
        .iter()
        .find(|r| r.fields.roll_no == roll_no)
        .cloned(),
    )
  }

  async fn update(&self, id: Uuid, replacement: NewRecord) -> Result<Option<Record>, FakeError> {
    self.check_writable()?;
    let mut records = self.records.lock().unwrap();
    let Some(record) = records.iter_mut().find(|r| r.id == id) else {
      return Ok(None);
    };
    record.fields = replacement.fields;
    record.photo = replacement.photo;
    record.qr_code = replacement.qr_code;
    record.updated_at = Utc::now();
    Ok(Some(record.clone()))
  }

  async fn delete(&self, id: Uuid) -> Result<Option<Record>, FakeError> {
    self.check_writable()?;
    let mut records = self.records.lock().unwrap();
    let pos = records.iter().position(|r| r.id == id);
    Ok(pos.map(|i| records.remove(i)))
  }

  async fn list(&self, query: &RecordQuery) -> Result<Vec<Record>, FakeError> {
    let records = self.records.lock().unwrap();
    Ok(
      records
        .iter()
        .rev()
        .filter(|r| matches(&query.filter, r))
        .skip(query.offset)
        .take(query.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect(),
    )
  }

  async fn count(&self, filter: &RecordFilter) -> Result<u64, FakeError> {
    let records = self.records.lock().unwrap();
    Ok(records.iter().filter(|r| matches(filter, r)).count() as u64)
  }

  async fn count_by(&self, field: GroupField) -> Result<Vec<GroupCount>, FakeError> {
    let records = self.records.lock().unwrap();
    let mut counts: HashMap<Option<&'static str>, u64> = HashMap::new();
    for r in records.iter() {
      let key = match field {
        GroupField::Department => r.fields.department.map(Choice::code),
        GroupField::Role => r.fields.role.map(Choice::code),
        GroupField::Grade => r.fields.student_grade.map(Choice::code),
      };
      *counts.entry(key).or_default() += 1;
    }
    let mut out: Vec<GroupCount> = counts
      .into_iter()
      .map(|(value, count)| GroupCount { value: value.map(str::to_owned), count })
      .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    Ok(out)
  }
}
