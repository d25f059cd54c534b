//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::{SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use roster_core::{
  record::{NewRecord, Record},
  store::{GroupCount, GroupField, RecordFilter, RecordQuery, RecordStore},
};

use crate::{
  Error, Result,
  encode::{COLUMNS, RawRecord, encode_choice, encode_uuid},
  schema::SCHEMA,
};

const INSERT: &str = "INSERT INTO records (
    id, role, department, student_grade, student_name, father_name, dob, contact,
    roll_no, session, email, address, gender, emergency_contact, blood_group,
    expiry_date, id_card_number, photo_path, photo_hash, photo_type, qr_path,
    qr_hash, qr_type, card_issue_date, created_at, updated_at
  ) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
    ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26
  )";

const UPDATE: &str = "UPDATE records SET
    role = ?2, department = ?3, student_grade = ?4, student_name = ?5,
    father_name = ?6, dob = ?7, contact = ?8, roll_no = ?9, session = ?10,
    email = ?11, address = ?12, gender = ?13, emergency_contact = ?14,
    blood_group = ?15, expiry_date = ?16, id_card_number = ?17,
    photo_path = ?18, photo_hash = ?19, photo_type = ?20,
    qr_path = ?21, qr_hash = ?22, qr_type = ?23,
    card_issue_date = ?24, created_at = ?25, updated_at = ?26
  WHERE id = ?1";

/// `WHERE` body shared by listing and counting. `?1` department, `?2` role,
/// `?3` an escaped `LIKE` pattern; a NULL parameter disables its condition.
const FILTER: &str = "(?1 IS NULL OR department = ?1)
   AND (?2 IS NULL OR role = ?2)
   AND (?3 IS NULL
        OR student_name LIKE ?3 ESCAPE '\\'
        OR department   LIKE ?3 ESCAPE '\\'
        OR roll_no      LIKE ?3 ESCAPE '\\')";

/// Newest first; `rowid` breaks ties between identical timestamps.
const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch at most one row matching `column = value`.
  async fn select_one(&self, column: &'static str, value: String) -> Result<Option<Record>> {
    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COLUMNS} FROM records WHERE {column} = ?1"),
              rusqlite::params![value],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  /// Run `sql` (either [`INSERT`] or [`UPDATE`]) with every column of `raw`
  /// bound. Returns the number of rows changed.
  async fn write(&self, sql: &'static str, raw: RawRecord) -> Result<usize> {
    let roll_no = raw.roll_no.clone();
    self
      .conn
      .call(move |conn| {
        let r = &raw;
        Ok(conn.execute(
          sql,
          rusqlite::params![
            r.id,
            r.role,
            r.department,
            r.student_grade,
            r.student_name,
            r.father_name,
            r.dob,
            r.contact,
            r.roll_no,
            r.session,
            r.email,
            r.address,
            r.gender,
            r.emergency_contact,
            r.blood_group,
            r.expiry_date,
            r.id_card_number,
            r.photo_path,
            r.photo_hash,
            r.photo_type,
            r.qr_path,
            r.qr_hash,
            r.qr_type,
            r.card_issue_date,
            r.created_at,
            r.updated_at,
          ],
        )?)
      })
      .await
      .map_err(|e| write_error(e, roll_no))
  }
}

/// Turn a unique-index violation into [`Error::DuplicateRollNo`].
fn write_error(e: tokio_rusqlite::Error, roll_no: String) -> Error {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, _)) = &e
    && failure.code == rusqlite::ErrorCode::ConstraintViolation
  {
    return Error::DuplicateRollNo(roll_no);
  }
  Error::Database(e)
}

/// Escape `LIKE` wildcards in `text` and wrap it for substring matching.
fn like_pattern(text: &str) -> String {
  let mut pattern = String::with_capacity(text.len() + 2);
  pattern.push('%');
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

/// Owned bind values for [`FILTER`].
fn filter_params(filter: &RecordFilter) -> (Option<String>, Option<String>, Option<String>) {
  (
    encode_choice(filter.department),
    encode_choice(filter.role),
    filter.search.as_deref().map(like_pattern),
  )
}

fn group_column(field: GroupField) -> &'static str {
  match field {
    GroupField::Department => "department",
    GroupField::Role => "role",
    GroupField::Grade => "student_grade",
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn insert(&self, input: NewRecord) -> Result<Record> {
    // Stored timestamps carry microseconds; truncate so the returned record
    // equals what a later read yields.
    let now = Utc::now().trunc_subsecs(6);
    let record = Record {
      id:              Uuid::new_v4(),
      fields:          input.fields,
      photo:           input.photo,
      qr_code:         input.qr_code,
      card_issue_date: now.date_naive(),
      created_at:      now,
      updated_at:      now,
    };

    self.write(INSERT, RawRecord::from_record(&record)).await?;
    Ok(record)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Record>> {
    self.select_one("id", encode_uuid(id)).await
  }

  async fn find_by_roll_no(&self, roll_no: &str) -> Result<Option<Record>> {
    self.select_one("roll_no", roll_no.to_owned()).await
  }

  async fn update(&self, id: Uuid, replacement: NewRecord) -> Result<Option<Record>> {
    let Some(current) = self.get(id).await? else {
      return Ok(None);
    };

    let record = Record {
      fields: replacement.fields,
      photo: replacement.photo,
      qr_code: replacement.qr_code,
      updated_at: Utc::now().trunc_subsecs(6),
      ..current
    };

    let changed = self.write(UPDATE, RawRecord::from_record(&record)).await?;
    Ok((changed > 0).then_some(record))
  }

  async fn delete(&self, id: Uuid) -> Result<Option<Record>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = tx
          .query_row(
            &format!("SELECT {COLUMNS} FROM records WHERE id = ?1"),
            rusqlite::params![id_str],
            RawRecord::from_row,
          )
          .optional()?;
        if raw.is_some() {
          tx.execute("DELETE FROM records WHERE id = ?1", rusqlite::params![id_str])?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn list(&self, query: &RecordQuery) -> Result<Vec<Record>> {
    let (department, role, pattern) = filter_params(&query.filter);
    // SQLite treats a negative LIMIT as "no limit".
    let limit = query.limit.map_or(-1, |l| l as i64);
    let offset = query.offset as i64;

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COLUMNS} FROM records WHERE {FILTER} {NEWEST_FIRST} LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![department, role, pattern, limit, offset],
            RawRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn count(&self, filter: &RecordFilter) -> Result<u64> {
    let (department, role, pattern) = filter_params(filter);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!("SELECT COUNT(*) FROM records WHERE {FILTER}"),
          rusqlite::params![department, role, pattern],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(n as u64)
  }

  async fn count_by(&self, field: GroupField) -> Result<Vec<GroupCount>> {
    let column = group_column(field);

    let groups = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {column}, COUNT(*) AS n FROM records GROUP BY {column} ORDER BY n DESC, {column}"
        ))?;
        let rows = stmt
          .query_map([], |row| {
            Ok(GroupCount {
              value: row.get(0)?,
              count: row.get::<_, i64>(1)? as u64,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(groups)
  }
}
