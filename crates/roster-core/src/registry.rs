//! [`Registry`]: the record service every endpoint goes through.
//!
//! The registry owns the one non-trivial contract of the system: a record's
//! QR artifact is rendered from its roll number at creation, re-rendered on
//! update only when the roll number changed, and both artifacts are released
//! when the record is deleted. Files written for an operation that then fails
//! are removed again, so an aborted save leaves no orphaned blobs.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  artifact::{ArtifactRenderer, qr_file_name},
  blob::{BlobKind, BlobRef, BlobStore, Upload},
  export::build_csv,
  form::{DUPLICATE_ROLL_NO, EMPTY_FILE, FieldErrors, REQUIRED},
  page::{self, Page},
  record::{NewRecord, Record, RecordFields, RecordProjection},
  store::{GroupCount, GroupField, RecordFilter, RecordQuery, RecordStore},
};

/// Aggregate counts, computed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
  pub total_students: u64,
  pub by_department:  Vec<GroupCount>,
  pub by_role:        Vec<GroupCount>,
  pub by_grade:       Vec<GroupCount>,
}

fn store_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Store(Box::new(e))
}

fn blob_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Blob(Box::new(e))
}

/// Record operations over a store `S`, a blob store `B` and a QR renderer `R`.
pub struct Registry<S, B, R> {
  store:    S,
  blobs:    B,
  renderer: R,
}

impl<S, B, R> Registry<S, B, R>
where
  S: RecordStore,
  B: BlobStore,
  R: ArtifactRenderer,
{
  pub fn new(store: S, blobs: B, renderer: R) -> Self {
    Self { store, blobs, renderer }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn blobs(&self) -> &B { &self.blobs }

  // ── Writes ──────────────────────────────────────────────────────────────

  /// Validate, render the QR artifact, store both files and insert the row.
  pub async fn create(&self, fields: RecordFields, photo: Option<Upload>) -> Result<Record> {
    let mut errors = FieldErrors::from(fields.validate());
    let photo = match photo {
      Some(p) if !p.bytes.is_empty() => Some(p),
      Some(_) => {
        errors.add("photo", EMPTY_FILE);
        None
      }
      None => {
        errors.add("photo", REQUIRED);
        None
      }
    };
    self.check_roll_no(&fields.roll_no, None, &mut errors).await?;
    let (Some(photo), true) = (photo, errors.is_empty()) else {
      return Err(Error::Validation(errors));
    };

    let qr_png = self.render_qr(&fields.roll_no)?;

    let photo_ref = self
      .put(BlobKind::Photo, &photo.file_name, &photo.media_type, &photo.bytes)
      .await?;
    let qr_ref = match self
      .put(
        BlobKind::QrCode,
        &qr_file_name(&fields.student_name),
        self.renderer.media_type(),
        &qr_png,
      )
      .await
    {
      Ok(r) => r,
      Err(e) => {
        self.release(&[photo_ref]).await;
        return Err(e);
      }
    };

    let input = NewRecord { fields, photo: photo_ref.clone(), qr_code: qr_ref.clone() };
    let record = match self.store.insert(input).await {
      Ok(r) => r,
      Err(e) => {
        self.release(&[photo_ref, qr_ref]).await;
        return Err(store_error(e));
      }
    };

    info!(record_id = %record.id, roll_no = %record.fields.roll_no, "record created");
    Ok(record)
  }

  /// Replace the editable fields of record `id`.
  ///
  /// The QR artifact is re-rendered only if the roll number differs from the
  /// stored one; otherwise the existing file is kept untouched. `photo` is
  /// optional: `None` keeps the current photo.
  pub async fn update(
    &self,
    id: Uuid,
    fields: RecordFields,
    photo: Option<Upload>,
  ) -> Result<Record> {
    let current = self
      .store
      .get(id)
      .await
      .map_err(store_error)?
      .ok_or(Error::RecordNotFound(id))?;

    let mut errors = FieldErrors::from(fields.validate());
    if let Some(p) = &photo
      && p.bytes.is_empty()
    {
      errors.add("photo", EMPTY_FILE);
    }
    self.check_roll_no(&fields.roll_no, Some(id), &mut errors).await?;
    if !errors.is_empty() {
      return Err(Error::Validation(errors));
    }

    let mut fresh: Vec<BlobRef> = Vec::new();

    let qr_code = if fields.roll_no != current.fields.roll_no {
      let qr_png = self.render_qr(&fields.roll_no)?;
      let r = self
        .put(
          BlobKind::QrCode,
          &qr_file_name(&fields.student_name),
          self.renderer.media_type(),
          &qr_png,
        )
        .await?;
      fresh.push(r.clone());
      r
    } else {
      current.qr_code.clone()
    };

    let photo_ref = match photo {
      Some(upload) => {
        match self
          .put(BlobKind::Photo, &upload.file_name, &upload.media_type, &upload.bytes)
          .await
        {
          Ok(r) => {
            fresh.push(r.clone());
            r
          }
          Err(e) => {
            self.release(&fresh).await;
            return Err(e);
          }
        }
      }
      None => current.photo.clone(),
    };

    let replacement = NewRecord { fields, photo: photo_ref, qr_code };
    let updated = match self.store.update(id, replacement).await {
      Ok(Some(r)) => r,
      Ok(None) => {
        self.release(&fresh).await;
        return Err(Error::RecordNotFound(id));
      }
      Err(e) => {
        self.release(&fresh).await;
        return Err(store_error(e));
      }
    };

    let replaced: Vec<BlobRef> = [
      (&current.photo, &updated.photo),
      (&current.qr_code, &updated.qr_code),
    ]
    .into_iter()
    .filter(|(old, new)| old.path != new.path)
    .map(|(old, _)| old.clone())
    .collect();
    self.release(&replaced).await;

    info!(
      record_id = %id,
      roll_no = %updated.fields.roll_no,
      qr_regenerated = current.qr_code.path != updated.qr_code.path,
      "record updated"
    );
    Ok(updated)
  }

  /// Delete record `id` and release its photo and QR files.
  ///
  /// File removal is best effort: failures are logged and the deletion still
  /// succeeds.
  pub async fn delete(&self, id: Uuid) -> Result<Record> {
    let removed = self
      .store
      .delete(id)
      .await
      .map_err(store_error)?
      .ok_or(Error::RecordNotFound(id))?;

    self
      .release(&[removed.photo.clone(), removed.qr_code.clone()])
      .await;

    info!(record_id = %id, roll_no = %removed.fields.roll_no, "record deleted");
    Ok(removed)
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  pub async fn get(&self, id: Uuid) -> Result<Record> {
    self
      .store
      .get(id)
      .await
      .map_err(store_error)?
      .ok_or(Error::RecordNotFound(id))
  }

  /// Resolve a scanned QR payload to the record it identifies.
  pub async fn verify(&self, scanned: &str) -> Result<RecordProjection> {
    self
      .store
      .find_by_roll_no(scanned)
      .await
      .map_err(store_error)?
      .map(|r| r.projection())
      .ok_or_else(|| Error::RollNumberNotFound(scanned.to_owned()))
  }

  /// One page of records matching `filter`. `raw_page` is the unparsed
  /// `?page=` value; see [`page::resolve`] for how it is interpreted.
  pub async fn list_page(
    &self,
    filter: &RecordFilter,
    raw_page: Option<&str>,
    page_size: usize,
  ) -> Result<Page<Record>> {
    let total = self.store.count(filter).await.map_err(store_error)?;
    let number = page::resolve(raw_page, page::num_pages(total, page_size));

    let query = RecordQuery {
      filter: filter.clone(),
      limit:  Some(page_size),
      offset: page::offset(number, page_size),
    };
    let items = self.store.list(&query).await.map_err(store_error)?;

    Ok(Page::new(items, number, page_size, total))
  }

  /// Every record matching `filter`, newest first.
  pub async fn list_all(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
    let query = RecordQuery { filter: filter.clone(), ..RecordQuery::default() };
    self.store.list(&query).await.map_err(store_error)
  }

  pub async fn stats(&self) -> Result<Stats> {
    Ok(Stats {
      total_students: self
        .store
        .count(&RecordFilter::default())
        .await
        .map_err(store_error)?,
      by_department:  self.group(GroupField::Department).await?,
      by_role:        self.group(GroupField::Role).await?,
      by_grade:       self.group(GroupField::Grade).await?,
    })
  }

  /// Full, unfiltered CSV dump.
  pub async fn export_csv(&self) -> Result<String> {
    let records = self.list_all(&RecordFilter::default()).await?;
    Ok(build_csv(&records))
  }

  // ── Helpers ─────────────────────────────────────────────────────────────

  async fn group(&self, field: GroupField) -> Result<Vec<GroupCount>> {
    self.store.count_by(field).await.map_err(store_error)
  }

  fn render_qr(&self, roll_no: &str) -> Result<Vec<u8>> {
    self
      .renderer
      .render(roll_no)
      .map_err(|e| Error::Artifact(Box::new(e)))
  }

  async fn put(
    &self,
    kind: BlobKind,
    file_name: &str,
    media_type: &str,
    bytes: &[u8],
  ) -> Result<BlobRef> {
    self
      .blobs
      .put(kind, file_name, media_type, bytes)
      .await
      .map_err(blob_error)
  }

  /// Remove blobs, logging instead of failing.
  async fn release(&self, blobs: &[BlobRef]) {
    for blob in blobs {
      if let Err(e) = self.blobs.remove(blob).await {
        warn!(path = %blob.path, error = %e, "failed to remove blob");
      }
    }
  }

  /// Add a field error if `roll_no` already belongs to a record other than
  /// `exclude`.
  async fn check_roll_no(
    &self,
    roll_no: &str,
    exclude: Option<Uuid>,
    errors: &mut FieldErrors,
  ) -> Result<()> {
    if roll_no.trim().is_empty() {
      return Ok(());
    }
    let existing = self
      .store
      .find_by_roll_no(roll_no)
      .await
      .map_err(store_error)?;
    if let Some(existing) = existing
      && Some(existing.id) != exclude
    {
      errors.add("roll_no", DUPLICATE_ROLL_NO);
    }
    Ok(())
  }
}
