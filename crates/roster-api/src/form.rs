//! Multipart submissions: the text fields of a record form plus an optional
//! `photo` file part.
//!
//! Shared by the REST handlers and the server's page endpoints.

use axum::extract::Multipart;
use roster_core::{
  blob::Upload,
  form::{FieldErrors, FormData},
  record::RecordFields,
};
use roster_image::sniff_photo;

use crate::error::ApiError;

pub const INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an \
                                 image or a corrupted image.";

/// A decoded multipart body, not yet validated.
#[derive(Debug, Default)]
pub struct Submission {
  pub form:    FormData,
  pub photo:   Option<Upload>,
  /// Problems with the `photo` part found while reading it.
  photo_errors: FieldErrors,
}

impl Submission {
  /// Read every part of `multipart`. A `photo` part with neither a file name
  /// nor content counts as "no file chosen".
  pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
      .next_field()
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
      let name = field.name().unwrap_or_default().to_owned();
      if name == "photo" {
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let bytes = field
          .bytes()
          .await
          .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        if file_name.is_empty() && bytes.is_empty() {
          continue;
        }
        submission.accept_photo(file_name, bytes.to_vec());
      } else {
        let value = field
          .text()
          .await
          .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        submission.form.insert(name, value);
      }
    }

    Ok(submission)
  }

  fn accept_photo(&mut self, file_name: String, bytes: Vec<u8>) {
    // Empty files are passed through; the registry reports them.
    if bytes.is_empty() {
      self.photo = Some(Upload { file_name, media_type: String::new(), bytes });
      return;
    }
    match sniff_photo(&bytes) {
      Ok(sniffed) => {
        let file_name = if file_name.trim().is_empty() {
          format!("photo.{}", sniffed.extension)
        } else {
          file_name
        };
        self.photo = Some(Upload { file_name, media_type: sniffed.media_type.to_owned(), bytes });
      }
      Err(_) => self.photo_errors.add("photo", INVALID_IMAGE),
    }
  }

  /// Decode the text fields, reporting photo problems alongside field
  /// problems.
  pub fn into_parts(self) -> Result<(RecordFields, Option<Upload>), FieldErrors> {
    let mut errors = self.photo_errors;
    match RecordFields::from_form(&self.form) {
      Ok(fields) if errors.is_empty() => Ok((fields, self.photo)),
      Ok(_) => Err(errors),
      Err(field_errors) => {
        errors.merge(field_errors);
        Err(errors)
      }
    }
  }
}
