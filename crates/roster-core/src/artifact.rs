//! The artifact generator seam.
//!
//! `qr_code` is a pure function of `roll_no`; the registry calls the renderer
//! on create and whenever the roll number changes, never on read.

/// Renders a payload string into image bytes.
pub trait ArtifactRenderer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Deterministic: the same payload always yields the same bytes.
  fn render(&self, payload: &str) -> Result<Vec<u8>, Self::Error>;

  /// Media type of the bytes returned by [`Self::render`].
  fn media_type(&self) -> &'static str;
}

/// File name for a record's QR artifact, derived from its display name.
pub fn qr_file_name(display_name: &str) -> String {
  format!("{}_qr.png", display_name.trim())
}
