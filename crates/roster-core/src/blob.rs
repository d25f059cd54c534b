//! Binary artifacts (photos and QR images) and the `BlobStore` trait.
//!
//! No binary data lives in the database: a record only holds [`BlobRef`]s,
//! and the bytes are written by a [`BlobStore`] implementation.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Which artifact a blob belongs to; decides the storage sub-directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
  Photo,
  QrCode,
}

impl BlobKind {
  pub fn dir(self) -> &'static str {
    match self {
      Self::Photo => "images",
      Self::QrCode => "qrcodes",
    }
  }
}

/// A stored file referenced by a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
  /// Path relative to the media root, e.g. `qrcodes/Jane_Doe_qr.png`.
  pub path:         String,
  /// SHA-256 hex digest of the stored bytes.
  pub content_hash: String,
  pub media_type:   String,
}

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct Upload {
  pub file_name:  String,
  pub media_type: String,
  pub bytes:      Vec<u8>,
}

/// Abstraction over the place artifact bytes are kept.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Write `bytes` under a name derived from `file_name`. Never overwrites an
  /// existing blob; a colliding name gets a unique suffix.
  fn put<'a>(
    &'a self,
    kind: BlobKind,
    file_name: &'a str,
    media_type: &'a str,
    bytes: &'a [u8],
  ) -> impl Future<Output = Result<BlobRef, Self::Error>> + Send + 'a;

  /// Delete a stored blob. Removing a blob that is already gone succeeds.
  fn remove<'a>(
    &'a self,
    blob: &'a BlobRef,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
