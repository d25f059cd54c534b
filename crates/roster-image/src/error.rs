//! Error type for `roster-image`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("payload cannot be encoded as a QR code: {0}")]
  Encode(#[from] qrcode::types::QrError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("image error: {0}")]
  Image(#[from] image::ImageError),

  /// Decodable, but not one of the accepted photo formats.
  #[error("unsupported image format {0}")]
  UnsupportedFormat(String),

  #[error("not a recognisable image")]
  Unrecognised,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
