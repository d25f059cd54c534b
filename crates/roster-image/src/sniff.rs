//! Content sniffing for uploaded photos.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::{Error, Result};

/// What an accepted upload turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniffedImage {
  pub media_type: &'static str,
  pub extension:  &'static str,
}

/// Identify `bytes` as a PNG, JPEG or WebP image by content rather than by
/// the client-supplied name or type. The header must decode to non-zero
/// dimensions.
pub fn sniff_photo(bytes: &[u8]) -> Result<SniffedImage> {
  let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
  let format = reader.format().ok_or(Error::Unrecognised)?;

  let (media_type, extension) = match format {
    ImageFormat::Png => ("image/png", "png"),
    ImageFormat::Jpeg => ("image/jpeg", "jpg"),
    ImageFormat::WebP => ("image/webp", "webp"),
    other => return Err(Error::UnsupportedFormat(format!("{other:?}"))),
  };

  let (width, height) = reader.into_dimensions()?;
  if width == 0 || height == 0 {
    return Err(Error::Unrecognised);
  }
  Ok(SniffedImage { media_type, extension })
}
