//! [`QrRenderer`]: renders a roll number as a PNG QR code.

use std::io::Cursor;

use image::{ImageFormat, Luma, Rgb, RgbImage, imageops};
use qrcode::QrCode;
use roster_core::artifact::ArtifactRenderer;

use crate::{Error, Result};

/// Edge length in pixels of the square white canvas the code is centred on.
pub const CANVAS_SIZE: u32 = 310;

/// Renders payloads as black-on-white QR codes, centred on a
/// [`CANVAS_SIZE`]-pixel square and encoded as PNG.
///
/// Rendering is deterministic: the same payload always yields the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrRenderer;

impl ArtifactRenderer for QrRenderer {
  type Error = Error;

  fn render(&self, payload: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(payload.as_bytes())?;
    let modules = code
      .render::<Luma<u8>>()
      .quiet_zone(true)
      .max_dimensions(CANVAS_SIZE, CANVAS_SIZE)
      .build();

    let mut canvas = RgbImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, Rgb([255, 255, 255]));
    let qr = image::DynamicImage::ImageLuma8(modules).to_rgb8();
    let x = (i64::from(CANVAS_SIZE) - i64::from(qr.width())) / 2;
    let y = (i64::from(CANVAS_SIZE) - i64::from(qr.height())) / 2;
    imageops::overlay(&mut canvas, &qr, x.max(0), y.max(0));

    let mut png = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
  }

  fn media_type(&self) -> &'static str { "image/png" }
}
