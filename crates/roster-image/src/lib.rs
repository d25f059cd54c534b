//! Image handling for Roster: the QR artifact renderer and upload sniffing.

mod qr;
mod sniff;

pub mod error;

pub use error::{Error, Result};
pub use qr::{CANVAS_SIZE, QrRenderer};
pub use sniff::{SniffedImage, sniff_photo};
