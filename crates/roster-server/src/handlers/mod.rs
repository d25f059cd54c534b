//! Page, scan, report and login handlers.
//!
//! Page endpoints answer with the JSON a page would render, redirect after a
//! successful form post, and return field errors when a post is rejected.

pub mod login;
pub mod records;
pub mod reports;
pub mod scan;

use roster_core::blob::BlobRef;

/// URL under which `blob` is served.
pub fn media_url(blob: &BlobRef) -> String { format!("/media/{}", blob.path) }
