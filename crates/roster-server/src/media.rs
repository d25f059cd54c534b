//! [`FsBlobStore`]: keeps photos and QR images as files under the media
//! directory, which is also served at `/media/`.

use std::{
  io::ErrorKind,
  path::{Component, Path, PathBuf},
};

use roster_core::blob::{BlobKind, BlobRef, BlobStore};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt as _};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("blob path escapes the media directory: {0:?}")]
  InvalidPath(String),
}

/// A [`BlobStore`] writing into `<root>/images/` and `<root>/qrcodes/`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root: PathBuf,
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Absolute location of a stored blob.
  pub fn locate(&self, blob: &BlobRef) -> Result<PathBuf, MediaError> {
    let relative = Path::new(&blob.path);
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
      return Err(MediaError::InvalidPath(blob.path.clone()));
    }
    Ok(self.root.join(relative))
  }
}

/// Reduce a client-supplied file name to a safe single path component:
/// directories are dropped, spaces become `_`, and anything other than ASCII
/// alphanumerics, `-`, `_` and `.` is removed.
pub fn sanitize_file_name(file_name: &str) -> String {
  let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
  let cleaned: String = base
    .trim()
    .chars()
    .filter_map(|c| match c {
      ' ' => Some('_'),
      c if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') => Some(c),
      _ => None,
    })
    .collect();
  let cleaned = cleaned.trim_start_matches('.');
  if cleaned.is_empty() { "file".to_owned() } else { cleaned.to_owned() }
}

/// `name` with a short random suffix inserted before the extension.
fn with_suffix(name: &str) -> String {
  let suffix = &Uuid::new_v4().simple().to_string()[..7];
  match name.rsplit_once('.') {
    Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{suffix}.{ext}"),
    _ => format!("{name}_{suffix}"),
  }
}

impl BlobStore for FsBlobStore {
  type Error = MediaError;

  async fn put(
    &self,
    kind: BlobKind,
    file_name: &str,
    media_type: &str,
    bytes: &[u8],
  ) -> Result<BlobRef, MediaError> {
    let dir = self.root.join(kind.dir());
    fs::create_dir_all(&dir).await?;

    let mut name = sanitize_file_name(file_name);
    let mut file = loop {
      match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dir.join(&name))
        .await
      {
        Ok(f) => break f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
          name = with_suffix(&sanitize_file_name(file_name));
        }
        Err(e) => return Err(e.into()),
      }
    };
    file.write_all(bytes).await?;
    file.flush().await?;

    Ok(BlobRef {
      path:         format!("{}/{name}", kind.dir()),
      content_hash: hex::encode(Sha256::digest(bytes)),
      media_type:   media_type.to_owned(),
    })
  }

  async fn remove(&self, blob: &BlobRef) -> Result<(), MediaError> {
    match fs::remove_file(self.locate(blob)?).await {
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      other => Ok(other?),
    }
  }
}
