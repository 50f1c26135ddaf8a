//! Free functions over a single `&dyn Provider` (§4.B), the layer
//! `Registry`'s convenience methods delegate to after resolving a scheme.

use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use url::Url;

use crate::{error::StorageError, provider::Provider};

pub async fn store_file(provider: &dyn Provider, src_path: &Path, dst: &Url) -> Result<(), StorageError> {
  let mut src = tokio::fs::File::open(src_path).await?;
  let mut w = provider.write(dst).await?;
  tokio::io::copy(&mut src, &mut w).await?;
  w.shutdown().await?;
  Ok(())
}

pub async fn store_bytes(provider: &dyn Provider, src: &[u8], dst: &Url) -> Result<(), StorageError> {
  let mut w = provider.write(dst).await?;
  w.write_all(src).await?;
  w.shutdown().await?;
  Ok(())
}

/// Extracts the archive at `src` into `dst_path`, which must already exist
/// as a directory (§4.B, mirroring `ExtractPitchArchive`).
pub async fn extract_archive(provider: &dyn Provider, src: &Url, dst_path: &Path) -> Result<(), StorageError> {
  if !dst_path.is_dir() {
    return Err(StorageError::NotADirectory(dst_path.display().to_string()));
  }

  let mut r = provider.read(src).await?;
  let mut buf = Vec::new();
  r.read_to_end(&mut buf).await?;

  latte_archive::extract_to_dir(std::io::Cursor::new(buf), dst_path)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::local::LocalProvider;

  #[tokio::test]
  async fn store_file_copies_bytes_to_destination() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("src.bin");
    std::fs::write(&src_path, b"hello").unwrap();
    let dst_url = Url::from_file_path(dir.path().join("dst.bin")).unwrap();

    store_file(&LocalProvider, &src_path, &dst_url).await.unwrap();

    assert_eq!(std::fs::read(dir.path().join("dst.bin")).unwrap(), b"hello");
  }

  #[tokio::test]
  async fn extract_archive_rejects_non_directory_destination() {
    let dir = tempfile::tempdir().unwrap();
    let archive_url = Url::from_file_path(dir.path().join("a.pch")).unwrap();
    std::fs::write(dir.path().join("a.pch"), b"").unwrap();
    let not_a_dir = dir.path().join("not_a_dir.txt");
    std::fs::write(&not_a_dir, b"x").unwrap();

    let err = extract_archive(&LocalProvider, &archive_url, &not_a_dir).await.unwrap_err();
    assert!(matches!(err, StorageError::NotADirectory(_)));
  }
}
