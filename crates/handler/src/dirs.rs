//! Per-job working directories (§5, original's `prepareDirs`/`removeAll`):
//! a `source` directory the pipeline reads templates from, and a `shared`
//! directory it renders and archives into.

use std::path::{Path, PathBuf};

use latte_storage::{Registry, StorageError};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum PrepareDirsError {
  #[error("io error preparing job directories: {0}")]
  Io(#[from] std::io::Error),
  #[error("error extracting source archive: {0}")]
  Storage(#[from] StorageError),
}

/// A `local://` source URI names a directory already present on disk
/// (typically a test fixture or a co-located volume); anything else is
/// treated as an archive to extract through the storage registry.
fn is_local_dir(url: &Url) -> bool {
  url.scheme() == "local" && Path::new(url.path()).is_dir()
}

/// Creates `<job_root>/source` and `<job_root>/shared`, populating `source`
/// either by symlinking a local directory or by extracting `source` through
/// `storage`.
pub async fn prepare_dirs(job_root: &Path, source: &Url, storage: &Registry) -> Result<(PathBuf, PathBuf), PrepareDirsError> {
  let source_dir = job_root.join("source");
  let shared_dir = job_root.join("shared");
  tokio::fs::create_dir_all(&shared_dir).await?;

  if is_local_dir(source) {
    symlink_dir(Path::new(source.path()), &source_dir)?;
  } else {
    tokio::fs::create_dir_all(&source_dir).await?;
    storage.extract_archive(source, &source_dir).await?;
  }

  Ok((source_dir, shared_dir))
}

/// Removes a job's entire working directory. Best-effort: a job whose
/// directories were never created (an early validation failure) leaves
/// nothing to clean up, which is not an error.
pub fn cleanup(job_root: &Path) {
  if let Err(e) = std::fs::remove_dir_all(job_root) {
    if e.kind() != std::io::ErrorKind::NotFound {
      tracing::warn!(path = %job_root.display(), error = %e, "failed to clean up job directory");
    }
  }
}

#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
  std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
  std::os::windows::fs::symlink_dir(src, dst)
}
