//! A filesystem-backed provider for `file://` URLs, used by the `cli`
//! binary's default registry and by tests in place of a network back-end.

use async_trait::async_trait;
use tokio::fs::File;
use url::Url;

use crate::{
  error::StorageError,
  provider::{BoxedReader, BoxedWriter, Provider},
};

pub struct LocalProvider;

impl LocalProvider {
  fn path_of(url: &Url) -> std::path::PathBuf {
    std::path::PathBuf::from(url.path())
  }
}

#[async_trait]
impl Provider for LocalProvider {
  async fn read(&self, url: &Url) -> Result<BoxedReader, StorageError> {
    let file = File::open(Self::path_of(url)).await?;
    Ok(Box::pin(file))
  }

  async fn write(&self, url: &Url) -> Result<BoxedWriter, StorageError> {
    let path = Self::path_of(url);
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    let file = File::create(path).await?;
    Ok(Box::pin(file))
  }

  async fn delete(&self, url: &Url) -> Result<(), StorageError> {
    tokio::fs::remove_file(Self::path_of(url)).await?;
    Ok(())
  }
}
