//! The `Provider` trait (§4.B): every storage back-end implements
//! `read`/`write`/`delete` against a parsed URL, nothing more. The core
//! (and `handler`) never import a concrete provider directly; they are
//! registered at the composition root (the `cli` crate).

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use url::Url;

use crate::error::StorageError;

pub type BoxedReader = std::pin::Pin<Box<dyn AsyncRead + Send>>;
pub type BoxedWriter = std::pin::Pin<Box<dyn AsyncWrite + Send>>;

#[async_trait]
pub trait Provider: Send + Sync {
  async fn read(&self, url: &Url) -> Result<BoxedReader, StorageError>;
  async fn write(&self, url: &Url) -> Result<BoxedWriter, StorageError>;
  async fn delete(&self, url: &Url) -> Result<(), StorageError>;
}
