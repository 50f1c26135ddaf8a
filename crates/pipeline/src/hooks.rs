//! Pre-render / pre-archive hooks (§4.E Configuration): arbitrary
//! side-effecting callbacks invoked before the render and archive steps.
//! May be called concurrently across contexts.

use std::path::Path;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
#[error("hook failed: {0}")]
pub struct HookError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl HookError {
  pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self(Box::new(err))
  }
}

#[async_trait]
pub trait Hook: Send + Sync {
  async fn call(&self, dir: &Path) -> Result<(), HookError>;
}

#[async_trait]
impl<F, Fut> Hook for F
where
  F: Fn(std::path::PathBuf) -> Fut + Send + Sync,
  Fut: std::future::Future<Output = Result<(), HookError>> + Send,
{
  async fn call(&self, dir: &Path) -> Result<(), HookError> {
    (self)(dir.to_path_buf()).await
  }
}
