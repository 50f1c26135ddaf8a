//! `Registry` (§4.B): maps a URI scheme to its provider and rejects
//! empty/duplicate scheme registration, mirroring `RegisterStorageProvider`.

use std::{collections::HashMap, sync::Arc};

use url::Url;

use crate::{error::StorageError, provider::Provider};

#[derive(Default)]
pub struct Registry {
  providers: HashMap<String, Arc<dyn Provider>>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `provider` for every scheme in `schemes`. Fails if no
  /// schemes are given, if any scheme is empty, or if any scheme is
  /// already registered (including a duplicate within this same call).
  pub fn register(&mut self, provider: Arc<dyn Provider>, schemes: &[&str]) -> Result<(), StorageError> {
    if schemes.is_empty() {
      return Err(StorageError::NoSchemes);
    }
    for scheme in schemes {
      if scheme.is_empty() {
        return Err(StorageError::EmptyScheme);
      }
      if self.providers.contains_key(*scheme) {
        return Err(StorageError::DuplicateScheme(scheme.to_string()));
      }
    }
    for scheme in schemes {
      self.providers.insert(scheme.to_string(), provider.clone());
    }
    Ok(())
  }

  pub fn provider_for(&self, url: &Url) -> Result<&Arc<dyn Provider>, StorageError> {
    self.providers.get(url.scheme()).ok_or_else(|| StorageError::UnknownScheme {
      scheme: url.scheme().to_string(),
      url: url.to_string(),
    })
  }

  pub async fn delete(&self, url: &Url) -> Result<(), StorageError> {
    self.provider_for(url)?.delete(url).await
  }

  pub async fn store_file(&self, src_path: &std::path::Path, dst: &Url) -> Result<(), StorageError> {
    crate::ops::store_file(self.provider_for(dst)?.as_ref(), src_path, dst).await
  }

  pub async fn store_bytes(&self, src: &[u8], dst: &Url) -> Result<(), StorageError> {
    crate::ops::store_bytes(self.provider_for(dst)?.as_ref(), src, dst).await
  }

  pub async fn extract_archive(&self, src: &Url, dst_path: &std::path::Path) -> Result<(), StorageError> {
    crate::ops::extract_archive(self.provider_for(src)?.as_ref(), src, dst_path).await
  }
}
