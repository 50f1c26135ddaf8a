#[derive(Debug, thiserror::Error)]
pub enum StorageError {
  #[error("no schemes provided to register_provider")]
  NoSchemes,
  #[error("empty scheme provided to register_provider")]
  EmptyScheme,
  #[error("scheme {0:?} already registered")]
  DuplicateScheme(String),
  #[error("no provider registered for scheme {scheme:?} in url {url}")]
  UnknownScheme { scheme: String, url: String },
  #[error("destination path {0} is not a directory")]
  NotADirectory(String),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("archive error: {0}")]
  Archive(#[from] latte_archive::ArchiveError),
}
