//! URI scheme → provider registry (§4.B). The core consumes only
//! `{read, write, delete}` on URIs plus an extract-archive helper; concrete
//! providers are registered at the composition root, never imported here.

mod error;
mod local;
mod ops;
mod provider;
mod registry;

pub use error::StorageError;
pub use local::LocalProvider;
pub use ops::{extract_archive, store_bytes, store_file};
pub use provider::{BoxedReader, BoxedWriter, Provider};
pub use registry::Registry;
