//! Pipeline configuration (§4.E Configuration).

use std::{path::PathBuf, sync::Arc};

use latte_core::OnMissingKey;
use latte_render::Compiler;
use latte_template::{FuncMap, TemplatingEngine};
use tokio_util::sync::CancellationToken;

use crate::{hooks::Hook, render_step::RenderStep};

/// Derives the cancellation scope used for one context's render job from
/// the pipeline's base token. Defaults to a plain child token.
pub trait ContextDeriver: Send + Sync {
  fn derive(&self, base: &CancellationToken, index: usize) -> CancellationToken;
}

pub struct DefaultContextDeriver;

impl ContextDeriver for DefaultContextDeriver {
  fn derive(&self, base: &CancellationToken, _index: usize) -> CancellationToken {
    base.child_token()
  }
}

pub struct Configuration {
  pub worker_count: usize,
  pub render_count: u32,
  pub source_dir: PathBuf,
  pub out_dir: PathBuf,
  pub missing_key: OnMissingKey,
  pub template_engine: Arc<dyn TemplatingEngine>,
  pub template_extension: Option<String>,
  pub func_map: FuncMap,
  pub compiler: Arc<dyn Compiler>,
  pub render_step: Arc<dyn RenderStep>,
  pub extra_render_args: Vec<String>,
  pub no_archiving: bool,
  pub pre_render_hook: Option<Arc<dyn Hook>>,
  pub pre_archive_hook: Option<Arc<dyn Hook>>,
  pub context_deriver: Arc<dyn ContextDeriver>,
  pub merged_archive_name: String,
}

impl Configuration {
  pub fn validate(&self) -> Result<(), ConfigurationError> {
    if self.worker_count == 0 {
      return Err(ConfigurationError::ZeroWorkers);
    }
    if self.render_count == 0 {
      return Err(ConfigurationError::ZeroRenderCount);
    }
    if !self.source_dir.is_dir() {
      return Err(ConfigurationError::InvalidSourceDir(self.source_dir.clone()));
    }
    Ok(())
  }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
  #[error("worker_count must be at least 1")]
  ZeroWorkers,
  #[error("render_count must be at least 1")]
  ZeroRenderCount,
  #[error("source dir {0:?} does not exist or is not a directory")]
  InvalidSourceDir(PathBuf),
}
