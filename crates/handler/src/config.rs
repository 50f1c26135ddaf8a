//! `HandlerConfig` (§5): everything a `Handler` needs to turn a request
//! into a running pipeline and store its result, gathered at the
//! composition root.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use async_trait::async_trait;
use latte_core::JobDone;
use latte_pipeline::{ContextDeriver, HookError, RenderStep};
use latte_render::Compiler;
use latte_storage::Registry;
use latte_template::{FuncMap, TemplatingEngine};

#[derive(Debug, thiserror::Error)]
pub enum HandlerConfigError {
  #[error("work_dir must not be empty")]
  EmptyWorkDir,
}

/// Arbitrary side effect run between a job's pipeline completing and its
/// artifact being stored, given the chance to annotate `JobDone` before
/// it reaches the requester (§5, original's `postPipelineHook`).
#[async_trait]
pub trait PostPipelineHook: Send + Sync {
  async fn call(&self, shared_dir: &Path, job_done: &mut JobDone) -> Result<(), HookError>;
}

pub struct HandlerConfig {
  /// Root directory under which each job gets its own `<id>/source` and
  /// `<id>/shared` subdirectories, removed once the job terminates.
  pub work_dir: PathBuf,
  pub worker_count: usize,
  /// Used when a job's own `timeout` field is unset.
  pub default_timeout: Option<Duration>,
  pub template_engine: Arc<dyn TemplatingEngine>,
  pub template_extension: Option<String>,
  pub func_map: FuncMap,
  pub compiler: Arc<dyn Compiler>,
  pub render_step: Arc<dyn RenderStep>,
  pub extra_render_args: Vec<String>,
  pub context_deriver: Arc<dyn ContextDeriver>,
  pub merged_archive_name: String,
  pub storage: Arc<Registry>,
  pub post_pipeline_hook: Option<Arc<dyn PostPipelineHook>>,
}

impl HandlerConfig {
  pub fn validate(&mut self) -> Result<(), HandlerConfigError> {
    if self.work_dir.as_os_str().is_empty() {
      return Err(HandlerConfigError::EmptyWorkDir);
    }
    if self.worker_count < 1 {
      self.worker_count = 1;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use latte_pipeline::DefaultContextDeriver;
  use latte_render::LatexmkCompiler;
  use latte_template::SubstitutionEngine;

  fn base() -> HandlerConfig {
    HandlerConfig {
      work_dir: PathBuf::from("/tmp/latte-work"),
      worker_count: 0,
      default_timeout: None,
      template_engine: Arc::new(SubstitutionEngine),
      template_extension: None,
      func_map: FuncMap::new(),
      compiler: Arc::new(LatexmkCompiler),
      render_step: Arc::new(latte_render::ShellRenderFn::default()),
      extra_render_args: Vec::new(),
      context_deriver: Arc::new(DefaultContextDeriver),
      merged_archive_name: "archive.pch".into(),
      storage: Arc::new(Registry::new()),
      post_pipeline_hook: None,
    }
  }

  #[test]
  fn zero_worker_count_is_corrected_to_one() {
    let mut cfg = base();
    cfg.validate().unwrap();
    assert_eq!(cfg.worker_count, 1);
  }

  #[test]
  fn empty_work_dir_is_rejected() {
    let mut cfg = base();
    cfg.work_dir = PathBuf::new();
    assert!(matches!(cfg.validate(), Err(HandlerConfigError::EmptyWorkDir)));
  }
}
