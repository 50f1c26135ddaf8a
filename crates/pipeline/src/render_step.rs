//! The render step (§4.E "renderFunc (opaque)"): pluggable so tests can
//! substitute a fake compiler invocation without spawning a process.

use std::path::Path;

use async_trait::async_trait;
use latte_render::{Compiler, RenderError, ShellRenderFn};

#[async_trait]
pub trait RenderStep: Send + Sync {
  async fn render(
    &self,
    working_dir: &Path,
    out_dir: &Path,
    compiler: &dyn Compiler,
    extra_args: &[String],
  ) -> Result<(), RenderError>;
}

#[async_trait]
impl RenderStep for ShellRenderFn {
  async fn render(
    &self,
    working_dir: &Path,
    out_dir: &Path,
    compiler: &dyn Compiler,
    extra_args: &[String],
  ) -> Result<(), RenderError> {
    self.render(working_dir, out_dir, compiler, extra_args).await
  }
}
