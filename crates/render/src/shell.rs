//! A concrete render step backed by spawning a shell command built from a
//! `Compiler`'s name and args (§ FEATURES SUPPLEMENTED, `NewRenderFunc`).

use std::path::Path;

use crate::compiler::Compiler;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
  #[error("failed to spawn render command: {0}")]
  Spawn(#[from] std::io::Error),
  #[error("render command exited with status {0}")]
  NonZeroExit(std::process::ExitStatus),
}

/// Runs `compiler.name() <compiler.args(out_dir, extra_args)...>` through
/// `shell_path -c "..."` with its working directory set to `working_dir`
/// (the context's rendered template tree), optionally inheriting the
/// process environment. Stdout/stderr are inherited so the caller's logs
/// carry the compiler's own diagnostics, matching the original's
/// `cmd.Stdout = os.Stdout`.
pub struct ShellRenderFn {
  shell_path: String,
  include_env: bool,
}

impl ShellRenderFn {
  pub fn new(shell_path: impl Into<String>, include_env: bool) -> Self {
    Self {
      shell_path: shell_path.into(),
      include_env,
    }
  }

  pub async fn render(
    &self,
    working_dir: &Path,
    out_dir: &Path,
    compiler: &dyn Compiler,
    extra_args: &[String],
  ) -> Result<(), RenderError> {
    let command_line = format!("{} {}", compiler.name(), compiler.args(out_dir, extra_args).join(" "));

    let mut cmd = tokio::process::Command::new(&self.shell_path);
    cmd.arg("-c").arg(&command_line).current_dir(working_dir);
    if !self.include_env {
      cmd.env_clear();
    }

    let status = cmd.status().await?;
    if !status.success() {
      return Err(RenderError::NonZeroExit(status));
    }
    Ok(())
  }
}

impl Default for ShellRenderFn {
  fn default() -> Self {
    Self::new("/bin/sh", true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::compiler::Compiler;

  struct TouchCompiler;
  impl Compiler for TouchCompiler {
    fn name(&self) -> &str {
      "touch"
    }
    fn args(&self, out_dir: &Path, _extra_args: &[String]) -> Vec<String> {
      vec![out_dir.join("marker").display().to_string()]
    }
  }

  #[tokio::test]
  async fn runs_compiler_command_and_produces_output() {
    let working_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let render_fn = ShellRenderFn::new("/bin/sh", false);
    render_fn
      .render(working_dir.path(), out_dir.path(), &TouchCompiler, &[])
      .await
      .unwrap();
    assert!(out_dir.path().join("marker").exists());
  }

  #[tokio::test]
  async fn non_zero_exit_is_an_error() {
    struct FailingCompiler;
    impl Compiler for FailingCompiler {
      fn name(&self) -> &str {
        "false"
      }
      fn args(&self, _out_dir: &Path, _extra_args: &[String]) -> Vec<String> {
        vec![]
      }
    }

    let working_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let render_fn = ShellRenderFn::new("/bin/sh", false);
    let err = render_fn
      .render(working_dir.path(), out_dir.path(), &FailingCompiler, &[])
      .await
      .unwrap_err();
    assert!(matches!(err, RenderError::NonZeroExit(_)));
  }
}
