//! The `Compiler` trait (§4.E "renderFunc (opaque)"): names the
//! typesetting binary and builds its argument list, letting the shell
//! render function stay compiler-agnostic.

pub trait Compiler: Send + Sync {
  fn name(&self) -> &str;
  fn args(&self, out_dir: &std::path::Path, extra_args: &[String]) -> Vec<String>;
}

/// A `latexmk -pdf` compiler, matching the original's hardcoded default.
pub struct LatexmkCompiler;

impl Compiler for LatexmkCompiler {
  fn name(&self) -> &str {
    "latexmk"
  }

  fn args(&self, out_dir: &std::path::Path, extra_args: &[String]) -> Vec<String> {
    let mut args = vec!["-pdf".to_string(), format!("-outdir={}", out_dir.display())];
    args.extend_from_slice(extra_args);
    args
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn latexmk_args_include_outdir_and_extra_args() {
    let compiler = LatexmkCompiler;
    let args = compiler.args(std::path::Path::new("/tmp/out"), &["--shell-escape".to_string()]);
    assert_eq!(args, vec!["-pdf", "-outdir=/tmp/out", "--shell-escape"]);
  }
}
