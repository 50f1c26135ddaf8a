//! The `TemplatingEngine`/`Template` seam (§4.C): decouples the template
//! job from any particular substitution implementation, the way the
//! original's `templatingengine` package decouples `template.Job` from
//! Go's `text/template`.

use std::{collections::HashMap, io::Write, sync::Arc};

use latte_core::OnMissingKey;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum TemplateRenderError {
  #[error("key {0:?} referenced by template has no value in this context")]
  MissingKey(String),
  #[error("template function {0:?} is not registered")]
  UnknownFunction(String),
  #[error("io error writing rendered output: {0}")]
  Io(#[from] std::io::Error),
}

/// Named functions available to templates, keyed by the name used inside
/// a placeholder (§4.E Configuration "optional template funcMap").
pub type FuncMap = HashMap<String, Arc<dyn Fn(&Value) -> Value + Send + Sync>>;

/// A single parsed template, bound to one missing-key policy.
pub trait Template: Send + Sync {
  fn execute(&self, out: &mut dyn Write, data: &Value) -> Result<(), TemplateRenderError>;
}

/// Builds a `Template` from a set of source files, matching
/// `TemplatingEngine.NewTemplate` + `ParseFiles`.
pub trait TemplatingEngine: Send + Sync {
  fn parse_files(
    &self,
    name: &str,
    missing_key: OnMissingKey,
    paths: &[std::path::PathBuf],
    funcs: &FuncMap,
  ) -> Result<Box<dyn Template>, TemplateRenderError>;
}
