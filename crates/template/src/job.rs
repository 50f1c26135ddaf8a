//! The template job: a one-time walk of a source directory into
//! templates and assets (§4.C), reusable across every context of a job.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
  sync::OnceLock,
};

use latte_core::OnMissingKey;
use regex::Regex;
use serde_json::Value;
use walkdir::WalkDir;

use crate::engine::{FuncMap, Template, TemplateRenderError, TemplatingEngine};

#[derive(Debug, thiserror::Error)]
pub enum TemplateJobError {
  #[error("error walking source directory: {0}")]
  Walk(#[from] walkdir::Error),
  #[error("no files matched template glob for {0}")]
  EmptyGlob(String),
  #[error("error building template {name}: {source}")]
  Build {
    name: String,
    #[source]
    source: TemplateRenderError,
  },
  #[error(transparent)]
  Render(#[from] TemplateRenderError),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

fn extension_re(ext: &str) -> Regex {
  Regex::new(&format!(r"^(.*\.{})", regex::escape(ext))).expect("extension produces a valid regex")
}

/// Extension used to recognize template files when none is configured
/// (matches the original's hardcoded default before `SetFileExtension`).
pub fn default_extension_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| extension_re("tex"))
}

/// Classifies every regular file under `source_dir` as either a template
/// (its name matches `template_re`) or an asset to be symlinked verbatim.
/// Multiple files sharing a template's base name (e.g. `main.tex.1`,
/// `main.tex.2`, produced by a prior render pass) are glob-grouped under
/// the same output path, mirroring the original's `<path>*` glob.
struct Classification {
  /// output-relative path -> source paths that feed that template
  template_sources: BTreeMap<PathBuf, Vec<PathBuf>>,
  /// absolute source path -> output-relative path
  symlinks: BTreeMap<PathBuf, PathBuf>,
}

fn classify(source_dir: &Path, template_re: &Regex) -> Result<Classification, TemplateJobError> {
  let mut template_sources: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
  let mut symlinks = BTreeMap::new();

  for entry in WalkDir::new(source_dir).sort_by_file_name() {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let rel = entry.path().strip_prefix(source_dir).unwrap_or(entry.path());
    let file_name = entry.file_name().to_string_lossy();

    match template_re.captures(&file_name) {
      Some(caps) => {
        let base_name = caps.get(1).unwrap().as_str();
        let out_rel = rel.with_file_name(base_name);
        template_sources.entry(out_rel).or_default().push(entry.path().to_path_buf());
      }
      None => {
        symlinks.insert(entry.path().to_path_buf(), rel.to_path_buf());
      }
    }
  }

  Ok(Classification { template_sources, symlinks })
}

/// A directory of template and asset files, parsed once and executed
/// per context (§4.C).
pub struct TemplateJob {
  templates: BTreeMap<PathBuf, Box<dyn Template>>,
  symlinks: BTreeMap<PathBuf, PathBuf>,
}

impl TemplateJob {
  /// Walks `source_dir`, building one parsed template per distinct output
  /// path and recording every remaining file as an asset to symlink.
  pub fn new(
    source_dir: &Path,
    missing_key: OnMissingKey,
    engine: &dyn TemplatingEngine,
    extension: Option<&str>,
    funcs: &FuncMap,
  ) -> Result<Self, TemplateJobError> {
    let owned_re;
    let template_re = match extension {
      Some(ext) => {
        owned_re = extension_re(ext);
        &owned_re
      }
      None => default_extension_re(),
    };

    let classification = classify(source_dir, template_re)?;

    let mut templates = BTreeMap::new();
    for (out_rel, sources) in classification.template_sources {
      if sources.is_empty() {
        return Err(TemplateJobError::EmptyGlob(out_rel.display().to_string()));
      }
      let name = out_rel.file_name().unwrap_or_default().to_string_lossy().to_string();
      let template = engine
        .parse_files(&name, missing_key, &sources, funcs)
        .map_err(|source| TemplateJobError::Build { name, source })?;
      templates.insert(out_rel, template);
    }

    Ok(Self { templates, symlinks: classification.symlinks })
  }

  /// Symlinks every asset into `out_dir`, then renders every template
  /// against `data` into `out_dir` (§4.C step order).
  pub fn execute(&self, out_dir: &Path, data: &Value) -> Result<(), TemplateJobError> {
    self.symlink_assets(out_dir)?;
    self.render_templates(out_dir, data)?;
    Ok(())
  }

  fn symlink_assets(&self, out_dir: &Path) -> Result<(), TemplateJobError> {
    for (source, rel_out) in &self.symlinks {
      let dest = out_dir.join(rel_out);
      if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
      }
      symlink_file(source, &dest)?;
    }
    Ok(())
  }

  fn render_templates(&self, out_dir: &Path, data: &Value) -> Result<(), TemplateJobError> {
    for (rel_out, template) in &self.templates {
      let dest = out_dir.join(rel_out);
      if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
      }
      let mut file = std::fs::File::create(&dest)?;
      template.execute(&mut file, data)?;
    }
    Ok(())
  }
}

#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> std::io::Result<()> {
  std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> std::io::Result<()> {
  std::os::windows::fs::symlink_file(src, dst)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::substitution::SubstitutionEngine;
  use serde_json::json;

  #[test]
  fn symlinks_asset_and_renders_template() {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("main.tex"), "Hi |@ .Name @|").unwrap();
    std::fs::write(src.path().join("asset.bin"), b"PASS").unwrap();

    let engine = SubstitutionEngine;
    let job = TemplateJob::new(src.path(), OnMissingKey::Error, &engine, None, &crate::engine::FuncMap::new()).unwrap();

    let out = tempfile::tempdir().unwrap();
    job.execute(out.path(), &json!({"Name": "alice"})).unwrap();

    assert_eq!(std::fs::read_to_string(out.path().join("main.tex")).unwrap(), "Hi alice");
    assert_eq!(std::fs::read(out.path().join("asset.bin")).unwrap(), b"PASS");
  }

  #[test]
  fn nested_directories_are_preserved() {
    let src = tempfile::tempdir().unwrap();
    std::fs::create_dir(src.path().join("sub")).unwrap();
    std::fs::write(src.path().join("sub/body.tex"), "|@ .X @|").unwrap();

    let engine = SubstitutionEngine;
    let job = TemplateJob::new(src.path(), OnMissingKey::Error, &engine, None, &crate::engine::FuncMap::new()).unwrap();
    let out = tempfile::tempdir().unwrap();
    job.execute(out.path(), &json!({"X": "y"})).unwrap();

    assert_eq!(std::fs::read_to_string(out.path().join("sub/body.tex")).unwrap(), "y");
  }

  #[test]
  fn custom_extension_is_respected() {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("doc.md"), "|@ .V @|").unwrap();
    std::fs::write(src.path().join("doc.tex"), "not a template under this config").unwrap();

    let engine = SubstitutionEngine;
    let job = TemplateJob::new(src.path(), OnMissingKey::Error, &engine, Some("md"), &crate::engine::FuncMap::new()).unwrap();
    let out = tempfile::tempdir().unwrap();
    job.execute(out.path(), &json!({"V": "z"})).unwrap();

    assert_eq!(std::fs::read_to_string(out.path().join("doc.md")).unwrap(), "z");
  }
}
