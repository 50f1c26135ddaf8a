//! Process-wide configuration, loaded from a TOML file with sensible
//! defaults for everything (§ AMBIENT STACK).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_worker_count() -> usize {
  num_cpus::get().max(1)
}

fn default_render_count() -> u32 {
  1
}

fn default_merged_archive_name() -> String {
  "archive.pch".into()
}

fn default_timeout_secs() -> u64 {
  300
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

/// Process-wide configuration (§ AMBIENT STACK): worker/render counts,
/// the two well-known root directories a job's relative paths are resolved
/// against, the merged-archive file name, and the default per-job timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Number of template/render/archive workers spawned per pipeline.
  pub worker_count: usize,
  /// Default `render_count` applied to a job that doesn't specify one.
  pub render_count: u32,
  /// Root directory under which per-job working directories are created.
  pub work_dir: PathBuf,
  /// Root directory source archives/directories are resolved relative to.
  pub source_dir: PathBuf,
  /// File name the pipeline merges all per-context archives into.
  pub merged_archive_name: String,
  /// Default job timeout, in seconds, when a job omits one.
  pub default_timeout_secs: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      worker_count: default_worker_count(),
      render_count: default_render_count(),
      work_dir: PathBuf::from("./work"),
      source_dir: PathBuf::from("./sources"),
      merged_archive_name: default_merged_archive_name(),
      default_timeout_secs: default_timeout_secs(),
    }
  }
}

impl Config {
  /// Loads config from `path`, falling back to defaults for any field the
  /// file omits. A missing file is not an error; a malformed one is.
  pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
    if !path.exists() {
      return Ok(Self::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Normalizes `merged_archive_name` to always end in `.pch`, matching the
  /// Go implementation's `SetMergedArchiveName` guarantee.
  pub fn normalized_merged_archive_name(&self) -> String {
    if self.merged_archive_name.ends_with(".pch") {
      self.merged_archive_name.clone()
    } else {
      format!("{}.pch", self.merged_archive_name)
    }
  }
}
