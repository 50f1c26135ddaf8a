//! `latte config`: inspect and scaffold the process-wide configuration file.

use std::path::Path;

use anyhow::Context;
use latte_core::Config;

pub fn show(config: &Config) -> anyhow::Result<()> {
  println!("{}", toml::to_string_pretty(config)?);
  Ok(())
}

pub fn init(path: &Path, config: &Config) -> anyhow::Result<()> {
  if path.exists() {
    anyhow::bail!("config file {} already exists", path.display());
  }
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, toml::to_string_pretty(config)?).with_context(|| format!("writing {}", path.display()))?;
  println!("wrote {}", path.display());
  Ok(())
}
