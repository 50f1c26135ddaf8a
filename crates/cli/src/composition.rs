//! Wires the library crates together into one running service: the storage
//! registry and the `HandlerConfig` every command builds a `Handler` from.

use std::{sync::Arc, time::Duration};

use latte_core::Config;
use latte_handler::HandlerConfig;
use latte_pipeline::DefaultContextDeriver;
use latte_render::{LatexmkCompiler, ShellRenderFn};
use latte_storage::{LocalProvider, Registry};
use latte_template::{FuncMap, SubstitutionEngine};

/// The only storage backend this binary ships: the local filesystem,
/// registered under both `file://` (archives/files) and `local://`
/// (already-materialized source directories).
pub fn build_storage() -> Registry {
  let mut registry = Registry::new();
  registry
    .register(Arc::new(LocalProvider), &["file", "local"])
    .expect("static scheme list cannot collide");
  registry
}

pub fn build_handler_config(config: &Config, storage: Arc<Registry>) -> HandlerConfig {
  HandlerConfig {
    work_dir: config.work_dir.clone(),
    worker_count: config.worker_count,
    default_timeout: Some(Duration::from_secs(config.default_timeout_secs)),
    template_engine: Arc::new(SubstitutionEngine),
    template_extension: None,
    func_map: FuncMap::new(),
    compiler: Arc::new(LatexmkCompiler),
    render_step: Arc::new(ShellRenderFn::default()),
    extra_render_args: Vec::new(),
    context_deriver: Arc::new(DefaultContextDeriver),
    merged_archive_name: config.normalized_merged_archive_name(),
    storage,
    post_pipeline_hook: None,
  }
}
