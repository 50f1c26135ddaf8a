//! `latte serve`: the long-running service. Watches a directory for
//! dropped job-description files and renders each through a `Handler`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use latte_core::Config;
use latte_frontend::Ingress;
use latte_handler::Handler;
use tracing::info;

use crate::{composition, ingress::FileDropIngress};

pub async fn run(config: Config, watch_dir: PathBuf) -> anyhow::Result<()> {
  std::fs::create_dir_all(&watch_dir).with_context(|| format!("creating watch directory {}", watch_dir.display()))?;

  let storage = Arc::new(composition::build_storage());
  let handler = Arc::new(Handler::new(composition::build_handler_config(&config, storage))?);
  let ingress: Arc<dyn Ingress> = Arc::new(FileDropIngress::new(watch_dir.clone()));

  info!(watch_dir = %watch_dir.display(), "starting latte service");
  let stopper = latte_frontend::start(handler, vec![ingress]).await?;

  tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
  info!("shutting down");
  stopper.stop().await?;
  Ok(())
}
