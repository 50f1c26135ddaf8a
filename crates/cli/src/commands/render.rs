//! `latte render`: renders a single job description synchronously,
//! without going through any ingress, and prints the resulting `JobDone`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use latte_core::{Config, Job, JobStatus};
use latte_frontend::{Request, RequestHandler};
use latte_handler::Handler;
use tokio_util::sync::CancellationToken;

use crate::composition;

pub async fn run(config: Config, job_path: PathBuf) -> anyhow::Result<()> {
  let text = std::fs::read_to_string(&job_path).with_context(|| format!("reading job file {}", job_path.display()))?;
  let job: Job = serde_json::from_str(&text).with_context(|| format!("parsing job file {}", job_path.display()))?;
  job.validate().context("job description failed validation")?;

  let storage = Arc::new(composition::build_storage());
  let handler = Handler::new(composition::build_handler_config(&config, storage))?;

  let (done_tx, done_rx) = tokio::sync::oneshot::channel();
  let request = Request::new(job, CancellationToken::new(), done_tx);
  handler.handle(request).await;
  let job_done = done_rx.await.context("handler dropped the job without reporting a result")?;

  println!("{}", serde_json::to_string_pretty(&job_done)?);

  if job_done.status == JobStatus::Failed {
    std::process::exit(1);
  }
  Ok(())
}
