//! `Handler` (§5): the `RequestHandler` that drives one job's `Pipeline`
//! from submission through artifact storage, grounded on the original's
//! `core.handleRequest`.

use std::time::Instant;

use async_trait::async_trait;
use latte_core::{Job, JobDone, JobStatus};
use latte_frontend::{Request, RequestHandler};
use latte_pipeline::{Configuration, HookError, Pipeline, PipelineStartError, SendOnClosed, TableOfContentsError, WaitError};
use latte_storage::StorageError;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use url::Url;

use crate::{
  config::{HandlerConfig, HandlerConfigError},
  dirs::{cleanup, prepare_dirs, PrepareDirsError},
};

#[derive(Debug, thiserror::Error)]
enum HandleError {
  #[error("invalid source uri {0:?}: {1}")]
  InvalidSourceUri(String, url::ParseError),
  #[error("invalid target uri {0:?}: {1}")]
  InvalidTargetUri(String, url::ParseError),
  #[error("preparing job directories: {0}")]
  PrepareDirs(#[from] PrepareDirsError),
  #[error("starting pipeline: {0}")]
  PipelineStart(#[from] PipelineStartError),
  #[error("submitting context to pipeline: {0}")]
  Send(#[from] SendOnClosed),
  #[error("waiting for pipeline: {0}")]
  Wait(#[from] WaitError),
  #[error("post-pipeline hook: {0}")]
  Hook(#[from] HookError),
  #[error("reading table of contents: {0}")]
  TableOfContents(#[from] TableOfContentsError),
  #[error("storing artifact: {0}")]
  Store(#[from] StorageError),
}

/// Turns one accepted `Request` into a finished `JobDone` (§5).
pub struct Handler {
  config: HandlerConfig,
}

impl Handler {
  pub fn new(mut config: HandlerConfig) -> Result<Self, HandlerConfigError> {
    config.validate()?;
    Ok(Self { config })
  }

  async fn run(&self, job: &Job, cancel: &CancellationToken, jd: &mut JobDone) -> Result<(), HandleError> {
    let source_url = Url::parse(&job.source_uri).map_err(|e| HandleError::InvalidSourceUri(job.source_uri.clone(), e))?;
    let target_url = Url::parse(&job.target_uri).map_err(|e| HandleError::InvalidTargetUri(job.target_uri.clone(), e))?;

    let job_root = self.config.work_dir.join(&job.id);
    let (source_dir, shared_dir) = prepare_dirs(&job_root, &source_url, &self.config.storage).await?;

    let configuration = Configuration {
      worker_count: self.config.worker_count,
      render_count: job.render_count.max(1),
      source_dir,
      out_dir: shared_dir.clone(),
      missing_key: job.on_missing_key,
      template_engine: self.config.template_engine.clone(),
      template_extension: self.config.template_extension.clone(),
      func_map: self.config.func_map.clone(),
      compiler: self.config.compiler.clone(),
      render_step: self.config.render_step.clone(),
      extra_render_args: self.config.extra_render_args.clone(),
      no_archiving: false,
      pre_render_hook: None,
      pre_archive_hook: None,
      context_deriver: self.config.context_deriver.clone(),
      merged_archive_name: self.config.merged_archive_name.clone(),
    };

    let pipeline = Pipeline::new(cancel.clone(), configuration)?;
    for context in job.indexed_contexts() {
      pipeline.add(context).await?;
    }
    pipeline.close().await;

    let timeout = job.timeout.or(self.config.default_timeout);
    let errors = pipeline.wait(timeout).await?;

    if let Some(hook) = &self.config.post_pipeline_hook {
      hook.call(&shared_dir, jd).await?;
    }

    let durations = pipeline.durations().await;
    for (index, render) in jd.renders.iter_mut().enumerate() {
      for err in errors.for_index(index) {
        render.push_error(err.to_string());
      }
      render.finalize(durations.get(&index).copied().unwrap_or_default());
    }
    jd.aggregate_status();

    // An index with no recorded error should have an archive to merge; one
    // that failed upstream legitimately has none, so only demand every
    // archive be present when nothing already failed.
    if let Err(e) = pipeline.merge_archives(errors.is_empty()).await {
      jd.status = JobStatus::Failed;
      jd.error = Some(format!("merging archives: {e}"));
      return Ok(());
    }

    jd.table_of_contents = pipeline.table_of_contents().await?;

    let merged_path = shared_dir.join(&self.config.merged_archive_name);
    self.config.storage.store_file(&merged_path, &target_url).await?;
    jd.artifact_url = Some(target_url.to_string());

    Ok(())
  }
}

#[async_trait]
impl RequestHandler for Handler {
  async fn handle(&self, request: Request) {
    let Request { job, cancel, done } = request;
    let job_root = self.config.work_dir.join(&job.id);
    let start = Instant::now();

    let mut jd = JobDone::pending(job.id.clone(), job.requested_at, job.include_logs, job.contexts.len());
    jd.started_at = Some(chrono::Utc::now());

    if let Err(e) = self.run(&job, &cancel, &mut jd).await {
      error!(job_id = %job.id, error = %e, "job failed");
      jd.fail(e);
    }
    jd.duration = start.elapsed();

    cleanup(&job_root);

    if done.send(jd).is_err() {
      warn!(job_id = %job.id, "requester dropped before job completion was delivered");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::PostPipelineHook;
  use latte_core::OnMissingKey;
  use latte_pipeline::{DefaultContextDeriver, HookError, RenderStep};
  use latte_render::{Compiler, LatexmkCompiler, RenderError};
  use latte_storage::{LocalProvider, Registry};
  use latte_template::{FuncMap, SubstitutionEngine};
  use serde_json::value::RawValue;
  use std::{path::Path, path::PathBuf, sync::Arc, time::Duration};
  use tokio::sync::oneshot;

  struct NoopRenderStep;

  #[async_trait]
  impl RenderStep for NoopRenderStep {
    async fn render(&self, _working_dir: &Path, out_dir: &Path, _compiler: &dyn Compiler, _extra_args: &[String]) -> Result<(), RenderError> {
      std::fs::create_dir_all(out_dir).ok();
      std::fs::write(out_dir.join("result.pdf"), b"PDF").unwrap();
      Ok(())
    }
  }

  struct RecordingHook;

  #[async_trait]
  impl PostPipelineHook for RecordingHook {
    async fn call(&self, shared_dir: &Path, _job_done: &mut JobDone) -> Result<(), HookError> {
      assert!(shared_dir.is_dir());
      Ok(())
    }
  }

  struct FailingHook;

  #[async_trait]
  impl PostPipelineHook for FailingHook {
    async fn call(&self, _shared_dir: &Path, _job_done: &mut JobDone) -> Result<(), HookError> {
      Err(HookError::new(std::io::Error::new(std::io::ErrorKind::Other, "boom")))
    }
  }

  fn config(work_dir: PathBuf, storage: Registry, hook: Option<Arc<dyn PostPipelineHook>>) -> HandlerConfig {
    HandlerConfig {
      work_dir,
      worker_count: 2,
      default_timeout: Some(Duration::from_secs(5)),
      template_engine: Arc::new(SubstitutionEngine),
      template_extension: None,
      func_map: FuncMap::new(),
      compiler: Arc::new(LatexmkCompiler),
      render_step: Arc::new(NoopRenderStep),
      extra_render_args: Vec::new(),
      context_deriver: Arc::new(DefaultContextDeriver),
      merged_archive_name: "merged.pch".to_string(),
      storage: Arc::new(storage),
      post_pipeline_hook: hook,
    }
  }

  fn job(id: &str, source_dir: &Path, target_path: &Path) -> Job {
    Job {
      id: id.to_string(),
      source_uri: format!("local://{}", source_dir.display()),
      target_uri: Url::from_file_path(target_path).unwrap().to_string(),
      contexts: vec![RawValue::from_string(r#"{"Name":"world"}"#.to_string()).unwrap()],
      on_missing_key: OnMissingKey::Nothing,
      render_count: 1,
      timeout: None,
      include_logs: false,
      image: None,
      compiler: None,
      requested_at: chrono::Utc::now(),
    }
  }

  #[tokio::test]
  async fn handles_a_job_end_to_end() {
    let source = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("main.tex"), "Hello |@ .Name @|").unwrap();
    let work = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    let target_path = target_dir.path().join("out.pch");

    let mut storage = Registry::new();
    storage.register(Arc::new(LocalProvider), &["file"]).unwrap();

    let handler = Handler::new(config(work.path().to_path_buf(), storage, Some(Arc::new(RecordingHook)))).unwrap();
    let (tx, rx) = oneshot::channel();
    let request = Request::new(job("job-1", source.path(), &target_path), CancellationToken::new(), tx);

    handler.handle(request).await;
    let jd = rx.await.unwrap();

    assert_eq!(jd.status, JobStatus::Success);
    assert!(target_path.exists());
    assert_eq!(jd.artifact_url, Some(Url::from_file_path(&target_path).unwrap().to_string()));
    assert!(!work.path().join("job-1").exists());
  }

  #[tokio::test]
  async fn a_failing_post_pipeline_hook_fails_the_job() {
    let source = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("main.tex"), "Hello |@ .Name @|").unwrap();
    let work = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    let target_path = target_dir.path().join("out.pch");

    let mut storage = Registry::new();
    storage.register(Arc::new(LocalProvider), &["file"]).unwrap();

    let handler = Handler::new(config(work.path().to_path_buf(), storage, Some(Arc::new(FailingHook)))).unwrap();
    let (tx, rx) = oneshot::channel();
    let request = Request::new(job("job-4", source.path(), &target_path), CancellationToken::new(), tx);

    handler.handle(request).await;
    let jd = rx.await.unwrap();

    assert_eq!(jd.status, JobStatus::Failed);
    assert!(jd.error.is_some());
    assert!(!target_path.exists(), "a failed hook must not reach artifact storage");
  }

  #[tokio::test]
  async fn invalid_source_uri_fails_the_whole_job_without_touching_the_pipeline() {
    let work = tempfile::tempdir().unwrap();
    let storage = Registry::new();
    let handler = Handler::new(config(work.path().to_path_buf(), storage, None)).unwrap();

    let mut j = job("job-2", Path::new("/nonexistent"), Path::new("/tmp/out.pch"));
    j.source_uri = "not a uri".to_string();
    let (tx, rx) = oneshot::channel();
    handler.handle(Request::new(j, CancellationToken::new(), tx)).await;
    let jd = rx.await.unwrap();

    assert_eq!(jd.status, JobStatus::Failed);
    assert!(jd.error.is_some());
  }

  #[tokio::test]
  async fn a_missing_template_key_produces_a_partial_job() {
    let source = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("main.tex"), "|@ .Missing @|").unwrap();
    let work = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    let target_path = target_dir.path().join("out.pch");

    let mut storage = Registry::new();
    storage.register(Arc::new(LocalProvider), &["file"]).unwrap();

    let handler = Handler::new(config(work.path().to_path_buf(), storage, None)).unwrap();

    let mut j = job("job-3", source.path(), &target_path);
    j.on_missing_key = OnMissingKey::Error;
    let (tx, rx) = oneshot::channel();
    handler.handle(Request::new(j, CancellationToken::new(), tx)).await;
    let jd = rx.await.unwrap();

    assert_eq!(jd.status, JobStatus::Failed);
    assert_eq!(jd.renders.len(), 1);
    assert!(!jd.renders[0].errors.is_empty());
  }
}
