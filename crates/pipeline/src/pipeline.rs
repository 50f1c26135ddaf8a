//! The `Pipeline` (§4.E): owns the three worker stages and the channels
//! between them, and exposes the handler-facing `add`/`close`/`wait` API.

use std::{
  collections::HashMap,
  path::PathBuf,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  time::Duration,
};

use latte_archive::{build_table_of_contents, ArchiveWriter};
use latte_core::TableOfContents;
use latte_template::TemplateJob;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;

use crate::{
  config::Configuration,
  error::{PipelineError, PipelineErrors},
  safe_chan::SafeSender,
  types::{ArchiveStageJob, RenderStageJob, TemplateStageJob},
  workers::{archive_worker, render_worker, template_worker},
};

#[derive(Debug, thiserror::Error)]
pub enum PipelineStartError {
  #[error(transparent)]
  Configuration(#[from] crate::config::ConfigurationError),
  #[error("error building template job: {0}")]
  TemplateJob(#[from] latte_template::TemplateJobError),
  #[error("error preparing output directory: {0}")]
  Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
  #[error("pipeline timed out after {0:?}")]
  Timeout(Duration),
  #[error("pipeline was already waited on")]
  AlreadyWaited,
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
  #[error("context {0} has no render-out.pch and fail_on_missing is set")]
  MissingArchive(usize),
  #[error(transparent)]
  Archive(#[from] latte_archive::ArchiveError),
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("could not read merged archive for table of contents: {0}")]
pub struct TableOfContentsError(#[from] std::io::Error);

/// Per-job runtime coordinating the template/render/archive worker pools
/// (§4.E). One `Pipeline` renders exactly one job's contexts.
pub struct Pipeline {
  tjobs: Arc<SafeSender<TemplateStageJob>>,
  context_deriver: Arc<dyn crate::config::ContextDeriver>,
  template_count: AtomicUsize,
  durations: Arc<Mutex<HashMap<usize, Duration>>>,
  done_rx: Mutex<Option<oneshot::Receiver<PipelineErrors>>>,
  base_cancel: CancellationToken,
  out_dir: PathBuf,
  merged_archive_name: String,
  no_archiving: bool,
  toc: Mutex<Option<TableOfContents>>,
}

impl Pipeline {
  pub fn new(base_cancel: CancellationToken, config: Configuration) -> Result<Self, PipelineStartError> {
    config.validate()?;
    std::fs::create_dir_all(&config.out_dir)?;

    let template_job = Arc::new(TemplateJob::new(
      &config.source_dir,
      config.missing_key,
      config.template_engine.as_ref(),
      config.template_extension.as_deref(),
      &config.func_map,
    )?);

    let (tjobs_tx, tjobs_rx) = mpsc::channel(config.worker_count);
    let (rjobs_tx, rjobs_rx) = mpsc::channel(config.worker_count);
    let (ajobs_tx, ajobs_rx) = mpsc::channel(config.worker_count);
    let (errors_tx, mut errors_rx) = mpsc::channel::<PipelineError>(config.worker_count * 4);

    let tjobs = Arc::new(SafeSender::new(tjobs_tx));

    let tjobs_rx = Arc::new(Mutex::new(tjobs_rx));
    let rjobs_rx = Arc::new(Mutex::new(rjobs_rx));
    let ajobs_rx = Arc::new(Mutex::new(ajobs_rx));

    let durations = Arc::new(Mutex::new(HashMap::new()));

    for _ in 0..config.worker_count {
      tokio::spawn(template_worker(
        tjobs_rx.clone(),
        rjobs_tx.clone(),
        errors_tx.clone(),
        template_job.clone(),
        config.out_dir.clone(),
        config.render_count,
        config.extra_render_args.clone(),
      ));
    }
    for _ in 0..config.worker_count {
      tokio::spawn(render_worker(
        rjobs_rx.clone(),
        ajobs_tx.clone(),
        errors_tx.clone(),
        config.render_step.clone(),
        config.compiler.clone(),
        config.pre_render_hook.clone(),
      ));
    }
    for _ in 0..config.worker_count {
      tokio::spawn(archive_worker(
        ajobs_rx.clone(),
        errors_tx.clone(),
        config.no_archiving,
        config.pre_archive_hook.clone(),
        durations.clone(),
      ));
    }
    // Each worker above holds its own clone; dropping the originals here
    // means every stage's downstream channel closes only once every worker
    // of that stage has drained its input and exited, never before.
    drop(errors_tx);
    drop(rjobs_tx);
    drop(ajobs_tx);

    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(async move {
      let mut collected = PipelineErrors::default();
      while let Some(err) = errors_rx.recv().await {
        collected.push(err);
      }
      let _ = done_tx.send(collected);
    });

    Ok(Self {
      tjobs,
      context_deriver: config.context_deriver,
      template_count: AtomicUsize::new(0),
      durations,
      done_rx: Mutex::new(Some(done_rx)),
      base_cancel,
      out_dir: config.out_dir,
      merged_archive_name: config.merged_archive_name,
      no_archiving: config.no_archiving,
      toc: Mutex::new(None),
    })
  }

  /// Submits one context for rendering, deriving its cancellation scope
  /// from the pipeline's base token (§4.E `ContextContext`).
  pub async fn add(&self, context: latte_core::TemplateContext) -> Result<(), crate::safe_chan::SendOnClosed> {
    self.template_count.fetch_add(1, Ordering::SeqCst);
    let cancel = self.context_deriver.derive(&self.base_cancel, context.index);
    self
      .tjobs
      .send(TemplateStageJob {
        index: context.index,
        data: context.data,
        cancel,
      })
      .await
  }

  /// Closes the add side; no further contexts may be submitted.
  pub async fn close(&self) {
    self.tjobs.close().await;
  }

  /// Blocks until every submitted context has passed through all three
  /// stages, or `timeout` elapses first. The base cancellation token is
  /// tripped before returning on every path, not only on timeout: workers
  /// have already exited by the time the success path returns, so this is
  /// a no-op there, but any context-scoped token derived from it (§4.E
  /// `ContextContext`) must never outlive the wait that was supposed to
  /// bound its lifetime.
  pub async fn wait(&self, timeout: Option<Duration>) -> Result<PipelineErrors, WaitError> {
    let mut guard = self.done_rx.lock().await;
    let rx = guard.take().ok_or(WaitError::AlreadyWaited)?;
    drop(guard);

    let result = match timeout {
      None => Ok(rx.await.unwrap_or_default()),
      Some(d) => tokio::select! {
        result = rx => Ok(result.unwrap_or_default()),
        _ = tokio::time::sleep(d) => Err(WaitError::Timeout(d)),
      },
    };
    self.base_cancel.cancel();
    result
  }

  pub async fn durations(&self) -> HashMap<usize, Duration> {
    self.durations.lock().await.clone()
  }

  /// Concatenates every context's `render-out.pch` into one archive named
  /// `merged_archive_name`, prefixing each record's name with the
  /// context's index (§4.A merge), then removes the per-context archive.
  pub async fn merge_archives(&self, fail_on_missing: bool) -> Result<(), MergeError> {
    let merged_path = self.out_dir.join(&self.merged_archive_name);
    let merged_file = std::fs::File::create(&merged_path)?;
    let mut writer = ArchiveWriter::new(merged_file);

    let count = self.template_count.load(Ordering::SeqCst);
    for index in 0..count {
      let per_context = self.out_dir.join(index.to_string()).join("render-out.pch");
      if !per_context.exists() {
        if fail_on_missing {
          return Err(MergeError::MissingArchive(index));
        }
        continue;
      }

      let records = latte_archive::ArchiveReader::new(std::fs::File::open(&per_context)?).read_all()?;
      for (header, payload) in records {
        writer.write_record(&format!("{index}/{}", header.name), header.size, payload.as_slice())?;
      }
      std::fs::remove_file(&per_context)?;
    }
    writer.finish()?;
    Ok(())
  }

  /// The merged archive's table of contents, built on first access and
  /// cached for subsequent calls (§3 invariant 4).
  pub async fn table_of_contents(&self) -> Result<TableOfContents, TableOfContentsError> {
    let mut guard = self.toc.lock().await;
    if let Some(toc) = guard.as_ref() {
      return Ok(toc.clone());
    }
    let merged_path = self.out_dir.join(&self.merged_archive_name);
    let mut file = std::fs::File::open(&merged_path)?;
    let toc = build_table_of_contents(&mut file).map_err(|e| match e {
      latte_archive::ArchiveError::Io(io) => TableOfContentsError(io),
      other => TableOfContentsError(std::io::Error::new(std::io::ErrorKind::InvalidData, other.to_string())),
    })?;
    *guard = Some(toc.clone());
    Ok(toc)
  }
}
