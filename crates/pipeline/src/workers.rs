//! The three worker stages (§4.E templateWorker/renderWorker/archiveWorker):
//! each stage drains a shared receiver, does its work for one context, and
//! hands a job to the next stage. Every stage checks its context's
//! cancellation token before doing any work, so a context cancelled
//! mid-flight is dropped instead of wasting a render pass.

use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use latte_archive::{archive_dir, ArchiveWriter};
use latte_render::Compiler;
use latte_template::TemplateJob;
use tokio::sync::{mpsc, Mutex};

use crate::{
  error::PipelineError,
  hooks::Hook,
  render_step::RenderStep,
  types::{ArchiveStageJob, RenderStageJob, TemplateStageJob},
};

type Shared<T> = Arc<Mutex<mpsc::Receiver<T>>>;

async fn next<T>(rx: &Shared<T>) -> Option<T> {
  rx.lock().await.recv().await
}

/// Renders one context's templates, then hands the rendered tree to the
/// render stage. Runs until the shared input is exhausted, then drops its
/// own clone of `rjobs`; the channel closes once every sibling worker of
/// this stage has done the same.
pub async fn template_worker(
  rx: Shared<TemplateStageJob>,
  rjobs: mpsc::Sender<RenderStageJob>,
  errors: mpsc::Sender<PipelineError>,
  job: Arc<TemplateJob>,
  out_dir: PathBuf,
  render_count: u32,
  extra_args: Vec<String>,
) {
  while let Some(stage_job) = next(&rx).await {
    if stage_job.cancel.is_cancelled() {
      continue;
    }

    let context_dir = out_dir.join(stage_job.index.to_string());
    let template_out = context_dir.join("template-out");
    let render_out = context_dir.join("render-out");

    if let Err(e) = std::fs::create_dir_all(&template_out).and_then(|_| std::fs::create_dir_all(&render_out)) {
      let _ = errors.send(PipelineError::new(stage_job.index, "template-error", e)).await;
      continue;
    }

    let data = match latte_template::parse_context_data(&stage_job.data) {
      Ok(v) => v,
      Err(e) => {
        let _ = errors.send(PipelineError::new(stage_job.index, "template-error", e)).await;
        continue;
      }
    };

    if let Err(e) = job.execute(&template_out, &data) {
      let _ = errors.send(PipelineError::new(stage_job.index, "template-error", e)).await;
      continue;
    }

    let render_job = RenderStageJob {
      index: stage_job.index,
      start: std::time::Instant::now(),
      in_dir: template_out,
      out_dir: render_out,
      run_count: render_count,
      extra_args: extra_args.clone(),
      cancel: stage_job.cancel,
    };
    let _ = rjobs.send(render_job).await;
  }
}

/// Invokes the render step (optionally `render_count` times, matching the
/// original's `rerender_count`), then hands the output directory to the
/// archive stage. Runs until the shared input is exhausted, then drops its
/// own clone of `ajobs`, the same auto-close pattern as `template_worker`.
pub async fn render_worker(
  rx: Shared<RenderStageJob>,
  ajobs: mpsc::Sender<ArchiveStageJob>,
  errors: mpsc::Sender<PipelineError>,
  render_step: Arc<dyn RenderStep>,
  compiler: Arc<dyn Compiler>,
  pre_render_hook: Option<Arc<dyn Hook>>,
) {
  while let Some(stage_job) = next(&rx).await {
    if stage_job.cancel.is_cancelled() {
      continue;
    }

    if let Some(hook) = &pre_render_hook {
      if let Err(e) = hook.call(&stage_job.in_dir).await {
        let _ = errors.send(PipelineError::new(stage_job.index, "render-error", e)).await;
        continue;
      }
    }

    let mut failed = false;
    for _ in 0..stage_job.run_count.max(1) {
      if let Err(e) = render_step
        .render(&stage_job.in_dir, &stage_job.out_dir, compiler.as_ref(), &stage_job.extra_args)
        .await
      {
        let _ = errors.send(PipelineError::new(stage_job.index, "render-error", e)).await;
        failed = true;
        break;
      }
    }
    if failed {
      continue;
    }

    let archive_job = ArchiveStageJob {
      index: stage_job.index,
      dir: stage_job.out_dir,
      duration: stage_job.start.elapsed(),
      cancel: stage_job.cancel,
    };
    let _ = ajobs.send(archive_job).await;
  }
}

/// Archives one context's rendered output (unless archiving is disabled)
/// and records its total duration. The last worker to see its input
/// exhausted drops its clone of `errors`, and once every stage's workers
/// have done the same the error aggregator's channel closes on its own.
pub async fn archive_worker(
  rx: Shared<ArchiveStageJob>,
  errors: mpsc::Sender<PipelineError>,
  no_archiving: bool,
  pre_archive_hook: Option<Arc<dyn Hook>>,
  durations: Arc<Mutex<HashMap<usize, Duration>>>,
) {
  while let Some(stage_job) = next(&rx).await {
    durations.lock().await.insert(stage_job.index, stage_job.duration);

    if stage_job.cancel.is_cancelled() || no_archiving {
      continue;
    }

    if let Some(hook) = &pre_archive_hook {
      if let Err(e) = hook.call(&stage_job.dir).await {
        let _ = errors.send(PipelineError::new(stage_job.index, "archive-error", e)).await;
        continue;
      }
    }

    if let Err(e) = archive_one_context(&stage_job.dir) {
      let _ = errors.send(PipelineError::new(stage_job.index, "archive-error", e)).await;
    }
  }
}

fn archive_one_context(dir: &std::path::Path) -> Result<(), latte_archive::ArchiveError> {
  let archive_path = PathBuf::from(format!("{}.pch", dir.display()));
  let file = std::fs::File::create(&archive_path)?;
  let mut writer = ArchiveWriter::new(file);
  archive_dir(&mut writer, dir)?;
  writer.finish()?;
  Ok(())
}
